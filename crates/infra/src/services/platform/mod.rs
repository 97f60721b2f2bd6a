use super::{
    CalendarInfo, ICalendarBackend, IGroupResolver, IMailer, INotificationStore, IUserDirectory,
    TransportError,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use calendar_reminders_domain::{EmailMessage, InAppNotification, Mailbox, User};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Client for the platform that hosts calendars, users and delivery of
/// mails and notifications
pub struct PlatformClient {
    client: Client,
    base_url: String,
    api_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailAttachmentRequest<'a> {
    filename: &'a str,
    content_type: &'a str,
    /// Base64 encoded
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    from: &'a Mailbox,
    to: &'a [Mailbox],
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    attachments: Vec<MailAttachmentRequest<'a>>,
}

impl<'a> From<&'a EmailMessage> for SendMailRequest<'a> {
    fn from(message: &'a EmailMessage) -> Self {
        Self {
            from: &message.from,
            to: &message.to,
            subject: &message.subject,
            html_body: &message.html_body,
            text_body: &message.text_body,
            attachments: message
                .attachments
                .iter()
                .map(|a| MailAttachmentRequest {
                    filename: &a.filename,
                    content_type: &a.content_type,
                    content: BASE64.encode(&a.data),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMailResponse {
    #[serde(default)]
    failed_recipients: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupMembersResponse {
    members: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocaleResponse {
    locale: Option<String>,
}

impl PlatformClient {
    pub fn new(base_url: &str, api_token: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// GET that treats `404 Not Found` as a missing resource
    async fn get_optional(&self, path: String) -> anyhow::Result<Option<reqwest::Response>> {
        let res = self
            .client
            .get(&self.url(&path))
            .header("authorization", format!("Bearer {}", self.api_token))
            .send()
            .await
            .map_err(|e| {
                error!(
                    "[Network Error] Platform API GET {} error. Error message: {:?}",
                    path, e
                );
                anyhow::Error::new(e)
            })?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = res.error_for_status().map_err(|e| {
            error!(
                "[Unexpected Response] Platform API GET {} error. Error message: {:?}",
                path, e
            );
            anyhow::Error::new(e)
        })?;
        Ok(Some(res))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: String) -> anyhow::Result<Option<T>> {
        match self.get_optional(path).await? {
            Some(res) => Ok(Some(res.json::<T>().await?)),
            None => Ok(None),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        body: &impl Serialize,
        path: &str,
    ) -> Result<Option<T>, TransportError> {
        let res = self
            .client
            .post(&self.url(path))
            .header("authorization", format!("Bearer {}", self.api_token))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "[Network Error] Platform API POST {} error. Error message: {:?}",
                    path, e
                );
                TransportError::Request(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        res.json::<T>()
            .await
            .map(Some)
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}

fn encode_segment(segment: &str) -> String {
    segment
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[async_trait::async_trait]
impl ICalendarBackend for PlatformClient {
    async fn get_raw_payload(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        let path = format!(
            "calendars/{}/objects/{}",
            calendar_id,
            encode_segment(object_uri)
        );
        match self.get_optional(path).await? {
            Some(res) => Ok(Some(res.bytes().await?.to_vec())),
            None => Ok(None),
        }
    }

    async fn get_calendar(&self, calendar_id: i64) -> anyhow::Result<Option<CalendarInfo>> {
        self.get_json(format!("calendars/{}", calendar_id)).await
    }
}

#[async_trait::async_trait]
impl IGroupResolver for PlatformClient {
    async fn get_group_members(&self, group_id: &str) -> anyhow::Result<Option<Vec<String>>> {
        let res: Option<GroupMembersResponse> = self
            .get_json(format!("groups/{}/members", encode_segment(group_id)))
            .await?;
        Ok(res.map(|r| r.members))
    }
}

#[async_trait::async_trait]
impl IUserDirectory for PlatformClient {
    async fn get_user(&self, uid: &str) -> anyhow::Result<Option<User>> {
        self.get_json(format!("users/{}", encode_segment(uid))).await
    }

    async fn get_preferred_locale(&self, uid: &str) -> anyhow::Result<Option<String>> {
        let res: Option<LocaleResponse> = self
            .get_json(format!("users/{}/locale", encode_segment(uid)))
            .await?;
        Ok(res.and_then(|r| r.locale))
    }
}

#[async_trait::async_trait]
impl IMailer for PlatformClient {
    async fn send(&self, message: &EmailMessage) -> Result<Vec<String>, TransportError> {
        let res: Option<SendMailResponse> =
            self.post(&SendMailRequest::from(message), "mail").await?;
        Ok(res.map(|r| r.failed_recipients).unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl INotificationStore for PlatformClient {
    async fn notify(&self, notification: &InAppNotification) -> Result<(), TransportError> {
        self.post::<serde_json::Value>(notification, "notifications")
            .await
            .map(|_| ())
    }
}
