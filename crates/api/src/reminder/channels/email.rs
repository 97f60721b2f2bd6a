use super::{Delivery, NotificationChannel, Recipient};
use calendar_reminders_domain::{Attachment, EmailMessage, EventSummary, Locale, Mailbox};
use calendar_reminders_infra::{t, t_args, IMailer, IStringCatalog, TransportError};
use std::sync::Arc;
use tracing::{debug, error};

const CALENDAR_CONTENT_TYPE: &str = "text/calendar";

pub struct EmailChannel {
    mailer: Arc<dyn IMailer>,
    catalog: Arc<dyn IStringCatalog>,
    from: Mailbox,
}

impl EmailChannel {
    pub fn new(mailer: Arc<dyn IMailer>, catalog: Arc<dyn IStringCatalog>, from: Mailbox) -> Self {
        Self {
            mailer,
            catalog,
            from,
        }
    }

    fn build_message(
        &self,
        summary: &EventSummary,
        raw_payload: &[u8],
        recipient: &Recipient,
        address: &str,
    ) -> EmailMessage {
        let catalog = self.catalog.as_ref();
        let locale = recipient.locale;
        let title = if summary.title.is_empty() {
            t(catalog, locale, "Untitled event")
        } else {
            summary.title.clone()
        };
        let heading = t_args(catalog, locale, "Don't forget to go to %s", &[&title]);
        let items = bullet_items(catalog, locale, summary);

        let mut html_body = format!("<h1>{}</h1>\n<ul>\n", escape_html(&heading));
        let mut text_body = format!("{}\n\n", heading);
        for (label, value) in &items {
            html_body.push_str(&format!(
                "<li><strong>{}</strong> {}</li>\n",
                escape_html(label),
                escape_html(value).replace('\n', "<br>")
            ));
            text_body.push_str(&format!("* {} {}\n", label, value));
        }
        html_body.push_str("</ul>\n");

        EmailMessage {
            from: self.from.clone(),
            to: vec![Mailbox::new(
                address,
                Some(recipient.user.display_name.clone()),
            )],
            subject: title,
            html_body,
            text_body,
            attachments: vec![Attachment {
                filename: summary.file_name(),
                content_type: CALENDAR_CONTENT_TYPE.into(),
                data: raw_payload.to_vec(),
            }],
        }
    }
}

/// When, Where, Description and Link, leaving out empty fields
fn bullet_items(
    catalog: &dyn IStringCatalog,
    locale: Locale,
    summary: &EventSummary,
) -> Vec<(String, String)> {
    let fields = [
        ("When:", Some(&summary.when).filter(|w| !w.is_empty())),
        ("Where:", summary.location.as_ref()),
        ("Description:", summary.description.as_ref()),
        ("Link:", summary.url.as_ref()),
    ];
    fields
        .iter()
        .filter_map(|(label, value)| value.map(|v| (t(catalog, locale, label), v.clone())))
        .collect()
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[async_trait::async_trait]
impl NotificationChannel for EmailChannel {
    async fn send(
        &self,
        summary: &EventSummary,
        raw_payload: &[u8],
        recipient: &Recipient,
    ) -> Result<Delivery, TransportError> {
        let address = match recipient.user.email_address() {
            Some(address) => address,
            None => {
                debug!(
                    "User: {} has no email address, skipping email reminder",
                    recipient.user.uid
                );
                return Ok(Delivery::NoOp);
            }
        };

        let message = self.build_message(summary, raw_payload, recipient, address);
        let failed = self.mailer.send(&message).await?;
        if !failed.is_empty() {
            error!("Unable to deliver message to {}", failed.join(", "));
            return Err(TransportError::Rejected(failed));
        }
        Ok(Delivery::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_reminders_domain::User;
    use calendar_reminders_infra::{InMemoryMailer, StaticCatalog};

    fn summary() -> EventSummary {
        EventSummary {
            uid: Some("standup-1".into()),
            title: "Standup".into(),
            description: None,
            location: Some("Room <1>".into()),
            url: Some("https://example.com/standup".into()),
            status: None,
            start: 0,
            end: 0,
            all_day: false,
            when: "Saturday, June 1, 2024 10:00 AM – 11:00 AM (UTC)".into(),
            calendar_name: None,
        }
    }

    fn recipient(email: Option<&str>, locale: Locale) -> Recipient {
        Recipient {
            user: User {
                uid: "alice".into(),
                display_name: "Alice".into(),
                email: email.map(String::from),
            },
            locale,
        }
    }

    fn channel(mailer: Arc<InMemoryMailer>) -> EmailChannel {
        EmailChannel::new(
            mailer,
            Arc::new(StaticCatalog::new()),
            Mailbox::new("noreply@example.com", Some("Calendar".into())),
        )
    }

    #[actix_web::test]
    async fn sends_reminder_with_attachment() {
        let mailer = Arc::new(InMemoryMailer::new());
        let channel = channel(mailer.clone());

        let res = channel
            .send(
                &summary(),
                b"BEGIN:VCALENDAR",
                &recipient(Some("alice@example.com"), Locale::EnUs),
            )
            .await;
        assert_eq!(res.unwrap(), Delivery::Delivered);

        let sent = mailer.sent_messages();
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(message.subject, "Standup");
        assert_eq!(message.to[0].address, "alice@example.com");
        assert!(message.text_body.starts_with("Don't forget to go to Standup"));
        assert!(message.text_body.contains("* When: Saturday, June 1, 2024"));
        assert!(message.text_body.contains("* Where: Room <1>"));
        assert!(message.text_body.contains("* Link: https://example.com/standup"));
        assert!(!message.text_body.contains("Description:"));
        assert!(message.html_body.contains("Room &lt;1&gt;"));
        assert_eq!(message.attachments[0].filename, "standup-1.ics");
        assert_eq!(message.attachments[0].content_type, "text/calendar");
        assert_eq!(message.attachments[0].data, b"BEGIN:VCALENDAR".to_vec());
    }

    #[actix_web::test]
    async fn translates_labels() {
        let mailer = Arc::new(InMemoryMailer::new());
        let channel = channel(mailer.clone());
        channel
            .send(
                &summary(),
                b"",
                &recipient(Some("alice@example.com"), Locale::De),
            )
            .await
            .unwrap();
        let message = &mailer.sent_messages()[0];
        assert!(message.text_body.starts_with("Vergiss nicht: Standup"));
        assert!(message.text_body.contains("* Wann: "));
        assert!(message.text_body.contains("* Wo: Room <1>"));
    }

    #[actix_web::test]
    async fn no_email_address_is_a_no_op() {
        let mailer = Arc::new(InMemoryMailer::new());
        let channel = channel(mailer.clone());
        let res = channel
            .send(&summary(), b"", &recipient(None, Locale::EnUs))
            .await;
        assert_eq!(res.unwrap(), Delivery::NoOp);
        assert!(mailer.sent_messages().is_empty());
    }

    #[actix_web::test]
    async fn transport_failure_is_reported() {
        let mailer = Arc::new(InMemoryMailer::new());
        mailer.set_failing(true);
        let channel = channel(mailer.clone());
        let res = channel
            .send(
                &summary(),
                b"",
                &recipient(Some("alice@example.com"), Locale::EnUs),
            )
            .await;
        assert!(res.is_err());
    }
}
