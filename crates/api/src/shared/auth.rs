use crate::error::ReminderApiError;
use actix_web::HttpRequest;
use calendar_reminders_infra::ReminderContext;
use calendar_reminders_utils::secrets_match;

pub const API_KEY_HEADER: &str = "x-reminders-api-key";

/// Only the calendar backend and the scheduling harness are allowed to
/// mutate reminders
pub fn protect_route(req: &HttpRequest, ctx: &ReminderContext) -> Result<(), ReminderApiError> {
    let api_key = match req.headers().get(API_KEY_HEADER) {
        Some(api_key) => match api_key.to_str() {
            Ok(api_key) => api_key,
            Err(_) => {
                return Err(ReminderApiError::Unauthorized(
                    "Malformed api key provided".to_string(),
                ))
            }
        },
        None => {
            return Err(ReminderApiError::Unauthorized(format!(
                "Unable to find api-key in {} header",
                API_KEY_HEADER
            )))
        }
    };

    if secrets_match(&ctx.config.api_secret, api_key) {
        Ok(())
    } else {
        Err(ReminderApiError::Unauthorized(format!(
            "Invalid api-key provided in {} header",
            API_KEY_HEADER
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::test::TestRequest;

    fn ctx() -> ReminderContext {
        let mut ctx = ReminderContext::create_inmemory();
        ctx.config.api_secret = "secret".into();
        ctx
    }

    #[actix_web::test]
    async fn accepts_valid_api_key() {
        let req = TestRequest::default()
            .insert_header((API_KEY_HEADER, "secret"))
            .to_http_request();
        assert!(protect_route(&req, &ctx()).is_ok());
    }

    #[actix_web::test]
    async fn rejects_missing_or_invalid_api_key() {
        let req = TestRequest::default().to_http_request();
        assert!(protect_route(&req, &ctx()).is_err());

        let req = TestRequest::default()
            .insert_header((API_KEY_HEADER, "secreT"))
            .to_http_request();
        assert!(protect_route(&req, &ctx()).is_err());
    }
}
