use crate::domain::repository::Notifier;
use crate::domain::types::OtpPurpose;
use crate::error::AuthServiceError;

/// Mailer service client. Sends happen inline on the calling request path;
/// delivery failures surface as [`AuthServiceError::NotificationFailed`] and
/// callers decide whether that is fatal for their flow.
#[derive(Clone)]
pub struct MailerNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl MailerNotifier {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), AuthServiceError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url, "mailer unreachable");
                AuthServiceError::NotificationFailed
            })?;
        if !resp.status().is_success() {
            tracing::error!(status = %resp.status(), url, "mailer rejected send");
            return Err(AuthServiceError::NotificationFailed);
        }
        Ok(())
    }
}

impl Notifier for MailerNotifier {
    async fn send_otp(
        &self,
        identifier: &str,
        code: &str,
        purpose: OtpPurpose,
        expiry_minutes: i64,
    ) -> Result<(), AuthServiceError> {
        self.post(
            "/mail/otp",
            serde_json::json!({
                "to": identifier,
                "code": code,
                "purpose": purpose.as_str(),
                "expires_in_minutes": expiry_minutes,
            }),
        )
        .await
    }

    async fn send_welcome(&self, identifier: &str, name: &str) -> Result<(), AuthServiceError> {
        self.post(
            "/mail/welcome",
            serde_json::json!({ "to": identifier, "name": name }),
        )
        .await
    }
}
