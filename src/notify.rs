//! Registration notifier — out-of-band delivery of issued credentials
//!
//! The session actor fires delivery on a spawned task after a successful
//! registration; a failed delivery is logged and never fails the
//! registration itself.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::Result;

/// Delivery seam for freshly issued credentials
#[async_trait]
pub trait RegistrationNotifier: Send + Sync {
    /// Deliver the generated password to the new user out-of-band
    async fn credentials_issued(&self, name: &str, email: &str, password: &str) -> Result<()>;
}

/// Posts credentials to a workflow webhook as JSON
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl RegistrationNotifier for WebhookNotifier {
    async fn credentials_issued(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let payload = json!({
            "to": email,
            "subject": "Your account credentials",
            "body": format!("Hello {name}, your generated password is: {password}"),
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        debug!(email = %email, "Credentials delivered");
        Ok(())
    }
}
