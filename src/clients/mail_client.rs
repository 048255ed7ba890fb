use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::services::invitation::InviteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hand a message to the mail service, failing with `InviteError::DeliveryError`.
    async fn send(&self, message: MailMessage) -> Result<(), InviteError>;
}

/// Posts messages as JSON to a transactional mail API.
#[derive(Debug)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self, InviteError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| InviteError::DeliveryError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), InviteError> {
        let mut request = self.client.post(&self.endpoint).json(&message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Mail API request to {} failed: {}", message.to, e);
            InviteError::DeliveryError(e.to_string())
        })?;
        response
            .error_for_status()
            .map_err(|e| InviteError::DeliveryError(e.to_string()))?;

        info!("Mail '{}' handed off for {}", message.subject, message.to);
        Ok(())
    }
}
