use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error};

use crate::services::invitation::InviteError;

/// Ownership and sharing metadata of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocumentAccess {
    pub owner: String,
    #[serde(default)]
    pub allowed: HashSet<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, document_id: &str) -> Result<DocumentAccess, InviteError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "type")]
    type_: String,
    exp: usize,
}

/// Reads document metadata from the document service over HTTP.
#[derive(Debug)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: Url,
    jwt_secret: String,
    service_name: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, jwt_secret: String, service_name: String) -> Result<Self, InviteError> {
        let base_url =
            Url::parse(base_url).map_err(|e| InviteError::Store(format!("Invalid store URL: {}", e)))?;
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| InviteError::Store(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            jwt_secret,
            service_name,
        })
    }

    fn generate_token(&self) -> Result<String, InviteError> {
        let expiration = (Utc::now() + Duration::seconds(60)).timestamp();

        let claims = Claims {
            sub: self.service_name.clone(),
            type_: "service".to_string(),
            exp: expiration as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| InviteError::Store(format!("Failed to sign service token: {}", e)))
    }

    fn document_url(&self, document_id: &str) -> Result<Url, InviteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| InviteError::Store("Store URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("documents")
            .push(document_id);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get_document(&self, document_id: &str) -> Result<DocumentAccess, InviteError> {
        let token = self.generate_token()?;
        let url = self.document_url(document_id)?;
        debug!("Fetching document metadata from {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                error!("Document store request for {} failed: {}", document_id, e);
                InviteError::Store(e.to_string())
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(InviteError::DocumentNotFound(document_id.to_string())),
            status if !status.is_success() => Err(InviteError::Store(format!(
                "Document store answered {} for {}",
                status, document_id
            ))),
            _ => response
                .json::<DocumentAccess>()
                .await
                .map_err(|e| InviteError::Store(format!("Invalid document metadata: {}", e))),
        }
    }
}
