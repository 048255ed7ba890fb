use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for inviting a collaborator to a document
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    /// Identity token of the caller
    pub token: String,
    #[serde(alias = "emailTo")]
    pub target_email: String,
    pub document_name: String,
    pub document_id: String,
}

/// Plain message body used for both success and failure responses
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
