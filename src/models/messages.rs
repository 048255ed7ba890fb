use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestDocumentMessage {
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeltaMessage {
    pub delta: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LockStatusMessage {
    pub status: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PongMessage {
    pub date: String,
}

/// Frames a client may send on the real-time channel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "request-document")]
    RequestDocument(RequestDocumentMessage),
    #[serde(rename = "submit-delta")]
    SubmitDelta(DeltaMessage),
    #[serde(rename = "submit-lock-status")]
    SubmitLockStatus(LockStatusMessage),
    #[serde(rename = "ping")]
    Ping,
}

impl ReceivedMessage {
    pub fn request_document(document_id: impl Into<String>) -> Self {
        ReceivedMessage::RequestDocument(RequestDocumentMessage {
            document_id: document_id.into(),
        })
    }

    pub fn delta(delta: Value) -> Self {
        ReceivedMessage::SubmitDelta(DeltaMessage { delta })
    }

    pub fn lock_status(status: Value) -> Self {
        ReceivedMessage::SubmitLockStatus(LockStatusMessage { status })
    }
}

/// Frames the relay sends to a client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum SendMessage {
    #[serde(rename = "document-ready")]
    DocumentReady,
    #[serde(rename = "delta-received")]
    DeltaReceived(DeltaMessage),
    #[serde(rename = "lock-status-changed")]
    LockStatusChanged(LockStatusMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}
