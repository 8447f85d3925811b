use almo_core::{Document, DocumentId, DocumentStatus, SessionId, UploadEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generic text for failures that carry no server message.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection and try again.";
/// Fallback text for chat failures without a server message.
pub const CHAT_FAILURE_MESSAGE: &str = "Failed to get response";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Upload(UploadEvent),
    DocumentStatus {
        document_id: DocumentId,
        status: DocumentStatus,
        error_message: Option<String>,
    },
    PollAbandoned {
        document_id: DocumentId,
    },
    DocumentsLoaded(Result<Vec<Document>, ApiError>),
    ChatCompleted {
        session_id: SessionId,
        result: Result<ChatReply, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    AuthRequired,
    #[error("network error: {0}")]
    Transport(String),
    #[error("{}", remote_display(.status, .message))]
    Remote { status: u16, message: Option<String> },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("could not read file: {0}")]
    Io(String),
}

fn remote_display(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("http status {status}: {message}"),
        None => format!("http status {status}"),
    }
}

impl ApiError {
    /// Text shown to the operator. Server messages pass through verbatim;
    /// `fallback` covers remote failures that carried none.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Remote {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Remote { message: None, .. } => fallback.to_string(),
            ApiError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::AuthRequired => "Authentication required".to_string(),
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
            ApiError::Io(detail) => format!("Could not read file: {detail}"),
        }
    }
}

/// Document representation returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    pub status: DocumentStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteDocument {
    pub fn into_document(
        self,
        name: impl Into<String>,
        size: u64,
        media_type: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Document {
        Document::new(
            self.id,
            name,
            size,
            media_type,
            self.status,
            self.error_message,
            self.created_at.unwrap_or(received_at),
        )
    }
}

/// File content and metadata for a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub title: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}
