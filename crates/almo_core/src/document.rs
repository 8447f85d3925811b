use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-assigned document identity. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Processing,
    Embedding,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            DocumentStatus::Pending => 0,
            DocumentStatus::Processing => 1,
            DocumentStatus::Embedding => 2,
            DocumentStatus::Completed | DocumentStatus::Failed => 3,
        }
    }

    /// True when `next` is a forward move from `self`. Terminal states never advance.
    pub fn can_advance_to(self, next: DocumentStatus) -> bool {
        !self.is_terminal() && next != self && next.rank() >= self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Embedding => "embedding",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fallback error text when the backend reports `failed` without details.
pub const DEFAULT_PROCESSING_ERROR: &str = "Processing failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub size: u64,
    pub media_type: String,
    pub status: DocumentStatus,
    /// Present iff `status` is `Failed`.
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Advanced,
    Unchanged,
    Refused,
}

impl Document {
    /// Builds a record, normalising `error_message` to match `status`.
    pub fn new(
        id: DocumentId,
        name: impl Into<String>,
        size: u64,
        media_type: impl Into<String>,
        status: DocumentStatus,
        error_message: Option<String>,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            media_type: media_type.into(),
            status,
            error_message: error_for(status, error_message),
            uploaded_at,
        }
    }

    /// Applies a polled status. Backwards moves and changes after a terminal
    /// status are refused and leave the record untouched.
    pub fn apply_status(
        &mut self,
        status: DocumentStatus,
        error_message: Option<String>,
    ) -> StatusChange {
        if status == self.status {
            return StatusChange::Unchanged;
        }
        if !self.status.can_advance_to(status) {
            return StatusChange::Refused;
        }
        self.status = status;
        self.error_message = error_for(status, error_message);
        StatusChange::Advanced
    }
}

fn error_for(status: DocumentStatus, error_message: Option<String>) -> Option<String> {
    if status != DocumentStatus::Failed {
        return None;
    }
    match error_message {
        Some(message) if !message.trim().is_empty() => Some(message),
        _ => Some(DEFAULT_PROCESSING_ERROR.to_string()),
    }
}
