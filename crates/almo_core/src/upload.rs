use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{extension_of, Document, ValidationError};

/// Client-generated key identifying a file before the backend assigns an id.
pub type ClientKey = u64;
pub type BatchId = u64;

/// A local file offered for upload. Only metadata is held; bytes are read at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            path: path.into(),
        }
    }

    /// Title sent with the upload: the file name without its last extension.
    pub fn title(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => self.name.clone(),
        }
    }

    pub fn media_type(&self) -> &'static str {
        match extension_of(&self.name).as_str() {
            "pdf" => "application/pdf",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// A file paired with its client key, as carried through a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub client_key: ClientKey,
    pub file: FileRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Pending,
    Validating,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadOutcome {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadOutcome::Succeeded | UploadOutcome::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProgress {
    Indeterminate,
    Percent(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub client_key: ClientKey,
    pub batch_id: BatchId,
    pub file: FileRef,
    pub validation_error: Option<ValidationError>,
    pub progress: UploadProgress,
    pub outcome: UploadOutcome,
}

/// Lifecycle events for one file of a batch. Within a batch, all events of a
/// file are emitted before any event of the next file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Rejected {
        file: PendingFile,
        reason: ValidationError,
    },
    Started {
        file: PendingFile,
    },
    Progress {
        file: PendingFile,
        percent: u8,
    },
    Succeeded {
        file: PendingFile,
        document: Document,
    },
    Failed {
        file: PendingFile,
        reason: String,
    },
}

impl UploadEvent {
    pub fn file(&self) -> &PendingFile {
        match self {
            UploadEvent::Rejected { file, .. }
            | UploadEvent::Started { file }
            | UploadEvent::Progress { file, .. }
            | UploadEvent::Succeeded { file, .. }
            | UploadEvent::Failed { file, .. } => file,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadEvent::Rejected { .. } | UploadEvent::Succeeded { .. } | UploadEvent::Failed { .. }
        )
    }
}

/// A failed or rejected upload, kept for display after its task is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadErrorRecord {
    pub client_key: ClientKey,
    pub file_name: String,
    pub reason: String,
}
