use crate::{
    ClientKey, DocumentId, DocumentStatus, Message, SendOutcome, SessionId, UploadErrorRecord,
    UploadOutcome, UploadProgress,
};

/// Read-only projection of the state for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub active_session: Option<SessionView>,
    pub sessions: Vec<SessionSummary>,
    pub documents: Vec<DocumentRow>,
    pub uploads: Vec<UploadRow>,
    pub upload_errors: Vec<UploadErrorRecord>,
    pub chat_loading: bool,
    pub last_send: Option<SendOutcome>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub id: SessionId,
    pub display_name: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub display_name: String,
    pub message_count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: DocumentId,
    pub name: String,
    pub size: u64,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRow {
    pub client_key: ClientKey,
    pub name: String,
    pub outcome: UploadOutcome,
    pub progress: UploadProgress,
    pub validation_error: Option<String>,
}
