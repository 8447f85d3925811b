use crate::{BatchId, DocumentId, DocumentStatus, PendingFile, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drive the files through validate, upload and hand-off, in order.
    UploadBatch {
        batch_id: BatchId,
        files: Vec<PendingFile>,
    },
    /// Start polling a document that is not yet terminal.
    WatchDocument {
        document_id: DocumentId,
        status: DocumentStatus,
    },
    CancelPolling {
        document_id: DocumentId,
    },
    CancelAllPolling,
    /// Issue the single outstanding chat completion request.
    CompleteChat {
        session_id: SessionId,
        text: String,
        conversation_id: Option<String>,
    },
}
