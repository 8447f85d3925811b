use chrono::{DateTime, Utc};

use crate::{ChatSession, Document, DocumentId, DocumentStatus, FileRef, SessionId, UploadEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator picked files to upload, in submission order.
    FilesSubmitted(Vec<FileRef>),
    /// Upload coordinator progress for one file.
    Upload { event: UploadEvent, at: DateTime<Utc> },
    /// Documents already known to the backend (e.g. at startup).
    DocumentsLoaded(Vec<Document>),
    /// Status poller observed a new status.
    DocumentStatus {
        document_id: DocumentId,
        status: DocumentStatus,
        error_message: Option<String>,
        at: DateTime<Utc>,
    },
    /// Status poller gave up after repeated fetch errors.
    PollAbandoned {
        document_id: DocumentId,
        at: DateTime<Utc>,
    },
    /// Operator removed one document from the list.
    DocumentDismissed(DocumentId),
    /// The document list is being torn down.
    DocumentsDiscarded,
    /// Operator sent text to a session.
    ChatSubmitted {
        session_id: SessionId,
        text: String,
        at: DateTime<Utc>,
    },
    /// Chat completion returned a reply.
    ChatReplied {
        session_id: SessionId,
        text: String,
        conversation_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// Chat completion failed; `message` is already user-facing.
    ChatFailed {
        session_id: SessionId,
        message: String,
        at: DateTime<Utc>,
    },
    NewSession { at: DateTime<Utc> },
    SessionSelected(SessionId),
    /// Restore sessions persisted by a previous run.
    RestoreSessions(Vec<ChatSession>),
    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
