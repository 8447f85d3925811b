//! Almo core: pure state machine for uploads, document status and chat.
mod chat;
mod document;
mod effect;
mod msg;
mod state;
mod update;
mod upload;
mod validate;
mod view_model;

pub use chat::{
    chat_error_text, is_narration, ChatSession, Message, MessageId, Narration, Sender, SessionId,
    DEFAULT_SESSION_NAME, NEW_SESSION_GREETING, WELCOME_TEXT,
};
pub use document::{
    Document, DocumentId, DocumentStatus, StatusChange, DEFAULT_PROCESSING_ERROR,
};
pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, SendOutcome, UPLOAD_ERROR_HISTORY};
pub use update::update;
pub use upload::{
    BatchId, ClientKey, FileRef, PendingFile, UploadErrorRecord, UploadEvent, UploadOutcome,
    UploadProgress, UploadTask,
};
pub use validate::{
    extension_of, validate, UploadPolicy, ValidationError, ACCEPTED_EXTENSIONS, MAX_UPLOAD_BYTES,
};
pub use view_model::{AppViewModel, DocumentRow, SessionSummary, SessionView, UploadRow};
