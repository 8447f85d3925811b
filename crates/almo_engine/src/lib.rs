//! Almo engine: backend IO and effect execution.
mod backend;
mod chat;
mod credential;
mod engine;
mod poller;
mod sink;
mod types;
mod upload;

pub use backend::{Backend, ClientSettings, ReqwestBackend, UploadProgressFn};
pub use chat::complete_chat;
pub use credential::{Credential, StaticToken, TokenProvider};
pub use engine::{EngineEvents, EngineHandle};
pub use poller::{PollSettings, StatusPoller, WatchHandle};
pub use sink::{ChannelEventSink, EventSink};
pub use types::{
    ApiError, ChatReply, ChatRequest, DocumentUpload, EngineEvent, RemoteDocument,
    CHAT_FAILURE_MESSAGE, NETWORK_ERROR_MESSAGE,
};
pub use upload::UploadCoordinator;
