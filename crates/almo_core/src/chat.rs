use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SessionId = u64;
pub type MessageId = u64;

pub const DEFAULT_SESSION_NAME: &str = "AI Assistant";
pub const WELCOME_TEXT: &str = "Welcome! I can help you search your documents, create tasks, and answer questions. How can I assist you today?";
pub const NEW_SESSION_GREETING: &str = "How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub display_name: String,
    pub messages: Vec<Message>,
    /// Backend conversation this session continues, once one exists.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl ChatSession {
    pub fn new(id: SessionId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            messages: Vec::new(),
            conversation_id: None,
        }
    }

    pub(crate) fn append(
        &mut self,
        id: MessageId,
        sender: Sender,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) {
        self.messages.push(Message {
            id,
            sender,
            text: text.into(),
            timestamp,
        });
    }
}

/// Kinds of transcript narration produced for upload and processing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narration {
    UploadStarted,
    UploadSucceeded,
    Failure,
    ProcessingComplete,
}

impl Narration {
    pub const ALL: [Narration; 4] = [
        Narration::UploadStarted,
        Narration::UploadSucceeded,
        Narration::Failure,
        Narration::ProcessingComplete,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Narration::UploadStarted => "📤",
            Narration::UploadSucceeded => "✅",
            Narration::Failure => "❌",
            Narration::ProcessingComplete => "🎉",
        }
    }

    pub fn text(self, body: &str) -> String {
        format!("{} {body}", self.prefix())
    }
}

/// Narration text never triggers a chat completion.
pub fn is_narration(text: &str) -> bool {
    let text = text.trim_start();
    Narration::ALL
        .iter()
        .any(|kind| text.starts_with(kind.prefix()))
}

/// Transcript text for a failed completion request.
pub fn chat_error_text(message: &str) -> String {
    format!("❌ Error: {message}")
}
