use std::sync::Arc;
use std::time::Duration;

use almo_core::DocumentId;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{ApiError, ChatReply, ChatRequest, Credential, DocumentUpload, PollSettings, RemoteDocument};

/// Upload bodies are streamed in chunks of this size so progress can be reported.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Receives upload progress as a percentage of body bytes handed to the transport.
pub type UploadProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Longest wait for any single read. There is no total deadline, so a
    /// slow but steady upload is never cut off.
    pub read_timeout: Option<Duration>,
    pub poll: PollSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Some(Duration::from_secs(120)),
            poll: PollSettings::default(),
        }
    }
}

/// Remote document/chat API.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn create_document(
        &self,
        upload: DocumentUpload,
        credential: &Credential,
        progress: UploadProgressFn,
    ) -> Result<RemoteDocument, ApiError>;

    async fn get_document(
        &self,
        id: &DocumentId,
        credential: &Credential,
    ) -> Result<RemoteDocument, ApiError>;

    async fn list_documents(&self, credential: &Credential)
        -> Result<Vec<RemoteDocument>, ApiError>;

    async fn complete_chat(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, ApiError>;
}

/// Which keys of an error payload carry the message, in precedence order.
#[derive(Debug, Clone, Copy)]
struct ErrorKeys {
    keys: &'static [&'static str],
    field_messages: bool,
}

const UPLOAD_ERROR_KEYS: ErrorKeys = ErrorKeys {
    keys: &["detail", "error"],
    field_messages: true,
};

const CHAT_ERROR_KEYS: ErrorKeys = ErrorKeys {
    keys: &["error", "detail"],
    field_messages: false,
};

const READ_ERROR_KEYS: ErrorKeys = ErrorKeys {
    keys: &["detail", "error"],
    field_messages: false,
};

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.read_timeout {
            builder = builder.read_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        credential: &Credential,
        error_keys: ErrorKeys,
    ) -> Result<T, ApiError> {
        let response = request
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response, error_keys).await
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn create_document(
        &self,
        upload: DocumentUpload,
        credential: &Credential,
        progress: UploadProgressFn,
    ) -> Result<RemoteDocument, ApiError> {
        let total = upload.bytes.len() as u64;
        let part = Part::stream_with_length(progress_body(upload.bytes, progress), total)
            .file_name(upload.file_name)
            .mime_str(&upload.media_type)
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let form = Form::new().part("file", part).text("title", upload.title);

        let request = self.client.post(self.url("/documents/")).multipart(form);
        self.send(request, credential, UPLOAD_ERROR_KEYS).await
    }

    async fn get_document(
        &self,
        id: &DocumentId,
        credential: &Credential,
    ) -> Result<RemoteDocument, ApiError> {
        let request = self.client.get(self.url(&format!("/documents/{id}/")));
        self.send(request, credential, READ_ERROR_KEYS).await
    }

    async fn list_documents(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RemoteDocument>, ApiError> {
        let request = self.client.get(self.url("/documents/"));
        self.send(request, credential, READ_ERROR_KEYS).await
    }

    async fn complete_chat(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, ApiError> {
        let request = self.client.post(self.url("/chat/")).json(request);
        self.send(request, credential, CHAT_ERROR_KEYS).await
    }
}

fn progress_body(bytes: Vec<u8>, progress: UploadProgressFn) -> Body {
    let total = bytes.len();
    let bytes = Bytes::from(bytes);
    let chunks: Vec<Bytes> = (0..total)
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_BYTES).min(total)))
        .collect();
    let mut sent = 0usize;
    let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len();
        progress(percent(sent, total));
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    Body::wrap_stream(stream)
}

fn percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as u64 * 100) / total as u64).min(100) as u8
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    error_keys: ErrorKeys,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Remote {
            status: status.as_u16(),
            message: remote_message(&body, error_keys),
        });
    }
    response.json::<T>().await.map_err(|err| {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            map_reqwest_error(err)
        }
    })
}

/// Picks the server-supplied message out of an error payload.
fn remote_message(body: &str, error_keys: ErrorKeys) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    for key in error_keys.keys {
        if let Some(message) = object.get(*key).and_then(message_text) {
            return Some(message);
        }
    }
    if !error_keys.field_messages {
        return None;
    }
    // Field errors arrive as `{"file": ["Unsupported file type ..."]}`.
    object.values().find_map(message_text)
}

fn message_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(message_text),
        _ => None,
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Transport(format!("timeout: {err}"));
    }
    ApiError::Transport(err.to_string())
}
