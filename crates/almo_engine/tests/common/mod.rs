#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use almo_core::{DocumentId, DocumentStatus};
use almo_engine::{
    ApiError, Backend, ChatReply, ChatRequest, Credential, DocumentUpload, EngineEvent,
    EventSink, RemoteDocument, UploadProgressFn,
};

pub fn remote(id: &str, status: DocumentStatus) -> RemoteDocument {
    RemoteDocument {
        id: DocumentId::new(id),
        title: Some(id.to_string()),
        status,
        error_message: None,
        created_at: None,
    }
}

/// Scripted backend. Status fetches pop from `statuses`; once the script is
/// exhausted every fetch reports `pending`.
#[derive(Default)]
pub struct FakeBackend {
    statuses: Mutex<VecDeque<Result<RemoteDocument, ApiError>>>,
    fetches: Mutex<Vec<DocumentId>>,
    uploads: Mutex<Vec<String>>,
    failing_uploads: Mutex<Vec<String>>,
    upload_status: Mutex<DocumentStatus>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            upload_status: Mutex::new(DocumentStatus::Completed),
            ..Self::default()
        })
    }

    pub fn script(self: &Arc<Self>, results: Vec<Result<RemoteDocument, ApiError>>) {
        self.statuses.lock().unwrap().extend(results);
    }

    pub fn fail_upload_of(&self, name: &str) {
        self.failing_uploads.lock().unwrap().push(name.to_string());
    }

    pub fn set_upload_status(&self, status: DocumentStatus) {
        *self.upload_status.lock().unwrap() = status;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn create_document(
        &self,
        upload: DocumentUpload,
        _credential: &Credential,
        progress: UploadProgressFn,
    ) -> Result<RemoteDocument, ApiError> {
        self.uploads.lock().unwrap().push(upload.file_name.clone());
        progress(50);
        progress(100);
        if self.failing_uploads.lock().unwrap().contains(&upload.file_name) {
            return Err(ApiError::Remote {
                status: 400,
                message: Some("Unsupported file content".to_string()),
            });
        }
        let status = *self.upload_status.lock().unwrap();
        Ok(remote(&format!("doc-{}", upload.title), status))
    }

    async fn get_document(
        &self,
        id: &DocumentId,
        _credential: &Credential,
    ) -> Result<RemoteDocument, ApiError> {
        self.fetches.lock().unwrap().push(id.clone());
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(remote(id.as_str(), DocumentStatus::Pending)))
    }

    async fn list_documents(
        &self,
        _credential: &Credential,
    ) -> Result<Vec<RemoteDocument>, ApiError> {
        Ok(vec![
            remote("a", DocumentStatus::Completed),
            remote("b", DocumentStatus::Processing),
        ])
    }

    async fn complete_chat(
        &self,
        request: &ChatRequest,
        _credential: &Credential,
    ) -> Result<ChatReply, ApiError> {
        Ok(ChatReply {
            response: format!("echo: {}", request.message),
            conversation_id: Some("conv-1".to_string()),
        })
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
