use std::sync::Arc;

use almo_core::{DocumentId, DocumentStatus, PendingFile, SessionId};
use almo_logging::{almo_info, almo_warn};
use chrono::Utc;
use tokio::sync::mpsc;

use crate::chat::complete_chat;
use crate::{
    ApiError, Backend, ChannelEventSink, ClientSettings, EngineEvent, PollSettings, ReqwestBackend,
    StatusPoller, TokenProvider, UploadCoordinator,
};

/// Executes core effects on the current tokio runtime.
///
/// Every operation reads the credential from the `TokenProvider` at the
/// moment it starts and reports its outcome as an `EngineEvent`.
pub struct EngineHandle {
    backend: Arc<dyn Backend>,
    tokens: Arc<dyn TokenProvider>,
    uploads: Arc<UploadCoordinator>,
    poller: StatusPoller,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
}

/// Receiving side of the engine's event channel.
pub struct EngineEvents {
    event_rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineEvents {
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }
}

impl EngineHandle {
    /// Connects to the REST backend described by `settings`.
    pub fn new(
        settings: &ClientSettings,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<(Self, EngineEvents), ApiError> {
        let backend: Arc<dyn Backend> = Arc::new(ReqwestBackend::new(settings)?);
        Ok(Self::with_backend(backend, tokens, settings.poll.clone()))
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        tokens: Arc<dyn TokenProvider>,
        poll: PollSettings,
    ) -> (Self, EngineEvents) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let poller = StatusPoller::new(
            backend.clone(),
            tokens.clone(),
            Arc::new(ChannelEventSink::new(event_tx.clone())),
            poll,
        );
        let uploads = Arc::new(UploadCoordinator::new(backend.clone(), poller.clone()));
        let handle = Self {
            backend,
            tokens,
            uploads,
            poller,
            event_tx,
        };
        (handle, EngineEvents { event_rx })
    }

    pub fn submit_batch(&self, files: Vec<PendingFile>) {
        let uploads = self.uploads.clone();
        let credential = self.tokens.credential();
        let sink = ChannelEventSink::new(self.event_tx.clone());
        tokio::spawn(async move {
            uploads.run_batch(files, credential, &sink).await;
        });
    }

    pub fn watch(&self, document_id: DocumentId, status: DocumentStatus) {
        self.poller.watch(document_id, status);
    }

    pub fn cancel_polling(&self, document_id: &DocumentId) {
        self.poller.cancel(document_id);
    }

    pub fn cancel_all_polling(&self) {
        self.poller.cancel_all();
    }

    pub fn complete_chat(
        &self,
        session_id: SessionId,
        text: String,
        conversation_id: Option<String>,
    ) {
        let backend = self.backend.clone();
        let credential = self.tokens.credential();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result =
                complete_chat(backend.as_ref(), credential, session_id, text, conversation_id)
                    .await;
            let _ = event_tx.send(EngineEvent::ChatCompleted { session_id, result });
        });
    }

    /// Fetches the operator's existing documents.
    pub fn load_documents(&self) {
        let backend = self.backend.clone();
        let credential = self.tokens.credential();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = match credential {
                Some(credential) => backend.list_documents(&credential).await,
                None => Err(ApiError::AuthRequired),
            };
            let result = result.map(|remote| {
                let received_at = Utc::now();
                remote
                    .into_iter()
                    .map(|doc| {
                        let name = doc.title.clone().unwrap_or_else(|| doc.id.to_string());
                        doc.into_document(name, 0, String::new(), received_at)
                    })
                    .collect::<Vec<_>>()
            });
            match &result {
                Ok(documents) => almo_info!("Loaded {} document(s)", documents.len()),
                Err(err) => almo_warn!("Loading documents failed: {}", err),
            }
            let _ = event_tx.send(EngineEvent::DocumentsLoaded(result));
        });
    }
}
