use std::sync::Arc;

use almo_core::{Document, PendingFile, UploadEvent, UploadPolicy};
use almo_logging::{almo_info, almo_warn};
use chrono::Utc;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;

use crate::{
    ApiError, Backend, ChannelEventSink, Credential, DocumentUpload, EngineEvent, EventSink,
    StatusPoller, UploadProgressFn, NETWORK_ERROR_MESSAGE,
};

/// Drives batches of files through validate, upload and poller hand-off.
///
/// Files of one batch are handled strictly one after another, so every event
/// of file N is emitted before any event of file N+1. Separate batches run
/// independently.
pub struct UploadCoordinator {
    backend: Arc<dyn Backend>,
    poller: StatusPoller,
    policy: UploadPolicy,
}

impl UploadCoordinator {
    pub fn new(backend: Arc<dyn Backend>, poller: StatusPoller) -> Self {
        Self::with_policy(backend, poller, UploadPolicy::default())
    }

    pub fn with_policy(
        backend: Arc<dyn Backend>,
        poller: StatusPoller,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            backend,
            poller,
            policy,
        }
    }

    /// Runs the batch on a background task and streams its events in order.
    pub fn submit_batch(
        self: &Arc<Self>,
        files: Vec<PendingFile>,
        credential: Option<Credential>,
    ) -> BoxStream<'static, UploadEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let sink = ChannelEventSink::new(tx);
            coordinator.run_batch(files, credential, &sink).await;
        });
        stream::poll_fn(move |cx| rx.poll_recv(cx))
            .filter_map(|event| async move {
                match event {
                    EngineEvent::Upload(event) => Some(event),
                    _ => None,
                }
            })
            .boxed()
    }

    /// Processes the batch, emitting `EngineEvent::Upload` for each step.
    pub async fn run_batch(
        &self,
        files: Vec<PendingFile>,
        credential: Option<Credential>,
        sink: &dyn EventSink,
    ) {
        for file in files {
            self.process_file(file, credential.as_ref(), sink).await;
        }
    }

    async fn process_file(
        &self,
        file: PendingFile,
        credential: Option<&Credential>,
        sink: &dyn EventSink,
    ) {
        if let Err(reason) = self.policy.validate(&file.file) {
            almo_warn!(
                "Rejected upload key={} name={}: {}",
                file.client_key,
                file.file.name,
                reason
            );
            sink.emit(EngineEvent::Upload(UploadEvent::Rejected { file, reason }));
            return;
        }

        let Some(credential) = credential else {
            // No network attempt without a credential.
            almo_warn!("Upload of {} skipped: no credential", file.file.name);
            sink.emit(EngineEvent::Upload(UploadEvent::Failed {
                reason: ApiError::AuthRequired.user_message(NETWORK_ERROR_MESSAGE),
                file,
            }));
            return;
        };

        almo_info!(
            "Uploading key={} name={} size={}",
            file.client_key,
            file.file.name,
            file.file.size
        );
        sink.emit(EngineEvent::Upload(UploadEvent::Started { file: file.clone() }));

        match self.upload(&file, credential, sink).await {
            Ok(document) => {
                almo_info!("Uploaded {} as document {}", file.file.name, document.id);
                let document_id = document.id.clone();
                let status = document.status;
                sink.emit(EngineEvent::Upload(UploadEvent::Succeeded { file, document }));
                self.poller.watch(document_id, status);
            }
            Err(err) => {
                almo_warn!("Upload of {} failed: {}", file.file.name, err);
                sink.emit(EngineEvent::Upload(UploadEvent::Failed {
                    reason: err.user_message(NETWORK_ERROR_MESSAGE),
                    file,
                }));
            }
        }
    }

    async fn upload(
        &self,
        file: &PendingFile,
        credential: &Credential,
        sink: &dyn EventSink,
    ) -> Result<Document, ApiError> {
        let bytes = tokio::fs::read(&file.file.path)
            .await
            .map_err(|err| ApiError::Io(err.to_string()))?;
        let upload = DocumentUpload {
            file_name: file.file.name.clone(),
            title: file.file.title(),
            media_type: file.file.media_type().to_string(),
            bytes,
        };

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u8>();
        let progress: UploadProgressFn = Arc::new(move |percent| {
            let _ = progress_tx.send(percent);
        });
        let request = self.backend.create_document(upload, credential, progress);
        tokio::pin!(request);

        let mut reported: Option<u8> = None;
        let mut report = |percent: u8| {
            if reported.map_or(true, |last| percent > last) {
                reported = Some(percent);
                sink.emit(EngineEvent::Upload(UploadEvent::Progress {
                    file: file.clone(),
                    percent,
                }));
            }
        };

        let result = loop {
            tokio::select! {
                biased;
                Some(percent) = progress_rx.recv() => report(percent),
                result = &mut request => break result,
            }
        };
        while let Ok(percent) = progress_rx.try_recv() {
            report(percent);
        }

        let remote = result?;
        Ok(remote.into_document(
            file.file.name.clone(),
            file.file.size,
            file.file.media_type(),
            Utc::now(),
        ))
    }
}
