//! Background status polling for uploaded documents.
//!
//! Each watched document gets one task: wait `initial_delay`, fetch, then
//! refetch every `interval` until a terminal status arrives or the watch is
//! cancelled. Fetches for one document never overlap. Fetch errors mean
//! "not yet known" and are retried on the next tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use almo_core::{DocumentId, DocumentStatus};
use almo_logging::{almo_debug, almo_info, almo_warn};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::{ApiError, Backend, EngineEvent, EventSink, TokenProvider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub initial_delay: Duration,
    pub interval: Duration,
    /// Stop after this many consecutive fetch errors. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            interval: Duration::from_secs(3),
            max_consecutive_failures: None,
        }
    }
}

/// Cancels one watch. Cloning shares the same token.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    token: CancellationToken,
}

impl WatchHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct Watch {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct Registry {
    watches: DashMap<DocumentId, Watch>,
    next_generation: AtomicU64,
}

impl Registry {
    /// Removes the entry only if it still belongs to the finishing task.
    fn release(&self, document_id: &DocumentId, generation: u64) {
        self.watches
            .remove_if(document_id, |_, watch| watch.generation == generation);
    }

    fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        self.watches.retain(|_, watch| {
            watch.token.cancel();
            cancelled += 1;
            false
        });
        cancelled
    }
}

struct PollContext {
    backend: Arc<dyn Backend>,
    tokens: Arc<dyn TokenProvider>,
    sink: Arc<dyn EventSink>,
    settings: PollSettings,
}

struct PollerInner {
    context: Arc<PollContext>,
    registry: Arc<Registry>,
}

impl Drop for PollerInner {
    fn drop(&mut self) {
        let cancelled = self.registry.cancel_all();
        if cancelled > 0 {
            almo_info!("Status poller dropped; cancelled {} watch(es)", cancelled);
        }
    }
}

/// Shared handle to the polling tasks. Dropping the last clone cancels them all.
#[derive(Clone)]
pub struct StatusPoller {
    inner: Arc<PollerInner>,
}

impl StatusPoller {
    pub fn new(
        backend: Arc<dyn Backend>,
        tokens: Arc<dyn TokenProvider>,
        sink: Arc<dyn EventSink>,
        settings: PollSettings,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                context: Arc::new(PollContext {
                    backend,
                    tokens,
                    sink,
                    settings,
                }),
                registry: Arc::new(Registry::default()),
            }),
        }
    }

    /// Starts polling `document_id` from `initial` status.
    ///
    /// Returns `None` when `initial` is already terminal. Watching a document
    /// that is already watched returns the existing handle.
    pub fn watch(&self, document_id: DocumentId, initial: DocumentStatus) -> Option<WatchHandle> {
        if initial.is_terminal() {
            return None;
        }
        let registry = &self.inner.registry;
        let token = CancellationToken::new();
        let generation = match registry.watches.entry(document_id.clone()) {
            Entry::Occupied(existing) => {
                return Some(WatchHandle {
                    token: existing.get().token.clone(),
                });
            }
            Entry::Vacant(slot) => {
                let generation = registry.next_generation.fetch_add(1, Ordering::Relaxed);
                slot.insert(Watch {
                    generation,
                    token: token.clone(),
                });
                generation
            }
        };

        almo_info!("Watching document {} from status {}", document_id, initial);
        tokio::spawn(poll_document(
            Arc::clone(&self.inner.context),
            Arc::clone(&self.inner.registry),
            document_id.clone(),
            initial,
            token.clone(),
            generation,
        ));

        Some(WatchHandle { token })
    }

    /// Stops polling one document. Returns false if it was not being watched.
    pub fn cancel(&self, document_id: &DocumentId) -> bool {
        match self.inner.registry.watches.remove(document_id) {
            Some((_, watch)) => {
                watch.token.cancel();
                almo_info!("Cancelled polling for document {}", document_id);
                true
            }
            None => false,
        }
    }

    /// Stops every watch; returns how many were running.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.inner.registry.cancel_all();
        if cancelled > 0 {
            almo_info!("Cancelled polling for {} document(s)", cancelled);
        }
        cancelled
    }

    pub fn is_watching(&self, document_id: &DocumentId) -> bool {
        self.inner.registry.watches.contains_key(document_id)
    }

    pub fn active_count(&self) -> usize {
        self.inner.registry.watches.len()
    }
}

async fn poll_document(
    context: Arc<PollContext>,
    registry: Arc<Registry>,
    document_id: DocumentId,
    initial: DocumentStatus,
    token: CancellationToken,
    generation: u64,
) {
    let settings = &context.settings;
    let mut last = initial;
    let mut delay = settings.initial_delay;
    let mut failures = 0u32;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = settings.interval;

        let result = match context.tokens.credential() {
            Some(credential) => {
                tokio::select! {
                    _ = token.cancelled() => break,
                    result = context.backend.get_document(&document_id, &credential) => result,
                }
            }
            None => Err(ApiError::AuthRequired),
        };

        match result {
            Ok(_) if token.is_cancelled() => break,
            Ok(remote) => {
                failures = 0;
                almo_debug!("Polled document {}: {}", document_id, remote.status);
                if last.can_advance_to(remote.status) {
                    last = remote.status;
                    context.sink.emit(EngineEvent::DocumentStatus {
                        document_id: document_id.clone(),
                        status: remote.status,
                        error_message: remote.error_message,
                    });
                }
                if last.is_terminal() {
                    almo_info!("Document {} reached terminal status {}", document_id, last);
                    break;
                }
            }
            Err(err) => {
                failures += 1;
                almo_warn!(
                    "Status fetch for document {} failed ({} in a row): {}",
                    document_id,
                    failures,
                    err
                );
                if settings
                    .max_consecutive_failures
                    .is_some_and(|max| failures >= max)
                {
                    almo_warn!("Giving up on document {} after {} failures", document_id, failures);
                    context.sink.emit(EngineEvent::PollAbandoned {
                        document_id: document_id.clone(),
                    });
                    break;
                }
            }
        }
    }

    registry.release(&document_id, generation);
}
