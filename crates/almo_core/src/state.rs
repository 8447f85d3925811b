use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::view_model::{
    AppViewModel, DocumentRow, SessionSummary, SessionView, UploadRow,
};
use crate::{
    BatchId, ChatSession, ClientKey, Document, DocumentId, FileRef, MessageId, PendingFile,
    Sender, SessionId, UploadErrorRecord, UploadOutcome, UploadProgress, UploadTask,
    DEFAULT_SESSION_NAME, NEW_SESSION_GREETING, WELCOME_TEXT,
};

/// Most recent upload failures kept for display.
pub const UPLOAD_ERROR_HISTORY: usize = 20;

/// Result of the most recent `ChatSubmitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A completion request was issued.
    Requested,
    /// Narration text was appended without a request.
    Narration,
    /// Another completion was still outstanding; the text was appended but not sent.
    RejectedInFlight,
    Empty,
    UnknownSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    documents: Vec<Document>,
    uploads: BTreeMap<ClientKey, UploadTask>,
    upload_errors: VecDeque<UploadErrorRecord>,
    sessions: BTreeMap<SessionId, ChatSession>,
    active_session: SessionId,
    chat_in_flight: Option<SessionId>,
    last_send: Option<SendOutcome>,
    next_client_key: ClientKey,
    next_batch_id: BatchId,
    next_message_id: MessageId,
    next_session_id: SessionId,
    dirty: bool,
}

impl AppState {
    /// Fresh state with the default session and its welcome message.
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut state = Self {
            documents: Vec::new(),
            uploads: BTreeMap::new(),
            upload_errors: VecDeque::new(),
            sessions: BTreeMap::new(),
            active_session: 1,
            chat_in_flight: None,
            last_send: None,
            next_client_key: 1,
            next_batch_id: 1,
            next_message_id: 1,
            next_session_id: 1,
            dirty: false,
        };
        state.create_session(DEFAULT_SESSION_NAME.to_string(), WELCOME_TEXT, now);
        state
    }

    pub fn view(&self) -> AppViewModel {
        let active = self.sessions.get(&self.active_session);
        AppViewModel {
            active_session: active.map(|session| SessionView {
                id: session.id,
                display_name: session.display_name.clone(),
                messages: session.messages.clone(),
            }),
            sessions: self
                .sessions
                .values()
                .map(|session| SessionSummary {
                    id: session.id,
                    display_name: session.display_name.clone(),
                    message_count: session.messages.len(),
                    active: session.id == self.active_session,
                })
                .collect(),
            documents: self
                .documents
                .iter()
                .map(|doc| DocumentRow {
                    id: doc.id.clone(),
                    name: doc.name.clone(),
                    size: doc.size,
                    status: doc.status,
                    error_message: doc.error_message.clone(),
                })
                .collect(),
            uploads: self
                .uploads
                .values()
                .map(|task| UploadRow {
                    client_key: task.client_key,
                    name: task.file.name.clone(),
                    outcome: task.outcome,
                    progress: task.progress,
                    validation_error: task.validation_error.as_ref().map(ToString::to_string),
                })
                .collect(),
            upload_errors: self.upload_errors.iter().cloned().collect(),
            chat_loading: self.chat_in_flight.is_some(),
            last_send: self.last_send,
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn active_session(&self) -> SessionId {
        self.active_session
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| &doc.id == id)
    }

    /// Sessions in id order, for persistence.
    pub fn sessions_snapshot(&self) -> Vec<ChatSession> {
        self.sessions.values().cloned().collect()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_last_send(&mut self, outcome: SendOutcome) {
        self.last_send = Some(outcome);
        self.mark_dirty();
    }

    // --- sessions ---

    pub(crate) fn create_session(
        &mut self,
        display_name: String,
        greeting: &str,
        now: DateTime<Utc>,
    ) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id += 1;
        let mut session = ChatSession::new(id, display_name);
        let message_id = self.allocate_message_id();
        session.append(message_id, Sender::Assistant, greeting, now);
        self.sessions.insert(id, session);
        self.active_session = id;
        self.mark_dirty();
        id
    }

    pub(crate) fn new_session(&mut self, now: DateTime<Utc>) -> SessionId {
        let name = format!("Chat {}", self.next_session_id);
        self.create_session(name, NEW_SESSION_GREETING, now)
    }

    pub(crate) fn select_session(&mut self, id: SessionId) -> bool {
        if self.sessions.contains_key(&id) && self.active_session != id {
            self.active_session = id;
            self.mark_dirty();
            return true;
        }
        false
    }

    pub(crate) fn has_session(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub(crate) fn conversation_id(&self, id: SessionId) -> Option<String> {
        self.sessions
            .get(&id)
            .and_then(|session| session.conversation_id.clone())
    }

    pub(crate) fn set_conversation_id(&mut self, id: SessionId, conversation_id: String) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.conversation_id = Some(conversation_id);
        }
    }

    pub(crate) fn restore_sessions(&mut self, sessions: Vec<ChatSession>) {
        if sessions.is_empty() {
            return;
        }
        let max_session = sessions.iter().map(|s| s.id).max().unwrap_or(0);
        let max_message = sessions
            .iter()
            .flat_map(|s| s.messages.iter().map(|m| m.id))
            .max()
            .unwrap_or(0);
        self.sessions = sessions.into_iter().map(|s| (s.id, s)).collect();
        self.active_session = self.sessions.keys().next().copied().unwrap_or(1);
        self.next_session_id = max_session + 1;
        self.next_message_id = self.next_message_id.max(max_message + 1);
        self.chat_in_flight = None;
        self.mark_dirty();
    }

    /// Appends to `session_id`; returns false if the session does not exist.
    pub(crate) fn append_message(
        &mut self,
        session_id: SessionId,
        sender: Sender,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> bool {
        if !self.sessions.contains_key(&session_id) {
            return false;
        }
        let message_id = self.allocate_message_id();
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.append(message_id, sender, text, at);
        }
        self.mark_dirty();
        true
    }

    /// Narration always lands in whichever session is active when the event arrives.
    pub(crate) fn narrate(&mut self, text: String, at: DateTime<Utc>) {
        let active = self.active_session;
        self.append_message(active, Sender::System, text, at);
    }

    fn allocate_message_id(&mut self) -> MessageId {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    // --- chat single-flight ---

    pub(crate) fn chat_in_flight(&self) -> Option<SessionId> {
        self.chat_in_flight
    }

    pub(crate) fn begin_chat(&mut self, session_id: SessionId) {
        self.chat_in_flight = Some(session_id);
        self.mark_dirty();
    }

    pub(crate) fn finish_chat(&mut self) {
        if self.chat_in_flight.take().is_some() {
            self.mark_dirty();
        }
    }

    // --- uploads ---

    /// Registers a batch; the first file is immediately under validation.
    pub(crate) fn enqueue_batch(&mut self, files: Vec<FileRef>) -> (BatchId, Vec<PendingFile>) {
        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;
        let mut pending = Vec::with_capacity(files.len());
        for file in files {
            let client_key = self.next_client_key;
            self.next_client_key += 1;
            self.uploads.insert(
                client_key,
                UploadTask {
                    client_key,
                    batch_id,
                    file: file.clone(),
                    validation_error: None,
                    progress: UploadProgress::Percent(0),
                    outcome: UploadOutcome::Pending,
                },
            );
            pending.push(PendingFile { client_key, file });
        }
        self.advance_batch(batch_id);
        self.mark_dirty();
        (batch_id, pending)
    }

    /// Marks the earliest still-pending file of the batch as validating.
    fn advance_batch(&mut self, batch_id: BatchId) {
        if let Some(task) = self
            .uploads
            .values_mut()
            .find(|task| task.batch_id == batch_id && task.outcome == UploadOutcome::Pending)
        {
            task.outcome = UploadOutcome::Validating;
        }
    }

    pub(crate) fn upload_task_mut(&mut self, client_key: ClientKey) -> Option<&mut UploadTask> {
        self.uploads.get_mut(&client_key)
    }

    /// Drops a task that reached a terminal outcome and moves its batch along.
    pub(crate) fn retire_upload(&mut self, client_key: ClientKey) -> Option<UploadTask> {
        let task = self.uploads.remove(&client_key)?;
        self.advance_batch(task.batch_id);
        self.mark_dirty();
        Some(task)
    }

    pub(crate) fn record_upload_error(&mut self, record: UploadErrorRecord) {
        if self.upload_errors.len() == UPLOAD_ERROR_HISTORY {
            self.upload_errors.pop_front();
        }
        self.upload_errors.push_back(record);
        self.mark_dirty();
    }

    // --- documents ---

    /// Inserts a new document; returns false if the id is already known.
    pub(crate) fn insert_document(&mut self, document: Document) -> bool {
        if self.document(&document.id).is_some() {
            return false;
        }
        self.documents.push(document);
        self.mark_dirty();
        true
    }

    pub(crate) fn document_mut(&mut self, id: &DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|doc| &doc.id == id)
    }

    pub(crate) fn remove_document(&mut self, id: &DocumentId) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| &doc.id != id);
        let removed = self.documents.len() != before;
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn clear_documents(&mut self) {
        if !self.documents.is_empty() {
            self.documents.clear();
            self.mark_dirty();
        }
    }
}
