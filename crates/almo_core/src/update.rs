use chrono::{DateTime, Utc};

use crate::{
    chat_error_text, is_narration, AppState, DocumentId, DocumentStatus, Effect, Msg, Narration,
    SendOutcome, Sender, SessionId, StatusChange, UploadErrorRecord, UploadEvent, UploadOutcome,
    UploadProgress, DEFAULT_PROCESSING_ERROR,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSubmitted(files) => {
            if files.is_empty() {
                return (state, Vec::new());
            }
            let (batch_id, files) = state.enqueue_batch(files);
            vec![Effect::UploadBatch { batch_id, files }]
        }
        Msg::Upload { event, at } => {
            apply_upload_event(&mut state, event, at);
            Vec::new()
        }
        Msg::DocumentsLoaded(documents) => {
            let mut effects = Vec::new();
            for document in documents {
                let document_id = document.id.clone();
                let status = document.status;
                if state.insert_document(document) && !status.is_terminal() {
                    effects.push(Effect::WatchDocument {
                        document_id,
                        status,
                    });
                }
            }
            effects
        }
        Msg::DocumentStatus {
            document_id,
            status,
            error_message,
            at,
        } => {
            apply_status(&mut state, &document_id, status, error_message, at);
            Vec::new()
        }
        Msg::PollAbandoned { document_id, at } => {
            if let Some(doc) = state.document(&document_id) {
                let text = Narration::Failure.text(&format!(
                    "Stopped checking {}: status is still {}",
                    doc.name, doc.status
                ));
                state.narrate(text, at);
            }
            Vec::new()
        }
        Msg::DocumentDismissed(document_id) => {
            if state.remove_document(&document_id) {
                vec![Effect::CancelPolling { document_id }]
            } else {
                Vec::new()
            }
        }
        Msg::DocumentsDiscarded => {
            state.clear_documents();
            vec![Effect::CancelAllPolling]
        }
        Msg::ChatSubmitted {
            session_id,
            text,
            at,
        } => submit_chat(&mut state, session_id, text, at),
        Msg::ChatReplied {
            session_id,
            text,
            conversation_id,
            at,
        } => {
            state.finish_chat();
            if let Some(conversation_id) = conversation_id {
                state.set_conversation_id(session_id, conversation_id);
            }
            state.append_message(session_id, Sender::Assistant, text, at);
            Vec::new()
        }
        Msg::ChatFailed {
            session_id,
            message,
            at,
        } => {
            state.finish_chat();
            state.append_message(session_id, Sender::Assistant, chat_error_text(&message), at);
            Vec::new()
        }
        Msg::NewSession { at } => {
            state.new_session(at);
            Vec::new()
        }
        Msg::SessionSelected(session_id) => {
            state.select_session(session_id);
            Vec::new()
        }
        Msg::RestoreSessions(sessions) => {
            state.restore_sessions(sessions);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit_chat(
    state: &mut AppState,
    session_id: SessionId,
    text: String,
    at: DateTime<Utc>,
) -> Vec<Effect> {
    if text.trim().is_empty() {
        state.set_last_send(SendOutcome::Empty);
        return Vec::new();
    }
    if !state.has_session(session_id) {
        state.set_last_send(SendOutcome::UnknownSession);
        return Vec::new();
    }
    if is_narration(&text) {
        state.append_message(session_id, Sender::System, text, at);
        state.set_last_send(SendOutcome::Narration);
        return Vec::new();
    }
    state.append_message(session_id, Sender::User, text.clone(), at);
    // Single-flight: the text stays in the transcript, but no second request is issued.
    if state.chat_in_flight().is_some() {
        state.set_last_send(SendOutcome::RejectedInFlight);
        return Vec::new();
    }

    state.begin_chat(session_id);
    state.set_last_send(SendOutcome::Requested);
    vec![Effect::CompleteChat {
        session_id,
        text,
        conversation_id: state.conversation_id(session_id),
    }]
}

fn apply_upload_event(state: &mut AppState, event: UploadEvent, at: DateTime<Utc>) {
    let client_key = event.file().client_key;
    match event {
        UploadEvent::Rejected { file, reason } => {
            if let Some(task) = state.upload_task_mut(client_key) {
                task.validation_error = Some(reason.clone());
                task.outcome = UploadOutcome::Failed;
            }
            state.retire_upload(client_key);
            state.record_upload_error(UploadErrorRecord {
                client_key,
                file_name: file.file.name.clone(),
                reason: reason.to_string(),
            });
            state.narrate(
                Narration::Failure.text(&format!("Cannot upload {}: {reason}", file.file.name)),
                at,
            );
        }
        UploadEvent::Started { file } => {
            if let Some(task) = state.upload_task_mut(client_key) {
                task.outcome = UploadOutcome::Uploading;
                task.progress = UploadProgress::Indeterminate;
            }
            state.narrate(
                Narration::UploadStarted.text(&format!("Uploading {}...", file.file.name)),
                at,
            );
        }
        UploadEvent::Progress { percent, .. } => {
            if let Some(task) = state.upload_task_mut(client_key) {
                task.progress = UploadProgress::Percent(percent.min(100));
            }
            state.mark_dirty();
        }
        UploadEvent::Succeeded { file, document } => {
            if let Some(task) = state.upload_task_mut(client_key) {
                task.outcome = UploadOutcome::Succeeded;
                task.progress = UploadProgress::Percent(100);
            }
            state.retire_upload(client_key);
            let status = document.status;
            let error_message = document.error_message.clone();
            let name = document.name.clone();
            if state.insert_document(document) {
                state.narrate(
                    Narration::UploadSucceeded
                        .text(&format!("{} uploaded. Processing...", file.file.name)),
                    at,
                );
                if status.is_terminal() {
                    narrate_terminal(state, &name, status, error_message.as_deref(), at);
                }
            }
        }
        UploadEvent::Failed { file, reason } => {
            if let Some(task) = state.upload_task_mut(client_key) {
                task.outcome = UploadOutcome::Failed;
            }
            state.retire_upload(client_key);
            state.record_upload_error(UploadErrorRecord {
                client_key,
                file_name: file.file.name.clone(),
                reason: reason.clone(),
            });
            state.narrate(
                Narration::Failure.text(&format!("Upload failed for {}: {reason}", file.file.name)),
                at,
            );
        }
    }
}

fn apply_status(
    state: &mut AppState,
    document_id: &DocumentId,
    status: DocumentStatus,
    error_message: Option<String>,
    at: DateTime<Utc>,
) {
    let Some(doc) = state.document_mut(document_id) else {
        // Dismissed while a poll was in flight.
        return;
    };
    if doc.apply_status(status, error_message) != StatusChange::Advanced {
        return;
    }
    let name = doc.name.clone();
    let error_message = doc.error_message.clone();
    state.mark_dirty();
    if status.is_terminal() {
        narrate_terminal(state, &name, status, error_message.as_deref(), at);
    }
}

fn narrate_terminal(
    state: &mut AppState,
    name: &str,
    status: DocumentStatus,
    error_message: Option<&str>,
    at: DateTime<Utc>,
) {
    let text = match status {
        DocumentStatus::Completed => Narration::ProcessingComplete.text(&format!(
            "{name} is ready. You can now ask questions about it."
        )),
        _ => Narration::Failure.text(&format!(
            "Processing failed for {name}: {}",
            error_message.unwrap_or(DEFAULT_PROCESSING_ERROR)
        )),
    };
    state.narrate(text, at);
}
