use almo_core::{
    AppViewModel, DocumentRow, Message, Sender, SessionId, UploadOutcome, UploadProgress,
    UploadRow,
};
use chrono::Local;

/// What has already been printed, so each render only emits what is new.
#[derive(Debug, Default)]
pub struct RenderState {
    session: Option<SessionId>,
    printed: usize,
    status: Option<String>,
}

/// Lines to print for the changes since the previous render.
pub fn render(view: &AppViewModel, printed: &mut RenderState) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(session) = &view.active_session {
        if printed.session != Some(session.id) {
            lines.push(format!("== {} (#{}) ==", session.display_name, session.id));
            printed.session = Some(session.id);
            printed.printed = 0;
        }
        let fresh = session.messages.iter().skip(printed.printed);
        lines.extend(fresh.map(format_message));
        printed.printed = session.messages.len();
    }

    let status = status_line(view);
    if printed.status.as_deref() != Some(status.as_str()) {
        lines.push(status.clone());
        printed.status = Some(status);
    }
    lines
}

/// Full document and upload listing for `/docs`.
pub fn render_documents(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if view.documents.is_empty() {
        lines.push("No documents.".to_string());
    }
    lines.extend(view.documents.iter().map(format_document_row));
    if !view.uploads.is_empty() {
        lines.push("Uploads:".to_string());
        lines.extend(view.uploads.iter().map(format_upload_row));
    }
    if !view.upload_errors.is_empty() {
        lines.push("Recent upload errors:".to_string());
        lines.extend(
            view.upload_errors
                .iter()
                .map(|record| format!("  {}: {}", record.file_name, record.reason)),
        );
    }
    lines
}

pub fn render_sessions(view: &AppViewModel) -> Vec<String> {
    view.sessions
        .iter()
        .map(|session| {
            let marker = if session.active { "*" } else { " " };
            format!(
                "{marker} #{} {} ({} messages)",
                session.id, session.display_name, session.message_count
            )
        })
        .collect()
}

fn status_line(view: &AppViewModel) -> String {
    let active_uploads = view
        .uploads
        .iter()
        .filter(|row| !row.outcome.is_terminal())
        .count();
    let processing = view
        .documents
        .iter()
        .filter(|doc| !doc.status.is_terminal())
        .count();
    let mut status = format!(
        "[documents: {} | processing: {} | uploading: {}",
        view.documents.len(),
        processing,
        active_uploads
    );
    if view.chat_loading {
        status.push_str(" | assistant is typing...");
    }
    status.push(']');
    status
}

fn format_message(message: &Message) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    match message.sender {
        Sender::User => format!("{time} you> {}", message.text),
        Sender::Assistant => format!("{time} assistant> {}", message.text),
        Sender::System => format!("{time} {}", message.text),
    }
}

fn format_document_row(doc: &DocumentRow) -> String {
    let size = if doc.size > 0 {
        format!(" ({} B)", format_with_commas(doc.size))
    } else {
        String::new()
    };
    match &doc.error_message {
        Some(error) => format!("  {} [{}] {}{} - {}", doc.id, doc.status, doc.name, size, error),
        None => format!("  {} [{}] {}{}", doc.id, doc.status, doc.name, size),
    }
}

fn format_upload_row(row: &UploadRow) -> String {
    let state = match (row.outcome, row.progress) {
        (UploadOutcome::Uploading, UploadProgress::Percent(percent)) => format!("uploading {percent}%"),
        (UploadOutcome::Uploading, UploadProgress::Indeterminate) => "uploading".to_string(),
        (UploadOutcome::Pending, _) => "queued".to_string(),
        (UploadOutcome::Validating, _) => "validating".to_string(),
        (UploadOutcome::Succeeded, _) => "done".to_string(),
        (UploadOutcome::Failed, _) => "failed".to_string(),
    };
    match &row.validation_error {
        Some(error) => format!("  {} - {} ({})", row.name, state, error),
        None => format!("  {} - {}", row.name, state),
    }
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use almo_core::{update, AppState, Msg};
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn only_new_messages_are_printed() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let state = AppState::new(now);
        let mut printed = RenderState::default();

        let first = render(&state.view(), &mut printed);
        assert_eq!(first[0], "== AI Assistant (#1) ==");
        assert!(first[1].ends_with("assistant> Welcome! I can help you search your documents, create tasks, and answer questions. How can I assist you today?"));
        assert!(first[2].starts_with("[documents: 0"));

        assert!(render(&state.view(), &mut printed).is_empty());

        let (state, _) = update(
            state,
            Msg::ChatSubmitted {
                session_id: 1,
                text: "hello".to_string(),
                at: now,
            },
        );
        let lines = render(&state.view(), &mut printed);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("you> hello"));
        assert!(lines[1].contains("assistant is typing..."));
    }

    #[test]
    fn switching_sessions_prints_a_header() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut printed = RenderState::default();
        let state = AppState::new(now);
        render(&state.view(), &mut printed);

        let (state, _) = update(state, Msg::NewSession { at: now });
        let lines = render(&state.view(), &mut printed);
        assert_eq!(lines[0], "== Chat 2 (#2) ==");
        assert!(lines[1].ends_with("assistant> How can I help you today?"));
    }

    #[test]
    fn sizes_are_grouped() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(52_428_800), "52,428,800");
    }
}
