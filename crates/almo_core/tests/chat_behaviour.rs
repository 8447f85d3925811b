use std::sync::Once;

use almo_core::{
    update, AppState, Effect, Msg, SendOutcome, Sender, NEW_SESSION_GREETING, WELCOME_TEXT,
};
use chrono::{DateTime, TimeZone, Utc};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(almo_logging::initialize_for_tests);
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn send(state: AppState, text: &str) -> (AppState, Vec<Effect>) {
    let session_id = state.active_session();
    update(
        state,
        Msg::ChatSubmitted {
            session_id,
            text: text.to_string(),
            at: t0(),
        },
    )
}

fn transcript(state: &AppState) -> Vec<(Sender, String)> {
    state
        .view()
        .active_session
        .expect("active session")
        .messages
        .into_iter()
        .map(|m| (m.sender, m.text))
        .collect()
}

#[test]
fn new_state_has_welcome_session() {
    init_logging();
    let state = AppState::new(t0());
    let view = state.view();

    assert_eq!(view.sessions.len(), 1);
    assert!(view.sessions[0].active);
    assert_eq!(view.sessions[0].display_name, "AI Assistant");
    assert_eq!(
        transcript(&state),
        vec![(Sender::Assistant, WELCOME_TEXT.to_string())]
    );
    assert!(!view.chat_loading);
}

#[test]
fn send_appends_user_message_and_requests_completion() {
    init_logging();
    let (state, effects) = send(AppState::new(t0()), "hello");

    assert_eq!(
        effects,
        vec![Effect::CompleteChat {
            session_id: 1,
            text: "hello".to_string(),
            conversation_id: None,
        }]
    );
    let view = state.view();
    assert!(view.chat_loading);
    assert_eq!(view.last_send, Some(SendOutcome::Requested));
    assert_eq!(
        transcript(&state).last(),
        Some(&(Sender::User, "hello".to_string()))
    );
}

#[test]
fn second_send_while_in_flight_is_kept_but_not_requested() {
    init_logging();
    let (state, _) = send(AppState::new(t0()), "first");
    let before = transcript(&state);

    let (state, effects) = send(state, "hello");
    assert!(effects.is_empty());
    assert_eq!(state.view().last_send, Some(SendOutcome::RejectedInFlight));
    let mut expected = before;
    expected.push((Sender::User, "hello".to_string()));
    assert_eq!(transcript(&state), expected);
    assert!(state.view().chat_loading);

    let (state, _) = update(
        state,
        Msg::ChatReplied {
            session_id: 1,
            text: "hi there".to_string(),
            conversation_id: Some("conv-1".to_string()),
            at: t0(),
        },
    );
    assert!(!state.view().chat_loading);

    let (state, effects) = send(state, "hello");
    assert_eq!(
        effects,
        vec![Effect::CompleteChat {
            session_id: 1,
            text: "hello".to_string(),
            conversation_id: Some("conv-1".to_string()),
        }]
    );
    assert_eq!(state.view().last_send, Some(SendOutcome::Requested));
}

#[test]
fn failed_completion_appends_one_error_message_and_clears_loading() {
    init_logging();
    let (state, _) = send(AppState::new(t0()), "question");
    let count_before = transcript(&state).len();

    let (state, effects) = update(
        state,
        Msg::ChatFailed {
            session_id: 1,
            message: "An error occurred: boom".to_string(),
            at: t0(),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.view().chat_loading);
    let messages = transcript(&state);
    assert_eq!(messages.len(), count_before + 1);
    assert_eq!(
        messages.last(),
        Some(&(
            Sender::Assistant,
            "❌ Error: An error occurred: boom".to_string()
        ))
    );
}

#[test]
fn narration_text_never_requests_completion() {
    init_logging();
    for text in [
        "📤 Uploading a.pdf...",
        "✅ a.pdf uploaded",
        "❌ oops",
        "🎉 done",
    ] {
        let (state, effects) = send(AppState::new(t0()), text);
        assert!(effects.is_empty(), "{text}");
        assert!(!state.view().chat_loading);
        assert_eq!(state.view().last_send, Some(SendOutcome::Narration));
        assert_eq!(
            transcript(&state).last(),
            Some(&(Sender::System, text.to_string()))
        );
    }
}

#[test]
fn narration_is_accepted_while_completion_in_flight() {
    init_logging();
    let (state, _) = send(AppState::new(t0()), "first");
    let (state, effects) = send(state, "✅ b.txt uploaded");

    assert!(effects.is_empty());
    assert_eq!(state.view().last_send, Some(SendOutcome::Narration));
    assert!(state.view().chat_loading);
}

#[test]
fn blank_text_is_ignored() {
    init_logging();
    let state = AppState::new(t0());
    let before = transcript(&state);
    let (state, effects) = send(state, "   \n");

    assert!(effects.is_empty());
    assert_eq!(transcript(&state), before);
    assert_eq!(state.view().last_send, Some(SendOutcome::Empty));
}

#[test]
fn send_to_unknown_session_is_reported() {
    init_logging();
    let (state, effects) = update(
        AppState::new(t0()),
        Msg::ChatSubmitted {
            session_id: 42,
            text: "hello".to_string(),
            at: t0(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().last_send, Some(SendOutcome::UnknownSession));
}

#[test]
fn new_session_becomes_active_and_select_switches_back() {
    init_logging();
    let (state, _) = update(AppState::new(t0()), Msg::NewSession { at: t0() });
    let view = state.view();
    assert_eq!(view.sessions.len(), 2);
    assert_eq!(state.active_session(), 2);
    assert_eq!(view.sessions[1].display_name, "Chat 2");
    assert_eq!(
        transcript(&state),
        vec![(Sender::Assistant, NEW_SESSION_GREETING.to_string())]
    );

    let (state, _) = update(state, Msg::SessionSelected(1));
    assert_eq!(state.active_session(), 1);

    let (state, _) = update(state, Msg::SessionSelected(99));
    assert_eq!(state.active_session(), 1);
}

#[test]
fn reply_lands_in_originating_session_after_switch() {
    init_logging();
    let (state, _) = send(AppState::new(t0()), "question");
    let (state, _) = update(state, Msg::NewSession { at: t0() });
    let (state, _) = update(
        state,
        Msg::ChatReplied {
            session_id: 1,
            text: "answer".to_string(),
            conversation_id: None,
            at: t0(),
        },
    );

    let first = state
        .sessions_snapshot()
        .into_iter()
        .find(|s| s.id == 1)
        .unwrap();
    assert_eq!(first.messages.last().unwrap().text, "answer");
    assert_eq!(
        transcript(&state),
        vec![(Sender::Assistant, NEW_SESSION_GREETING.to_string())]
    );
}
