use almo_core::{update, AppState, ChatSession, Effect, Msg, Sender};
use chrono::{TimeZone, Utc};

#[test]
fn sessions_can_be_restored_and_continue_ids() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let (state, _) = update(
        AppState::new(at),
        Msg::ChatSubmitted {
            session_id: 1,
            text: "remember me".to_string(),
            at,
        },
    );
    let (state, _) = update(
        state,
        Msg::ChatReplied {
            session_id: 1,
            text: "noted".to_string(),
            conversation_id: Some("c-9".to_string()),
            at,
        },
    );
    let (state, _) = update(state, Msg::NewSession { at });

    let snapshot = state.sessions_snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].conversation_id.as_deref(), Some("c-9"));

    let (restored, _) = update(AppState::new(at), Msg::RestoreSessions(snapshot.clone()));
    assert_eq!(restored.sessions_snapshot(), snapshot);
    assert_eq!(restored.active_session(), 1);

    let (restored, effects) = update(
        restored,
        Msg::ChatSubmitted {
            session_id: 1,
            text: "again".to_string(),
            at,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::CompleteChat {
            session_id: 1,
            text: "again".to_string(),
            conversation_id: Some("c-9".to_string()),
        }]
    );

    let messages = &restored.sessions_snapshot()[0].messages;
    let ids: Vec<_> = messages.iter().map(|m| m.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(ids, sorted, "message ids stay unique and increasing");

    let (restored, _) = update(restored, Msg::NewSession { at });
    assert_eq!(restored.active_session(), 3);
}

#[test]
fn empty_restore_keeps_default_session() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let state = AppState::new(at);
    let (restored, _) = update(state.clone(), Msg::RestoreSessions(Vec::<ChatSession>::new()));

    assert_eq!(restored.sessions_snapshot(), state.sessions_snapshot());
    assert_eq!(
        restored.sessions_snapshot()[0].messages[0].sender,
        Sender::Assistant
    );
}
