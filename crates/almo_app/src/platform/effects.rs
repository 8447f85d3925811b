use almo_core::{Effect, Msg};
use almo_engine::{EngineEvent, EngineHandle, CHAT_FAILURE_MESSAGE};
use almo_logging::{almo_info, almo_warn};
use chrono::{DateTime, Utc};

/// Hands core effects to the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::UploadBatch { batch_id, files } => {
                    almo_info!("UploadBatch batch_id={} files={}", batch_id, files.len());
                    self.engine.submit_batch(files);
                }
                Effect::WatchDocument {
                    document_id,
                    status,
                } => {
                    almo_info!("WatchDocument id={} status={}", document_id, status);
                    self.engine.watch(document_id, status);
                }
                Effect::CancelPolling { document_id } => {
                    almo_info!("CancelPolling id={}", document_id);
                    self.engine.cancel_polling(&document_id);
                }
                Effect::CancelAllPolling => {
                    almo_info!("CancelAllPolling");
                    self.engine.cancel_all_polling();
                }
                Effect::CompleteChat {
                    session_id,
                    text,
                    conversation_id,
                } => {
                    almo_info!(
                        "CompleteChat session={} continuing={}",
                        session_id,
                        conversation_id.is_some()
                    );
                    self.engine.complete_chat(session_id, text, conversation_id);
                }
            }
        }
    }

    pub fn load_documents(&self) {
        self.engine.load_documents();
    }

    pub fn shutdown(&self) {
        self.engine.cancel_all_polling();
    }
}

/// Translates an engine event into the message the core expects.
pub fn map_event(event: EngineEvent, at: DateTime<Utc>) -> Option<Msg> {
    match event {
        EngineEvent::Upload(event) => Some(Msg::Upload { event, at }),
        EngineEvent::DocumentStatus {
            document_id,
            status,
            error_message,
        } => Some(Msg::DocumentStatus {
            document_id,
            status,
            error_message,
            at,
        }),
        EngineEvent::PollAbandoned { document_id } => Some(Msg::PollAbandoned { document_id, at }),
        EngineEvent::DocumentsLoaded(Ok(documents)) => Some(Msg::DocumentsLoaded(documents)),
        EngineEvent::DocumentsLoaded(Err(err)) => {
            almo_warn!("Document list unavailable: {}", err);
            None
        }
        EngineEvent::ChatCompleted { session_id, result } => Some(match result {
            Ok(reply) => Msg::ChatReplied {
                session_id,
                text: reply.response,
                conversation_id: reply.conversation_id,
                at,
            },
            Err(err) => Msg::ChatFailed {
                session_id,
                message: err.user_message(CHAT_FAILURE_MESSAGE),
                at,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use almo_core::{DocumentId, DocumentStatus};
    use almo_engine::{ApiError, ChatReply};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn chat_failures_carry_user_facing_text() {
        let msg = map_event(
            EngineEvent::ChatCompleted {
                session_id: 2,
                result: Err(ApiError::Remote {
                    status: 502,
                    message: None,
                }),
            },
            at(),
        );
        assert_eq!(
            msg,
            Some(Msg::ChatFailed {
                session_id: 2,
                message: "Failed to get response".to_string(),
                at: at(),
            })
        );

        let msg = map_event(
            EngineEvent::ChatCompleted {
                session_id: 2,
                result: Err(ApiError::Remote {
                    status: 500,
                    message: Some("model unavailable".to_string()),
                }),
            },
            at(),
        );
        assert!(matches!(msg, Some(Msg::ChatFailed { message, .. }) if message == "model unavailable"));
    }

    #[test]
    fn chat_reply_keeps_conversation() {
        let msg = map_event(
            EngineEvent::ChatCompleted {
                session_id: 1,
                result: Ok(ChatReply {
                    response: "Hello".to_string(),
                    conversation_id: Some("c-9".to_string()),
                }),
            },
            at(),
        );
        assert_eq!(
            msg,
            Some(Msg::ChatReplied {
                session_id: 1,
                text: "Hello".to_string(),
                conversation_id: Some("c-9".to_string()),
                at: at(),
            })
        );
    }

    #[test]
    fn status_events_are_stamped() {
        let msg = map_event(
            EngineEvent::DocumentStatus {
                document_id: DocumentId::new("d1"),
                status: DocumentStatus::Embedding,
                error_message: None,
            },
            at(),
        );
        assert_eq!(
            msg,
            Some(Msg::DocumentStatus {
                document_id: DocumentId::new("d1"),
                status: DocumentStatus::Embedding,
                error_message: None,
                at: at(),
            })
        );
    }

    #[test]
    fn failed_document_list_is_dropped() {
        assert_eq!(
            map_event(EngineEvent::DocumentsLoaded(Err(ApiError::AuthRequired)), at()),
            None
        );
    }
}
