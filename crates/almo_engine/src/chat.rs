use almo_core::SessionId;
use almo_logging::{almo_info, almo_warn};

use crate::{ApiError, Backend, ChatReply, ChatRequest, Credential};

/// Issues one chat completion. A missing credential fails before any request.
pub async fn complete_chat(
    backend: &dyn Backend,
    credential: Option<Credential>,
    session_id: SessionId,
    text: String,
    conversation_id: Option<String>,
) -> Result<ChatReply, ApiError> {
    let credential = credential.ok_or(ApiError::AuthRequired)?;
    let request = ChatRequest {
        message: text,
        conversation_id,
    };
    almo_info!(
        "Chat request session={} chars={}",
        session_id,
        request.message.chars().count()
    );
    let result = backend.complete_chat(&request, &credential).await;
    match &result {
        Ok(reply) => almo_info!(
            "Chat reply session={} chars={}",
            session_id,
            reply.response.chars().count()
        ),
        Err(err) => almo_warn!("Chat request session={} failed: {}", session_id, err),
    }
    result
}
