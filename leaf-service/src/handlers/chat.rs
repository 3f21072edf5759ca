use crate::error::LeafError;
use crate::models::{ChatRequest, ChatResponse};
use crate::services::metrics::record_chat;
use crate::handlers::extract::ApiJson;
use crate::startup::AppState;
use axum::{extract::State, Json};
use validator::Validate;

pub async fn ask(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, LeafError> {
    payload.validate()?;

    match state.chat.reply(&payload.message).await {
        Ok(reply) => {
            record_chat("ok");
            Ok(Json(ChatResponse { reply }))
        }
        Err(err) => {
            record_chat(err.code());
            Err(err)
        }
    }
}
