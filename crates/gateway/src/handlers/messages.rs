//! Messaging handlers, always from the current user's point of view

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::AppState;
use papertok_common::{
    errors::Result,
    models::{Conversation, Message, NewMessage, CURRENT_USER_ID},
};

pub async fn conversations(State(state): State<AppState>) -> Result<Json<Vec<Conversation>>> {
    Ok(Json(state.source.get_conversations(CURRENT_USER_ID).await?))
}

pub async fn thread(State(state): State<AppState>, Path(other): Path<i64>) -> Result<Json<Vec<Message>>> {
    Ok(Json(state.source.get_messages(CURRENT_USER_ID, other).await?))
}

pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<NewMessage>,
) -> Result<(StatusCode, Json<Message>)> {
    body.validate()?;
    let message = state
        .source
        .send_message(CURRENT_USER_ID, body.receiver_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_read(State(state): State<AppState>, Path(other): Path<i64>) -> Result<Json<bool>> {
    Ok(Json(
        state.source.mark_messages_as_read(CURRENT_USER_ID, other).await?,
    ))
}
