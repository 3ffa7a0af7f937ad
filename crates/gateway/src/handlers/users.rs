//! User profile and follow handlers

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::AppState;
use papertok_common::{errors::Result, models::User};

pub async fn current_user(State(state): State<AppState>) -> Result<Json<User>> {
    Ok(Json(state.source.get_current_user().await?))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<User>> {
    Ok(Json(state.source.get_user(id).await?))
}

pub async fn user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>> {
    Ok(Json(state.source.get_user_by_username(&username).await?))
}

pub async fn following_list(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.source.get_following_list().await?))
}

pub async fn is_following(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<bool>> {
    Ok(Json(state.source.is_following(id).await?))
}

pub async fn follow(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<bool>> {
    let changed = state.source.follow_user(id).await?;
    info!(user_id = id, changed, "Follow request handled");
    Ok(Json(changed))
}

pub async fn unfollow(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<bool>> {
    let changed = state.source.unfollow_user(id).await?;
    info!(user_id = id, changed, "Unfollow request handled");
    Ok(Json(changed))
}
