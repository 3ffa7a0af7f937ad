//! Community moderation handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::AppState;
use papertok_common::{
    errors::Result,
    models::{Comment, PageRequest, PageResponse, Post, PostFilter, DEFAULT_PAGE_SIZE},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub approved_only: bool,
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl ListParams {
    fn page(&self) -> PageRequest {
        PageRequest {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

async fn list(state: &AppState, filter: PostFilter, params: &ListParams) -> Result<Json<PageResponse<Post>>> {
    Ok(Json(state.source.list_posts(filter, params.page()).await?))
}

pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse<Post>>> {
    let filter = PostFilter::All {
        approved_only: params.approved_only,
    };
    list(&state, filter, &params).await
}

pub async fn list_pending(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse<Post>>> {
    list(&state, PostFilter::Pending, &params).await
}

pub async fn list_hidden(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse<Post>>> {
    list(&state, PostFilter::Hidden, &params).await
}

pub async fn comments(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Vec<Comment>>> {
    Ok(Json(state.source.get_post_comments(id).await?))
}

pub async fn approve_post(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Post>> {
    let post = state.source.approve_post(id).await?;
    info!(post_id = id, approved = post.is_approved, "Post approval toggled");
    Ok(Json(post))
}

pub async fn hide_post(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Post>> {
    let post = state.source.hide_post(id).await?;
    info!(post_id = id, hidden = post.is_hidden, "Post visibility toggled");
    Ok(Json(post))
}

pub async fn delete_post(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.source.delete_post(id).await?;
    info!(post_id = id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_comment(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Comment>> {
    Ok(Json(state.source.approve_comment(id).await?))
}

pub async fn hide_comment(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Comment>> {
    Ok(Json(state.source.hide_comment(id).await?))
}

pub async fn delete_comment(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.source.delete_comment(id).await?;
    info!(comment_id = id, "Comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
