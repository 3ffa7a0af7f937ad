//! Knowledge base handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::AppState;
use papertok_common::{
    errors::{AppError, Resource, Result},
    models::{KnowledgeBase, NewKnowledgeBase, NewPaper, Paper},
};

pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<KnowledgeBase>>> {
    Ok(Json(state.source.get_all_knowledge_bases().await?))
}

/// 404 when the knowledge base does not exist
pub async fn get_knowledge_base(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<KnowledgeBase>> {
    state
        .source
        .get_knowledge_base(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(Resource::KnowledgeBase, id))
}

pub async fn by_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<KnowledgeBase>>> {
    Ok(Json(state.source.get_user_knowledge_bases(id).await?))
}

pub async fn by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<KnowledgeBase>>> {
    Ok(Json(
        state.source.get_user_knowledge_bases_by_username(&username).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Json(kb): Json<NewKnowledgeBase>,
) -> Result<(StatusCode, Json<KnowledgeBase>)> {
    let created = state.source.add_knowledge_base(kb).await?;
    info!(kb_id = created.id, user_id = created.user_id, "Knowledge base created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn add_paper(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(paper): Json<NewPaper>,
) -> Result<(StatusCode, Json<Paper>)> {
    let added = state.source.add_paper_to_knowledge_base(id, paper).await?;
    info!(kb_id = id, paper_id = added.id, "Paper added");
    Ok((StatusCode::CREATED, Json(added)))
}
