//! Paper search and lookup handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::AppState;
use papertok_common::{errors::Result, models::Paper};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Paper>>> {
    Ok(Json(state.source.search_papers(&params.q).await?))
}

pub async fn get_paper(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Paper>> {
    Ok(Json(state.source.get_paper(id).await?))
}
