use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{error::AppResult, models::RecommendedBook};

use super::{require_user_id, AppState};

#[derive(Debug, Deserialize)]
pub struct LikedQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Handler for the user's liked books with match scores
pub async fn liked(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LikedQuery>,
) -> AppResult<Json<Vec<RecommendedBook>>> {
    let user_id = require_user_id(&params.user_id)?;
    let context = state.accounts.user_context(user_id).await?;

    Ok(Json(state.service.liked_books(&context)))
}

/// Handler for catalog search by title or author
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<RecommendedBook>> {
    Json(state.service.search(&params.q))
}
