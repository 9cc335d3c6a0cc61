use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Recommendation, RecommendedBook},
};

use super::{require_user_id, AppState};

#[derive(Debug, Deserialize)]
pub struct InitialRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NextRequest {
    pub user_id: String,
    /// Book the user just swiped
    pub book_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub user_id: String,
    pub n: Option<usize>,
}

/// Handler for the first pick of a session
pub async fn initial(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<InitialRequest>,
) -> AppResult<Json<Recommendation>> {
    let user_id = require_user_id(&request.user_id)?;
    let context = state.accounts.user_context(user_id).await?;

    let recommendation = state.service.initial_recommendation(&context);

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        done = recommendation.is_done(),
        "Initial recommendation served"
    );

    Ok(Json(recommendation))
}

/// Handler for the pick following a swipe
pub async fn next(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<NextRequest>,
) -> AppResult<Json<Recommendation>> {
    let user_id = require_user_id(&request.user_id)?;
    let context = state.accounts.user_context(user_id).await?;

    let recommendation = state
        .service
        .next_recommendation(request.book_id.as_deref(), &context);

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        anchor = request.book_id.as_deref().unwrap_or("-"),
        done = recommendation.is_done(),
        "Next recommendation served"
    );

    Ok(Json(recommendation))
}

/// Handler for out-of-genre picks
pub async fn explore(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExploreQuery>,
) -> AppResult<Json<Vec<RecommendedBook>>> {
    let user_id = require_user_id(&params.user_id)?;
    let context = state.accounts.user_context(user_id).await?;

    Ok(Json(state.service.explore_recommendations(&context, params.n)))
}
