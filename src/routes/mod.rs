use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

pub mod books;
pub mod catalog;
pub mod recommendations;
mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations/initial", post(recommendations::initial))
        .route("/recommendations/next", post(recommendations::next))
        .route("/recommendations/explore", get(recommendations::explore))
        .route("/books/liked", get(books::liked))
        .route("/books/search", get(books::search))
        .route("/catalog", get(catalog::info))
        .route("/catalog/sync", post(catalog::sync))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Rejects blank user ids before any store is consulted
fn require_user_id(user_id: &str) -> crate::error::AppResult<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(crate::error::AppError::InvalidInput(
            "user_id cannot be empty".to_string(),
        ));
    }
    Ok(user_id)
}
