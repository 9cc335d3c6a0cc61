use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    engine::CatalogSnapshot, error::AppResult, middleware::request_id::RequestId,
    services::sync_catalog,
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct CatalogInfo {
    pub version: u64,
    pub built_at: DateTime<Utc>,
    pub books: usize,
}

impl From<&CatalogSnapshot> for CatalogInfo {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        Self {
            version: snapshot.version(),
            built_at: snapshot.built_at(),
            books: snapshot.len(),
        }
    }
}

/// Handler describing the snapshot currently served
pub async fn info(State(state): State<Arc<AppState>>) -> Json<CatalogInfo> {
    Json(CatalogInfo::from(state.service.snapshot().as_ref()))
}

/// Handler rebuilding the index from the catalog source
pub async fn sync(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<CatalogInfo>> {
    tracing::info!(request_id = %request_id, "Processing catalog sync");

    let snapshot = sync_catalog(
        state.catalog.clone(),
        state.service.clone(),
        state.store.clone(),
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        version = snapshot.version(),
        books = snapshot.len(),
        "Catalog sync completed"
    );

    Ok(Json(CatalogInfo::from(snapshot.as_ref())))
}
