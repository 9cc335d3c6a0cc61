//! Catalog collaborators feeding index rebuilds.

use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    db::ModelStore,
    engine::CatalogSnapshot,
    error::{AppError, AppResult},
    models::RawBookRecord,
    services::RecommendationService,
};

/// Source of raw catalog records, read only when the index is (re)built
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns every catalog record in a stable order
    async fn fetch_catalog(&self) -> AppResult<Vec<RawBookRecord>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<RawBookRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<RawBookRecord>) -> Self {
        Self { records }
    }
}

#[async_trait::async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_catalog(&self) -> AppResult<Vec<RawBookRecord>> {
        Ok(self.records.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Catalog stored as a JSON array of records on disk
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CatalogSource for JsonFileCatalog {
    async fn fetch_catalog(&self) -> AppResult<Vec<RawBookRecord>> {
        let bytes = tokio::fs::read(&self.path).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Persistence(format!(
                "catalog file {} is not a JSON array of records: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

/// Fetches the catalog, builds a new snapshot, persists it, then swaps it in
///
/// The live snapshot is left untouched if any step fails. Concurrent syncs run
/// one after another, so the last one to finish serves the newest version.
pub async fn sync_catalog(
    source: Arc<dyn CatalogSource>,
    service: Arc<RecommendationService>,
    store: Arc<ModelStore>,
) -> AppResult<Arc<CatalogSnapshot>> {
    let _rebuild = service.lock_rebuild().await;
    tracing::info!(source = source.name(), "Syncing catalog");
    let records = source.fetch_catalog().await?;
    tracing::info!(records = records.len(), "Catalog fetched");

    let builder = service.clone();
    let snapshot = tokio::task::spawn_blocking(move || -> AppResult<CatalogSnapshot> {
        let snapshot = builder.prepare(records)?;
        store.save(&snapshot)?;
        Ok(snapshot)
    })
    .await
    .map_err(|e| AppError::Internal(format!("index build task failed: {}", e)))??;

    Ok(service.install(snapshot))
}
