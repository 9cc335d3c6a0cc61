use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, CacheWriterHandle, ModelStore, PgAccountStore,
        PgCatalog,
    },
    engine::{build_snapshot, CatalogSnapshot},
    error::AppError,
    services::{
        AccountStore, CachedAccountStore, CatalogSource, InMemoryAccountStore, JsonFileCatalog,
        RecommendationService,
    },
};

/// Shared application state handed to every handler
pub struct AppState {
    pub service: Arc<RecommendationService>,
    pub accounts: Arc<dyn AccountStore>,
    pub catalog: Arc<dyn CatalogSource>,
    pub store: Arc<ModelStore>,
}

impl AppState {
    pub fn new(
        service: Arc<RecommendationService>,
        accounts: Arc<dyn AccountStore>,
        catalog: Arc<dyn CatalogSource>,
        store: Arc<ModelStore>,
    ) -> Self {
        Self {
            service,
            accounts,
            catalog,
            store,
        }
    }

    /// Wires collaborators from configuration and loads (or builds) the first snapshot
    ///
    /// With `DATABASE_URL` set, catalog and accounts come from Postgres, and account
    /// reads go through Redis when `REDIS_URL` is set too. Otherwise the catalog is
    /// read from `CATALOG_PATH` and accounts live in memory.
    pub async fn from_config(
        config: &Config,
    ) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let (catalog, accounts, cache_handle): (
            Arc<dyn CatalogSource>,
            Arc<dyn AccountStore>,
            Option<CacheWriterHandle>,
        ) = match &config.database_url {
            Some(database_url) => {
                let pool = create_pool(database_url).await?;
                tracing::info!("Connected to PostgreSQL");

                let accounts: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool.clone()));
                let (accounts, cache_handle) = match &config.redis_url {
                    Some(redis_url) => {
                        let (cache, handle) = Cache::new(create_redis_client(redis_url)?).await;
                        let cached: Arc<dyn AccountStore> = Arc::new(CachedAccountStore::new(
                            accounts,
                            cache,
                            config.context_cache_ttl_secs,
                        ));
                        (cached, Some(handle))
                    }
                    None => (accounts, None),
                };

                (Arc::new(PgCatalog::new(pool)), accounts, cache_handle)
            }
            None => {
                let Some(path) = &config.catalog_path else {
                    anyhow::bail!("either DATABASE_URL or CATALOG_PATH must be set");
                };
                (
                    Arc::new(JsonFileCatalog::new(path)),
                    Arc::new(InMemoryAccountStore::new()),
                    None,
                )
            }
        };

        let store = Arc::new(ModelStore::new(&config.model_dir));
        let snapshot = load_or_build(catalog.as_ref(), &store).await?;
        let service = Arc::new(RecommendationService::new(snapshot, config.ranking()));

        Ok((Self::new(service, accounts, catalog, store), cache_handle))
    }
}

/// Loads the persisted snapshot, building and persisting one when there is none
///
/// A damaged pair on disk is replaced by a fresh build numbered after the
/// newest version still readable from it.
async fn load_or_build(
    catalog: &dyn CatalogSource,
    store: &Arc<ModelStore>,
) -> anyhow::Result<CatalogSnapshot> {
    match store.load() {
        Ok(Some(snapshot)) => return Ok(snapshot),
        Ok(None) => tracing::info!("No persisted snapshot, building from catalog"),
        Err(AppError::Persistence(e)) => {
            tracing::warn!(error = %e, "Persisted snapshot unusable, rebuilding from catalog")
        }
        Err(e) => return Err(e.into()),
    }

    let records = catalog.fetch_catalog().await?;
    tracing::info!(source = catalog.name(), records = records.len(), "Catalog fetched");

    let store = store.clone();
    let snapshot = tokio::task::spawn_blocking(move || -> anyhow::Result<CatalogSnapshot> {
        let version = store.stored_version().map_or(1, |v| v + 1);
        let snapshot = build_snapshot(records, version)?;
        store.save(&snapshot)?;
        Ok(snapshot)
    })
    .await??;

    Ok(snapshot)
}
