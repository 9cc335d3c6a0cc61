pub mod model_store;
pub mod postgres;
pub mod redis;

pub use model_store::ModelStore;
pub use postgres::{create_pool, PgAccountStore, PgCatalog};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;
