pub mod accounts;
pub mod catalog;
pub mod recommendations;

pub use accounts::{AccountStore, CachedAccountStore, FriendProfile, InMemoryAccountStore};
pub use catalog::{sync_catalog, CatalogSource, JsonFileCatalog, StaticCatalog};
pub use recommendations::RecommendationService;
