use serde::Deserialize;
use std::path::PathBuf;

use crate::engine::RankingConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// PostgreSQL connection URL. When unset the catalog is read from `catalog_path`
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the user-context read cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// JSON file with raw book records, used when no database is configured
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Directory holding the persisted snapshot blobs
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Size of the top-K pool ranked for each next-swipe request
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,

    /// TTL of cached user contexts, in seconds
    #[serde(default = "default_context_cache_ttl_secs")]
    pub context_cache_ttl_secs: u64,

    /// Default number of explore picks
    #[serde(default = "default_explore_count")]
    pub explore_count: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_candidate_pool_size() -> usize {
    500
}

fn default_context_cache_ttl_secs() -> u64 {
    300
}

fn default_explore_count() -> usize {
    3
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Ranking parameters handed to the recommendation engine
    pub fn ranking(&self) -> RankingConfig {
        RankingConfig {
            candidate_pool_size: self.candidate_pool_size,
            explore_count: self.explore_count,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
