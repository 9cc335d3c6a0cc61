//! Content-similarity index and multi-signal candidate ranking.

pub mod builder;
pub mod index;
pub mod normalizer;
pub mod preference;
pub mod presentation;
pub mod ranker;
pub mod snapshot;
pub mod stopwords;
pub mod vectorizer;

pub use builder::{build_from_books, build_snapshot};
pub use index::SimilarityIndex;
pub use preference::{genre_match_ratio, GenrePreferences};
pub use ranker::CandidateRanker;
pub use snapshot::{CatalogSnapshot, SimilarityMatrix};

/// Tunables for candidate ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingConfig {
    /// Size of the top-K similarity pool scored for a next-swipe pick
    pub candidate_pool_size: usize,
    /// Default number of explore picks
    pub explore_count: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            candidate_pool_size: 500,
            explore_count: 3,
        }
    }
}
