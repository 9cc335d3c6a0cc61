use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    engine::{
        build_snapshot,
        presentation::{
            match_label, DisplayScale, COLD_START_SCALE, EXPLORE_SCALE, LIKED_BOOKS_SCALE,
            NEXT_SWIPE_SCALE, START_SWIPING_LABEL,
        },
        CandidateRanker, CatalogSnapshot, RankingConfig,
    },
    error::AppResult,
    models::{RawBookRecord, Recommendation, RecommendedBook, ScoredCandidate, UserContext},
};

/// Maximum number of catalog search results
pub const SEARCH_LIMIT: usize = 20;

/// Answers recommendation requests against the live catalog snapshot
///
/// The snapshot is replaced wholesale by [`Self::install`]; every request ranks
/// against the one snapshot it grabbed at the start.
pub struct RecommendationService {
    live: RwLock<Arc<CatalogSnapshot>>,
    next_version: AtomicU64,
    rebuild_lock: tokio::sync::Mutex<()>,
    config: RankingConfig,
}

impl RecommendationService {
    pub fn new(snapshot: CatalogSnapshot, config: RankingConfig) -> Self {
        let next_version = snapshot.version() + 1;
        Self {
            live: RwLock::new(Arc::new(snapshot)),
            next_version: AtomicU64::new(next_version),
            rebuild_lock: tokio::sync::Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> RankingConfig {
        self.config
    }

    /// The snapshot currently served
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.live.read().clone()
    }

    /// Builds a snapshot with the next version number without serving it
    pub fn prepare(&self, records: Vec<RawBookRecord>) -> AppResult<CatalogSnapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        build_snapshot(records, version)
    }

    /// Held for the whole fetch, build, persist and install of a catalog sync
    pub async fn lock_rebuild(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.rebuild_lock.lock().await
    }

    /// Atomically replaces the served snapshot
    ///
    /// A snapshot older than the live one is discarded and the live one returned.
    pub fn install(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let mut live = self.live.write();
        if snapshot.version() < live.version() {
            tracing::warn!(
                live_version = live.version(),
                version = snapshot.version(),
                "Discarding catalog snapshot older than the live one"
            );
            return live.clone();
        }

        let snapshot = Arc::new(snapshot);
        let previous = std::mem::replace(&mut *live, snapshot.clone());
        drop(live);
        tracing::info!(
            previous_version = previous.version(),
            version = snapshot.version(),
            books = snapshot.len(),
            "Catalog snapshot installed"
        );
        snapshot
    }

    /// Builds and serves a new snapshot; an empty corpus leaves the current one in place
    pub fn rebuild(&self, records: Vec<RawBookRecord>) -> AppResult<Arc<CatalogSnapshot>> {
        let snapshot = self.prepare(records)?;
        Ok(self.install(snapshot))
    }

    /// First pick for a user who has not swiped yet
    ///
    /// Ranks the whole catalog by genre match and centrality. Without genre
    /// preferences it returns the first unseen book, unscored.
    pub fn initial_recommendation(&self, context: &UserContext) -> Recommendation {
        let snapshot = self.snapshot();
        let ranker = CandidateRanker::new(&snapshot, context);

        if let Some(best) = ranker.rank_cold_start().into_iter().next() {
            return Recommendation::Book(scored_book(&snapshot, &best, COLD_START_SCALE));
        }

        match ranker.first_unseen() {
            Some(row) => Recommendation::Book(RecommendedBook::from_book(
                snapshot.book(row),
                None,
                START_SWIPING_LABEL.to_string(),
            )),
            None => {
                tracing::debug!("Catalog exhausted on cold start");
                Recommendation::Done
            }
        }
    }

    /// Next pick after the user swiped `anchor_id`
    ///
    /// An unknown or missing anchor falls back to the first catalog book.
    pub fn next_recommendation(
        &self,
        anchor_id: Option<&str>,
        context: &UserContext,
    ) -> Recommendation {
        let snapshot = self.snapshot();
        let anchor = resolve_anchor(&snapshot, anchor_id);
        let ranker = CandidateRanker::new(&snapshot, context);

        match ranker
            .rank_next(anchor, self.config.candidate_pool_size)
            .into_iter()
            .next()
        {
            Some(best) => Recommendation::Book(
                scored_book(&snapshot, &best, NEXT_SWIPE_SCALE).with_liked_by(best.liked_by),
            ),
            None => {
                tracing::debug!(anchor = %snapshot.book(anchor).id, "No candidates left");
                Recommendation::Done
            }
        }
    }

    /// Up to `n` well-connected books outside the user's genres
    pub fn explore_recommendations(
        &self,
        context: &UserContext,
        n: Option<usize>,
    ) -> Vec<RecommendedBook> {
        let snapshot = self.snapshot();
        let n = n.unwrap_or(self.config.explore_count);

        CandidateRanker::new(&snapshot, context)
            .rank_explore(n)
            .iter()
            .map(|candidate| scored_book(&snapshot, candidate, EXPLORE_SCALE))
            .collect()
    }

    /// The user's liked books with a "why you liked this" score
    pub fn liked_books(&self, context: &UserContext) -> Vec<RecommendedBook> {
        let snapshot = self.snapshot();

        CandidateRanker::new(&snapshot, context)
            .score_liked_books()
            .iter()
            .map(|candidate| scored_book(&snapshot, candidate, LIKED_BOOKS_SCALE))
            .collect()
    }

    /// Case-insensitive title/author search in catalog order
    pub fn search(&self, query: &str) -> Vec<RecommendedBook> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let snapshot = self.snapshot();
        snapshot
            .books()
            .iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&query)
                    || book.author.to_lowercase().contains(&query)
            })
            .take(SEARCH_LIMIT)
            .map(|book| RecommendedBook::from_book(book, None, String::new()))
            .collect()
    }
}

fn resolve_anchor(snapshot: &CatalogSnapshot, anchor_id: Option<&str>) -> usize {
    let Some(anchor_id) = anchor_id else {
        return 0;
    };
    match snapshot.row_of(anchor_id) {
        Ok(row) => row,
        Err(e) => {
            tracing::warn!(error = %e, "Unknown anchor book, falling back to first catalog entry");
            0
        }
    }
}

fn scored_book(
    snapshot: &CatalogSnapshot,
    candidate: &ScoredCandidate,
    scale: DisplayScale,
) -> RecommendedBook {
    let percent = scale.percent(candidate.score);
    RecommendedBook::from_book(
        snapshot.book(candidate.row),
        Some(percent),
        match_label(percent),
    )
}
