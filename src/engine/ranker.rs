//! Composite scoring of candidate books against one user's context.
//!
//! Three policies share the same signals:
//! - next swipe: top-K similarity pool around an anchor book, all signals
//! - cold start: whole catalog, genre match blended with centrality
//! - explore: books outside every preferred genre, ranked by centrality alone
//!
//! Rankings sort by score descending and break ties by catalog row.

use rayon::prelude::*;
use std::collections::HashSet;

use crate::models::{ScoredCandidate, UserContext};

use super::preference::GenrePreferences;
use super::snapshot::CatalogSnapshot;

pub const CONTENT_WEIGHT: f64 = 0.40;
pub const GENRE_WEIGHT: f64 = 0.40;
pub const LIKED_AUTHOR_BOOST: f64 = 0.10;
pub const DISLIKED_AUTHOR_PENALTY: f64 = 0.15;
pub const TITLE_AFFINITY_BOOST: f64 = 0.15;
pub const TITLE_AFFINITY_PENALTY: f64 = 0.10;
pub const FRIEND_LIKED_BOOST: f64 = 0.15;
pub const FRIEND_GENRE_WEIGHT: f64 = 0.05;

pub const COLD_START_GENRE_WEIGHT: f64 = 0.7;
pub const COLD_START_CENTRALITY_WEIGHT: f64 = 0.3;

/// Liked-books view: author boost is larger than in next-swipe ranking
pub const LIKED_VIEW_AUTHOR_BOOST: f64 = 0.15;

/// Titles this short never take part in series/title matching
const MIN_TITLE_CHARS: usize = 5;

/// Authors and titles of a set of swiped books, lowercased
#[derive(Debug, Default)]
struct Affinity {
    authors: HashSet<String>,
    titles: Vec<String>,
}

impl Affinity {
    fn from_ids(snapshot: &CatalogSnapshot, ids: &[String]) -> Self {
        let mut affinity = Self::default();
        for book in ids.iter().filter_map(|id| snapshot.get(id).ok()) {
            affinity.authors.insert(book.author.to_lowercase());
            affinity.titles.push(book.title.to_lowercase());
        }
        affinity
    }

    fn has_author(&self, author: &str) -> bool {
        self.authors.contains(author)
    }

    /// Series heuristic: one title contains the other
    fn matches_title(&self, title: &str) -> bool {
        if title.chars().count() <= MIN_TITLE_CHARS {
            return false;
        }
        self.titles.iter().any(|other| {
            other.chars().count() > MIN_TITLE_CHARS
                && (other.contains(title) || title.contains(other.as_str()))
        })
    }
}

/// Ranks books of one snapshot for one user context
pub struct CandidateRanker<'a> {
    snapshot: &'a CatalogSnapshot,
    context: &'a UserContext,
    genres: GenrePreferences,
    friend_genres: GenrePreferences,
    liked: Affinity,
    disliked: Affinity,
}

impl<'a> CandidateRanker<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot, context: &'a UserContext) -> Self {
        Self {
            snapshot,
            context,
            genres: GenrePreferences::new(&context.genres),
            friend_genres: GenrePreferences::new(&context.friend_genres),
            liked: Affinity::from_ids(snapshot, &context.liked_ids),
            disliked: Affinity::from_ids(snapshot, &context.disliked_ids),
        }
    }

    /// Top-`k` neighbours of `anchor`, minus the anchor and anything already swiped
    pub fn candidate_pool(&self, anchor: usize, k: usize) -> Vec<usize> {
        self.snapshot
            .index()
            .top_k_rows(anchor, k)
            .into_iter()
            .filter(|&row| !self.is_seen(row))
            .collect()
    }

    /// Composite score of `row` relative to `anchor`
    pub fn score_candidate(&self, anchor: usize, row: usize) -> ScoredCandidate {
        let book = self.snapshot.book(row);
        let author = book.author.to_lowercase();
        let title = book.title.to_lowercase();

        let mut score = self.snapshot.index().similarity(anchor, row) as f64 * CONTENT_WEIGHT;
        score += self.genres.ratio(&book.normalized_genres) * GENRE_WEIGHT;

        if self.liked.has_author(&author) {
            score += LIKED_AUTHOR_BOOST;
        }
        if self.liked.matches_title(&title) {
            score += TITLE_AFFINITY_BOOST;
        }
        if self.disliked.has_author(&author) {
            score -= DISLIKED_AUTHOR_PENALTY;
        }
        if self.disliked.matches_title(&title) {
            score -= TITLE_AFFINITY_PENALTY;
        }

        let liked_by = match self.context.friend_likes_map.get(&book.id) {
            Some(friends) => {
                score += FRIEND_LIKED_BOOST;
                friends.clone()
            }
            None => Vec::new(),
        };

        score += self.friend_genres.ratio(&book.normalized_genres) * FRIEND_GENRE_WEIGHT;

        ScoredCandidate {
            row,
            book_id: book.id.clone(),
            score,
            liked_by,
        }
    }

    /// Ranked next-swipe candidates around `anchor`; empty when nothing is left
    pub fn rank_next(&self, anchor: usize, k: usize) -> Vec<ScoredCandidate> {
        let pool = self.candidate_pool(anchor, k);
        let mut ranked: Vec<ScoredCandidate> = pool
            .par_iter()
            .map(|&row| self.score_candidate(anchor, row))
            .collect();
        sort_ranked(&mut ranked);
        ranked
    }

    /// Whole-catalog ranking for a user without swipes, by genre match and centrality
    ///
    /// Empty when the user has no genre preferences; see [`Self::first_unseen`].
    pub fn rank_cold_start(&self) -> Vec<ScoredCandidate> {
        if self.genres.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<ScoredCandidate> = (0..self.snapshot.len())
            .into_par_iter()
            .filter(|&row| !self.is_seen(row))
            .map(|row| {
                let book = self.snapshot.book(row);
                let score = self.genres.ratio(&book.normalized_genres) * COLD_START_GENRE_WEIGHT
                    + self.snapshot.centrality_at(row) as f64 * COLD_START_CENTRALITY_WEIGHT;
                self.unscored(row).with_score(score)
            })
            .collect();
        sort_ranked(&mut ranked);
        ranked
    }

    /// First catalog row the user has not swiped yet
    pub fn first_unseen(&self) -> Option<usize> {
        (0..self.snapshot.len()).find(|&row| !self.is_seen(row))
    }

    /// Up to `n` unseen books sharing no genre with the user, most central first
    pub fn rank_explore(&self, n: usize) -> Vec<ScoredCandidate> {
        let mut ranked: Vec<ScoredCandidate> = (0..self.snapshot.len())
            .filter(|&row| !self.is_seen(row))
            .filter(|&row| !self.genres.overlaps(&self.snapshot.book(row).normalized_genres))
            .map(|row| {
                self.unscored(row)
                    .with_score(self.snapshot.centrality_at(row) as f64)
            })
            .collect();
        sort_ranked(&mut ranked);
        ranked.truncate(n);
        ranked
    }

    /// Scores the user's own liked books, in like order, for the liked-books view
    ///
    /// Liked ids missing from the snapshot are skipped.
    pub fn score_liked_books(&self) -> Vec<ScoredCandidate> {
        let mut seen = HashSet::new();
        self.context
            .liked_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.snapshot.row_of(id).ok())
            .map(|row| {
                let book = self.snapshot.book(row);
                let mut score = self.snapshot.centrality_at(row) as f64 * CONTENT_WEIGHT
                    + self.genres.ratio(&book.normalized_genres) * GENRE_WEIGHT;
                if self.liked.has_author(&book.author.to_lowercase()) {
                    score += LIKED_VIEW_AUTHOR_BOOST;
                }
                if self.liked.matches_title(&book.title.to_lowercase()) {
                    score += TITLE_AFFINITY_BOOST;
                }
                self.unscored(row).with_score(score)
            })
            .collect()
    }

    fn is_seen(&self, row: usize) -> bool {
        self.context.has_seen(&self.snapshot.book(row).id)
    }

    fn unscored(&self, row: usize) -> ScoredCandidate {
        ScoredCandidate {
            row,
            book_id: self.snapshot.book(row).id.clone(),
            score: 0.0,
            liked_by: Vec::new(),
        }
    }
}

impl ScoredCandidate {
    fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }
}

fn sort_ranked(ranked: &mut [ScoredCandidate]) {
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.row.cmp(&b.row)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::SimilarityMatrix;
    use crate::models::Book;
    use chrono::Utc;

    /// a, b, c from the catalog example plus two extra books
    fn snapshot() -> CatalogSnapshot {
        let books = vec![
            Book::new("a", "The Dragon Road", "Mira Vale", "", "Fantasy", ""),
            Book::new("b", "The Dragon Road II", "Mira Vale", "", "Fantasy Adventure", ""),
            Book::new("c", "Summer Letters", "Unknown", "", "Romance", ""),
            Book::new("d", "Cold Harbor", "Ike Stone", "", "Thriller", ""),
            Book::new("e", "Deep Field", "Unknown", "", "Science", ""),
        ];
        let matrix = SimilarityMatrix::new(
            5,
            vec![
                1.0, 0.6, 0.1, 0.2, 0.3, //
                0.6, 1.0, 0.1, 0.2, 0.3, //
                0.1, 0.1, 1.0, 0.1, 0.1, //
                0.2, 0.2, 0.1, 1.0, 0.4, //
                0.3, 0.3, 0.1, 0.4, 1.0,
            ],
        )
        .unwrap();
        CatalogSnapshot::new(1, Utc::now(), books, matrix).unwrap()
    }

    fn ids(ranked: &[ScoredCandidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.book_id.as_str()).collect()
    }

    #[test]
    fn test_pool_excludes_anchor_and_history() {
        let snapshot = snapshot();
        let ctx = UserContext::new().with_history(["a", "b"]);
        let ranker = CandidateRanker::new(&snapshot, &ctx);

        let pool = ranker.candidate_pool(0, 500);
        assert!(!pool.contains(&0));
        assert!(!pool.contains(&1));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_history_example_returns_remaining_book() {
        let snapshot = snapshot();
        let small = CatalogSnapshot::new(
            1,
            Utc::now(),
            snapshot.books()[..3].to_vec(),
            SimilarityMatrix::new(3, vec![1.0, 0.6, 0.1, 0.6, 1.0, 0.1, 0.1, 0.1, 1.0]).unwrap(),
        )
        .unwrap();
        let ctx = UserContext::new().with_history(["a", "b"]);
        let ranker = CandidateRanker::new(&small, &ctx);

        assert_eq!(ids(&ranker.rank_next(0, 500)), vec!["c"]);

        let ctx = UserContext::new().with_history(["a", "b", "c"]);
        assert!(CandidateRanker::new(&small, &ctx).rank_next(0, 500).is_empty());
    }

    #[test]
    fn test_content_and_genre_weights() {
        let snapshot = snapshot();
        let ctx = UserContext::new().with_genres(["fantasy"]);
        let ranker = CandidateRanker::new(&snapshot, &ctx);

        let b = ranker.score_candidate(0, 1);
        assert!((b.score - (0.6 * CONTENT_WEIGHT + GENRE_WEIGHT)).abs() < 1e-6);

        let c = ranker.score_candidate(0, 2);
        assert!((c.score - 0.1 * CONTENT_WEIGHT).abs() < 1e-6);
    }

    #[test]
    fn test_author_and_title_affinity() {
        let snapshot = snapshot();
        let base = UserContext::new();
        let liked = UserContext::new().with_liked(["a"]);
        let disliked = UserContext::new().with_disliked(["a"]);

        let neutral = CandidateRanker::new(&snapshot, &base).score_candidate(3, 1).score;
        let boosted = CandidateRanker::new(&snapshot, &liked).score_candidate(3, 1).score;
        let penalized = CandidateRanker::new(&snapshot, &disliked).score_candidate(3, 1).score;

        assert!((boosted - neutral - (LIKED_AUTHOR_BOOST + TITLE_AFFINITY_BOOST)).abs() < 1e-6);
        assert!(
            (neutral - penalized - (DISLIKED_AUTHOR_PENALTY + TITLE_AFFINITY_PENALTY)).abs() < 1e-6
        );
    }

    #[test]
    fn test_unknown_author_is_matched_like_any_other() {
        let snapshot = snapshot();
        let neutral_ctx = UserContext::new();
        let liked_ctx = UserContext::new().with_liked(["e"]);
        let disliked_ctx = UserContext::new().with_disliked(["e"]);

        let neutral = CandidateRanker::new(&snapshot, &neutral_ctx).score_candidate(0, 2).score;
        let liked = CandidateRanker::new(&snapshot, &liked_ctx).score_candidate(0, 2).score;
        let disliked = CandidateRanker::new(&snapshot, &disliked_ctx).score_candidate(0, 2).score;

        assert!((liked - neutral - LIKED_AUTHOR_BOOST).abs() < 1e-6);
        assert!((neutral - disliked - DISLIKED_AUTHOR_PENALTY).abs() < 1e-6);
    }

    #[test]
    fn test_friend_signals_attach_liked_by() {
        let snapshot = snapshot();
        let ctx = UserContext::new()
            .with_friend_like("d", "ana")
            .with_friend_genres(["thriller"]);
        let ranker = CandidateRanker::new(&snapshot, &ctx);

        let d = ranker.score_candidate(0, 3);
        assert_eq!(d.liked_by, vec!["ana".to_string()]);
        assert!(
            (d.score - (0.2 * CONTENT_WEIGHT + FRIEND_LIKED_BOOST + FRIEND_GENRE_WEIGHT)).abs()
                < 1e-6
        );
        assert!(ranker.score_candidate(0, 2).liked_by.is_empty());
    }

    #[test]
    fn test_rank_next_is_sorted_and_deterministic() {
        let snapshot = snapshot();
        let ctx = UserContext::new()
            .with_genres(["fantasy", "thriller"])
            .with_friend_like("c", "li");

        let first = CandidateRanker::new(&snapshot, &ctx).rank_next(0, 500);
        let second = CandidateRanker::new(&snapshot, &ctx).rank_next(0, 500);

        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(first[0].book_id, "b");
    }

    #[test]
    fn test_ties_break_by_catalog_order() {
        let snapshot = snapshot();
        let ctx = UserContext::new();
        // every other book is 0.1 from c
        let ranked = CandidateRanker::new(&snapshot, &ctx).rank_next(2, 500);
        assert_eq!(ids(&ranked), vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn test_cold_start_prefers_genre_match() {
        let snapshot = snapshot();
        let ctx = UserContext::new().with_genres(["romance"]);
        let ranked = CandidateRanker::new(&snapshot, &ctx).rank_cold_start();

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].book_id, "c");
    }

    #[test]
    fn test_cold_start_without_genres_falls_back() {
        let snapshot = snapshot();
        let ctx = UserContext::new().with_history(["a"]);
        let ranker = CandidateRanker::new(&snapshot, &ctx);

        assert!(ranker.rank_cold_start().is_empty());
        assert_eq!(ranker.first_unseen(), Some(1));
    }

    #[test]
    fn test_explore_excludes_user_genres() {
        let snapshot = snapshot();
        let ctx = UserContext::new().with_genres(["Romance", "fantasy"]);
        let ranked = CandidateRanker::new(&snapshot, &ctx).rank_explore(3);

        assert_eq!(ids(&ranked), vec!["e", "d"]);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_explore_limits_results() {
        let snapshot = snapshot();
        let ctx = UserContext::new();
        assert_eq!(CandidateRanker::new(&snapshot, &ctx).rank_explore(3).len(), 3);
    }

    #[test]
    fn test_liked_books_skip_unknown_ids() {
        let snapshot = snapshot();
        let ctx = UserContext::new().with_liked(["b", "missing", "b", "c"]);
        let scored = CandidateRanker::new(&snapshot, &ctx).score_liked_books();

        assert_eq!(ids(&scored), vec!["b", "c"]);
        // own author and own title always match
        let expected = snapshot.centrality_at(1) as f64 * CONTENT_WEIGHT
            + LIKED_VIEW_AUTHOR_BOOST
            + TITLE_AFFINITY_BOOST;
        assert!((scored[0].score - expected).abs() < 1e-6);
    }
}
