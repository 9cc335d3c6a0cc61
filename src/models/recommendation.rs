use serde::{Serialize, Serializer};

use super::Book;

/// Book id reported when no candidate is left
pub const DONE_ID: &str = "DONE";

/// One ranked candidate, alive only for the duration of a ranking call
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// Row of the book in the snapshot
    pub row: usize,
    pub book_id: String,
    pub score: f64,
    /// Friends who liked the book, attached by the friend-liked signal
    pub liked_by: Vec<String>,
}

/// External response shape for one recommended book
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedBook {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub image_url: String,
    /// Display percentage in [0, 100]; absent when no score was computed
    pub score: Option<f64>,
    /// Human-readable score, e.g. "72.5% Match" or "Start Swiping"
    pub score_label: String,
    pub liked_by: Vec<String>,
}

impl RecommendedBook {
    pub fn from_book(book: &Book, score: Option<f64>, score_label: String) -> Self {
        Self {
            book_id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            image_url: book.image_url.clone(),
            score,
            score_label,
            liked_by: Vec::new(),
        }
    }

    pub fn with_liked_by(mut self, liked_by: Vec<String>) -> Self {
        self.liked_by = liked_by;
        self
    }

    fn done() -> Self {
        Self {
            book_id: DONE_ID.to_string(),
            title: "No More Recommendations!".to_string(),
            author: String::new(),
            description: "You have swiped all related books.".to_string(),
            image_url: String::new(),
            score: Some(0.0),
            score_label: String::new(),
            liked_by: Vec::new(),
        }
    }
}

/// Result of a single-pick recommendation
///
/// `Done` is the normal end-of-catalog state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Book(RecommendedBook),
    Done,
}

impl Recommendation {
    pub fn is_done(&self) -> bool {
        matches!(self, Recommendation::Done)
    }

    pub fn book(&self) -> Option<&RecommendedBook> {
        match self {
            Recommendation::Book(book) => Some(book),
            Recommendation::Done => None,
        }
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Recommendation::Book(book) => book.serialize(serializer),
            Recommendation::Done => RecommendedBook::done().serialize(serializer),
        }
    }
}
