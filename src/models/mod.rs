mod book;
mod recommendation;
mod user_context;

pub use book::{Book, RawBookRecord};
pub use recommendation::{Recommendation, RecommendedBook, ScoredCandidate, DONE_ID};
pub use user_context::UserContext;
