use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Per-request view of a user's behaviour, preferences and social signals
///
/// Assembled by the account store; the engine only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserContext {
    /// Every book id the user has already swiped, in either direction
    pub history: HashSet<String>,
    pub liked_ids: Vec<String>,
    pub disliked_ids: Vec<String>,
    /// Preferred genres in the order the user picked them
    pub genres: Vec<String>,
    /// Genres aggregated across the user's friends
    pub friend_genres: Vec<String>,
    /// Book id -> display names of friends who liked it
    pub friend_likes_map: HashMap<String, Vec<String>>,
}

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.history = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_liked<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.liked_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_disliked<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disliked_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_friend_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.friend_genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_friend_like(mut self, book_id: &str, friend: &str) -> Self {
        self.friend_likes_map
            .entry(book_id.to_string())
            .or_default()
            .push(friend.to_string());
        self
    }

    pub fn has_seen(&self, book_id: &str) -> bool {
        self.history.contains(book_id)
    }
}
