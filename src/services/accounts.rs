//! User-context collaborators: where swipes, preferences and friends come from.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::UserContext,
};

/// Display name used when a friend has neither a username nor an email
pub const FALLBACK_FRIEND_NAME: &str = "Friend";

/// Source of the per-request [`UserContext`]
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Context for `user_id`; an unknown user gets an empty context
    async fn user_context(&self, user_id: &str) -> AppResult<UserContext>;
}

/// What the social signals need to know about one accepted friend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FriendProfile {
    pub username: Option<String>,
    pub email: Option<String>,
    pub genres: Vec<String>,
    pub liked_ids: Vec<String>,
}

impl FriendProfile {
    /// Username, else the local part of the email, else [`FALLBACK_FRIEND_NAME`]
    pub fn display_name(&self) -> String {
        let username = self.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if let Some(name) = username {
            return name.to_string();
        }

        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .map(str::trim)
            .filter(|local| !local.is_empty())
            .unwrap_or(FALLBACK_FRIEND_NAME)
            .to_string()
    }
}

/// Folds friend profiles into the context's friend signals
///
/// Friend genres are lowercased and deduplicated in first-seen order. Each liked
/// book maps to the friends who liked it, one entry per friend.
pub fn apply_friends(context: &mut UserContext, friends: &[FriendProfile]) {
    let mut seen_genres: HashSet<String> = context.friend_genres.iter().cloned().collect();
    let mut likes: HashMap<String, Vec<String>> = std::mem::take(&mut context.friend_likes_map);

    for friend in friends {
        for genre in &friend.genres {
            let genre = genre.trim().to_lowercase();
            if !genre.is_empty() && seen_genres.insert(genre.clone()) {
                context.friend_genres.push(genre);
            }
        }

        let name = friend.display_name();
        let liked: HashSet<&str> = friend.liked_ids.iter().map(String::as_str).collect();
        let mut liked: Vec<&str> = liked.into_iter().collect();
        liked.sort_unstable();
        for book_id in liked {
            let names = likes.entry(book_id.to_string()).or_default();
            if !names.contains(&name) {
                names.push(name.clone());
            }
        }
    }

    context.friend_likes_map = likes;
}

/// Account store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    contexts: RwLock<HashMap<String, UserContext>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored context for `user_id`
    pub fn upsert(&self, user_id: impl Into<String>, context: UserContext) {
        self.contexts.write().insert(user_id.into(), context);
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn user_context(&self, user_id: &str) -> AppResult<UserContext> {
        Ok(self.contexts.read().get(user_id).cloned().unwrap_or_default())
    }
}

/// Read-through Redis cache in front of another account store
///
/// Cached contexts may be stale for up to `ttl` seconds.
pub struct CachedAccountStore {
    inner: Arc<dyn AccountStore>,
    cache: Cache,
    ttl: u64,
}

impl CachedAccountStore {
    pub fn new(inner: Arc<dyn AccountStore>, cache: Cache, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait::async_trait]
impl AccountStore for CachedAccountStore {
    async fn user_context(&self, user_id: &str) -> AppResult<UserContext> {
        cached!(
            self.cache,
            CacheKey::UserContext(user_id.to_string()),
            self.ttl,
            async move {
                let context = self.inner.user_context(user_id).await?;
                tracing::debug!(
                    user_id = %user_id,
                    history = context.history.len(),
                    friends_likes = context.friend_likes_map.len(),
                    "User context loaded"
                );
                Ok::<_, crate::error::AppError>(context)
            }
        )
    }
}
