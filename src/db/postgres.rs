use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{RawBookRecord, UserContext},
    services::{
        accounts::{apply_friends, AccountStore, FriendProfile},
        catalog::CatalogSource,
    },
};

/// Swipe action recorded for a like
pub const LIKE_ACTION: &str = "like";
/// Swipe action recorded for a dislike
pub const DISLIKE_ACTION: &str = "dislike";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Catalog read from the `books` table
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type BookRow = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

#[async_trait::async_trait]
impl CatalogSource for PgCatalog {
    async fn fetch_catalog(&self) -> AppResult<Vec<RawBookRecord>> {
        let rows: Vec<BookRow> = sqlx::query_as(
            r#"
            SELECT id, title, author, description, genres, image_url
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(book_record).collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

fn book_record(row: BookRow) -> RawBookRecord {
    let (id, title, author, description, genres, image_url) = row;
    let mut record = RawBookRecord::new();
    for (key, value) in [
        ("id", id),
        ("title", title),
        ("author", author),
        ("description", description),
        ("genres", genres),
        ("image_url", image_url),
    ] {
        if let Some(value) = value {
            record = record.with(key, value);
        }
    }
    record
}

/// Builds user contexts from the `swipes`, `user_preferences`, `friendships`
/// and `users` tables
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ids of users with an accepted friendship in either direction
    async fn friend_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT CASE WHEN from_uid = $1 THEN to_uid ELSE from_uid END
            FROM friendships
            WHERE (from_uid = $1 OR to_uid = $1) AND status = 'accepted'
            ORDER BY 1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Profiles of `friend_ids`, loaded with one query per table
    async fn friend_profiles(&self, friend_ids: &[String]) -> AppResult<Vec<FriendProfile>> {
        if friend_ids.is_empty() {
            return Ok(Vec::new());
        }

        let users: Vec<(String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT id, username, email FROM users WHERE id = ANY($1)",
        )
        .bind(friend_ids)
        .fetch_all(&self.pool)
        .await?;

        let preferences: Vec<(String, Vec<String>)> = sqlx::query_as(
            "SELECT user_id, genres FROM user_preferences WHERE user_id = ANY($1)",
        )
        .bind(friend_ids)
        .fetch_all(&self.pool)
        .await?;

        let likes: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT user_id, book_id
            FROM swipes
            WHERE user_id = ANY($1) AND action = $2
            ORDER BY user_id, book_id
            "#,
        )
        .bind(friend_ids)
        .bind(LIKE_ACTION)
        .fetch_all(&self.pool)
        .await?;

        let mut profiles: HashMap<&str, FriendProfile> = friend_ids
            .iter()
            .map(|id| (id.as_str(), FriendProfile::default()))
            .collect();

        for (id, username, email) in users {
            if let Some(profile) = profiles.get_mut(id.as_str()) {
                profile.username = username;
                profile.email = email;
            }
        }
        for (id, genres) in preferences {
            if let Some(profile) = profiles.get_mut(id.as_str()) {
                profile.genres.extend(genres);
            }
        }
        for (id, book_id) in likes {
            if let Some(profile) = profiles.get_mut(id.as_str()) {
                profile.liked_ids.push(book_id);
            }
        }

        // keep friend order stable so friend name lists are deterministic
        Ok(friend_ids
            .iter()
            .filter_map(|id| profiles.remove(id.as_str()))
            .collect())
    }
}

#[async_trait::async_trait]
impl AccountStore for PgAccountStore {
    async fn user_context(&self, user_id: &str) -> AppResult<UserContext> {
        let swipes: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT book_id, action
            FROM swipes
            WHERE user_id = $1
            ORDER BY created_at, book_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let genres: Option<(Vec<String>,)> =
            sqlx::query_as("SELECT genres FROM user_preferences WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let mut context = UserContext::new();
        for (book_id, action) in swipes {
            match action.as_str() {
                LIKE_ACTION => context.liked_ids.push(book_id.clone()),
                DISLIKE_ACTION => context.disliked_ids.push(book_id.clone()),
                _ => {}
            }
            context.history.insert(book_id);
        }
        context.genres = genres.map(|(genres,)| genres).unwrap_or_default();

        let friend_ids = self.friend_ids(user_id).await?;
        let friends = self.friend_profiles(&friend_ids).await?;
        apply_friends(&mut context, &friends);

        Ok(context)
    }
}
