//! Turns raw catalog records into a uniform book table.

use std::collections::HashSet;

use crate::models::{Book, RawBookRecord};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown";

const ID_KEYS: &[&str] = &["id", "book_id"];
const TITLE_KEYS: &[&str] = &["title"];
const AUTHOR_KEYS: &[&str] = &["author"];
const DESCRIPTION_KEYS: &[&str] = &["description", "synopsis"];
const GENRES_KEYS: &[&str] = &["genres"];
const IMAGE_KEYS: &[&str] = &["image_url", "coverImage", "image", "coverimage"];

/// Output of [`normalize`]: the book table plus what was thrown away
#[derive(Debug, Default)]
pub struct NormalizedCorpus {
    pub books: Vec<Book>,
    /// Records without a usable id
    pub dropped_missing_id: usize,
    /// Records whose id was already taken by an earlier record
    pub dropped_duplicate_id: usize,
}

impl NormalizedCorpus {
    pub fn dropped(&self) -> usize {
        self.dropped_missing_id + self.dropped_duplicate_id
    }
}

/// Normalizes raw records, preserving their order
///
/// Missing text fields get defaults. Records without an id (or with a blank one)
/// are dropped, and so are repeats of an id already seen.
pub fn normalize<I>(records: I) -> NormalizedCorpus
where
    I: IntoIterator<Item = RawBookRecord>,
{
    let mut corpus = NormalizedCorpus::default();
    let mut seen = HashSet::new();

    for record in records {
        let id = match record.text(ID_KEYS).map(|id| id.trim().to_string()) {
            Some(id) if !id.is_empty() => id,
            _ => {
                corpus.dropped_missing_id += 1;
                continue;
            }
        };

        if !seen.insert(id.clone()) {
            tracing::warn!(book_id = %id, "Duplicate book id in catalog, keeping first occurrence");
            corpus.dropped_duplicate_id += 1;
            continue;
        }

        corpus.books.push(Book::new(
            id,
            record
                .text(TITLE_KEYS)
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            record
                .text(AUTHOR_KEYS)
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            record.text(DESCRIPTION_KEYS).unwrap_or_default(),
            record.text(GENRES_KEYS).unwrap_or_default(),
            record.text(IMAGE_KEYS).unwrap_or_default(),
        ));
    }

    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> RawBookRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let corpus = normalize(vec![record(json!({ "id": "b1" }))]);

        assert_eq!(corpus.books.len(), 1);
        let book = &corpus.books[0];
        assert_eq!(book.title, UNKNOWN_TITLE);
        assert_eq!(book.author, UNKNOWN_AUTHOR);
        assert_eq!(book.description, "");
        assert_eq!(book.genres, "");
        assert_eq!(book.image_url, "");
    }

    #[test]
    fn test_null_fields_are_treated_as_missing() {
        let corpus = normalize(vec![record(json!({
            "id": "b1",
            "title": null,
            "author": null,
            "genres": null
        }))]);

        assert_eq!(corpus.books[0].title, UNKNOWN_TITLE);
        assert_eq!(corpus.books[0].author, UNKNOWN_AUTHOR);
        assert_eq!(corpus.books[0].genres, "");
    }

    #[test]
    fn test_records_without_id_are_dropped_order_preserved() {
        let corpus = normalize(vec![
            record(json!({ "id": "a", "title": "First" })),
            record(json!({ "title": "No id" })),
            record(json!({ "id": "   ", "title": "Blank id" })),
            record(json!({ "id": "c", "title": "Third" })),
        ]);

        let ids: Vec<_> = corpus.books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(corpus.dropped_missing_id, 2);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let corpus = normalize(vec![
            record(json!({ "id": "a", "title": "Original" })),
            record(json!({ "id": "a", "title": "Copy" })),
        ]);

        assert_eq!(corpus.books.len(), 1);
        assert_eq!(corpus.books[0].title, "Original");
        assert_eq!(corpus.dropped(), 1);
    }

    #[test]
    fn test_upstream_aliases_are_accepted() {
        let corpus = normalize(vec![record(json!({
            "book_id": 9780140449136u64,
            "synopsis": "A young man in St. Petersburg",
            "coverImage": "cover.jpg",
            "genres": ["Classics", "Fiction"]
        }))]);

        let book = &corpus.books[0];
        assert_eq!(book.id, "9780140449136");
        assert_eq!(book.description, "A young man in St. Petersburg");
        assert_eq!(book.image_url, "cover.jpg");
        assert_eq!(book.genres, "Classics, Fiction");
        assert_eq!(book.normalized_genres, "classics, fiction");
    }
}
