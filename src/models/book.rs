use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog entry after normalization
///
/// Books are immutable once they are part of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// Stable catalog identifier (ISBN in the upstream store)
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Free-text genres, comma or space separated
    pub genres: String,
    pub image_url: String,
    /// Lowercased `genres`, computed once when the book is created
    pub normalized_genres: String,
}

impl Book {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        description: impl Into<String>,
        genres: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        let genres = genres.into();
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            description: description.into(),
            normalized_genres: genres.to_lowercase(),
            genres,
            image_url: image_url.into(),
        }
    }

    /// Text unit vectorized for this book: title, description and genres
    pub fn soup(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.genres)
    }
}

/// A raw catalog record as handed over by the catalog store
///
/// Any field may be missing, null, or of an unexpected JSON type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawBookRecord(pub Map<String, Value>);

impl RawBookRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, consuming and returning the record
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Returns the first non-null value among `keys` rendered as text
    ///
    /// Numbers and booleans are stringified, arrays are joined with `", "`.
    /// Objects are not representable and count as missing.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(value_as_text)
    }
}

impl From<Map<String, Value>> for RawBookRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_as_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_book_normalizes_genres() {
        let book = Book::new("1", "Dune", "Frank Herbert", "Spice", "Science Fiction, Classics", "");
        assert_eq!(book.normalized_genres, "science fiction, classics");
        assert_eq!(book.genres, "Science Fiction, Classics");
    }

    #[test]
    fn test_soup_concatenates_title_description_genres() {
        let book = Book::new("1", "Dune", "Frank Herbert", "Desert planet", "Sci-Fi", "");
        assert_eq!(book.soup(), "Dune Desert planet Sci-Fi");
    }

    #[test]
    fn test_raw_record_text_uses_first_present_alias() {
        let record: RawBookRecord = serde_json::from_value(json!({
            "book_id": 9780441013593u64,
            "synopsis": null,
            "description": "Paul Atreides",
            "genres": ["Fantasy", "Adventure"],
            "meta": { "nested": true }
        }))
        .unwrap();

        assert_eq!(record.text(&["id", "book_id"]), Some("9780441013593".to_string()));
        assert_eq!(
            record.text(&["synopsis", "description"]),
            Some("Paul Atreides".to_string())
        );
        assert_eq!(record.text(&["genres"]), Some("Fantasy, Adventure".to_string()));
        assert_eq!(record.text(&["meta"]), None);
        assert_eq!(record.text(&["missing"]), None);
    }
}
