//! Genre overlap between a book and a list of preferred genres.
//!
//! Matching is case-insensitive substring containment in the book's genre text,
//! so "sci" matches "science fiction" and "fiction" matches "non-fiction".

/// Fraction of `user_genres` contained in `book_genres`, in [0, 1]
///
/// Zero when either side is empty.
pub fn genre_match_ratio(book_genres: &str, user_genres: &[String]) -> f64 {
    GenrePreferences::new(user_genres).ratio(&book_genres.to_lowercase())
}

/// A genre list lowercased once, for scoring many books against it
#[derive(Debug, Clone, Default)]
pub struct GenrePreferences {
    genres: Vec<String>,
}

impl GenrePreferences {
    /// Blank entries are ignored
    pub fn new(genres: &[String]) -> Self {
        Self {
            genres: genres
                .iter()
                .filter(|g| !g.trim().is_empty())
                .map(|g| g.to_lowercase())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    /// `normalized_genres` must already be lowercase (see `Book::normalized_genres`)
    pub fn ratio(&self, normalized_genres: &str) -> f64 {
        if self.genres.is_empty() || normalized_genres.is_empty() {
            return 0.0;
        }
        self.matches(normalized_genres) as f64 / self.genres.len() as f64
    }

    /// True if any preferred genre appears in the book's genre text
    pub fn overlaps(&self, normalized_genres: &str) -> bool {
        self.genres
            .iter()
            .any(|genre| normalized_genres.contains(genre.as_str()))
    }

    fn matches(&self, normalized_genres: &str) -> usize {
        self.genres
            .iter()
            .filter(|genre| normalized_genres.contains(genre.as_str()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_catalog_example() {
        let user = genres(&["fantasy"]);
        assert_eq!(genre_match_ratio("Fantasy", &user), 1.0);
        assert_eq!(genre_match_ratio("Fantasy Adventure", &user), 1.0);
        assert_eq!(genre_match_ratio("Romance", &user), 0.0);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(genre_match_ratio("", &genres(&["fantasy"])), 0.0);
        assert_eq!(genre_match_ratio("Fantasy", &[]), 0.0);
        assert_eq!(genre_match_ratio("Fantasy", &genres(&["  "])), 0.0);
    }

    #[test]
    fn test_ratio_increases_with_more_matches() {
        let user = genres(&["Fantasy", "Romance", "Horror", "Mystery"]);
        let one = genre_match_ratio("fantasy", &user);
        let two = genre_match_ratio("fantasy, romance", &user);
        let three = genre_match_ratio("fantasy, romance, horror", &user);

        assert_eq!(one, 0.25);
        assert!(one < two && two < three);
        assert!(three <= 1.0);
    }

    #[test]
    fn test_substring_matching_is_loose() {
        assert_eq!(genre_match_ratio("Non-Fiction", &genres(&["fiction"])), 1.0);
    }

    #[test]
    fn test_overlaps() {
        let prefs = GenrePreferences::new(&genres(&["Romance"]));
        assert!(prefs.overlaps("historical romance"));
        assert!(!prefs.overlaps("thriller"));
        assert!(!GenrePreferences::default().overlaps("thriller"));
    }

    #[test]
    fn test_blank_genres_neither_count_nor_overlap() {
        let prefs = GenrePreferences::new(&genres(&["Fantasy", ""]));
        assert_eq!(prefs.ratio("fantasy"), 1.0);
        assert!(!prefs.overlaps("thriller"));
    }
}
