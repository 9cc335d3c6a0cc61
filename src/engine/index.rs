use crate::error::AppResult;

use super::snapshot::CatalogSnapshot;

/// Read-only queries over one snapshot's similarity matrix
#[derive(Clone, Copy)]
pub struct SimilarityIndex<'a> {
    snapshot: &'a CatalogSnapshot,
}

impl<'a> SimilarityIndex<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    /// The `k` most similar book ids to `book_id`, excluding itself
    pub fn top_k(&self, book_id: &str, k: usize) -> AppResult<Vec<&'a str>> {
        let row = self.snapshot.row_of(book_id)?;
        Ok(self
            .top_k_rows(row, k)
            .into_iter()
            .map(|r| self.snapshot.book(r).id.as_str())
            .collect())
    }

    /// Rows most similar to `row`, descending by similarity, ties in catalog order
    pub fn top_k_rows(&self, row: usize, k: usize) -> Vec<usize> {
        let similarities = self.snapshot.matrix().row(row);
        let mut rows: Vec<usize> = (0..similarities.len()).filter(|&r| r != row).collect();
        rows.sort_by(|&a, &b| {
            similarities[b]
                .total_cmp(&similarities[a])
                .then(a.cmp(&b))
        });
        rows.truncate(k);
        rows
    }

    /// Mean similarity of `book_id` to every other book in the catalog
    pub fn centrality(&self, book_id: &str) -> AppResult<f32> {
        let row = self.snapshot.row_of(book_id)?;
        Ok(self.snapshot.centrality_at(row))
    }

    pub fn similarity(&self, a: usize, b: usize) -> f32 {
        self.snapshot.matrix().get(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::SimilarityMatrix;
    use crate::error::AppError;
    use crate::models::Book;
    use chrono::Utc;

    fn snapshot() -> CatalogSnapshot {
        let books = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Book::new(*id, "T", "A", "D", "G", ""))
            .collect();
        let matrix = SimilarityMatrix::new(
            4,
            vec![
                1.0, 0.3, 0.5, 0.3, //
                0.3, 1.0, 0.1, 0.0, //
                0.5, 0.1, 1.0, 0.2, //
                0.3, 0.0, 0.2, 1.0,
            ],
        )
        .unwrap();
        CatalogSnapshot::new(1, Utc::now(), books, matrix).unwrap()
    }

    #[test]
    fn test_top_k_excludes_self_and_breaks_ties_by_catalog_order() {
        let snapshot = snapshot();
        let index = snapshot.index();

        assert_eq!(index.top_k("a", 10).unwrap(), vec!["c", "b", "d"]);
        assert_eq!(index.top_k("a", 2).unwrap(), vec!["c", "b"]);
    }

    #[test]
    fn test_top_k_unknown_id() {
        let snapshot = snapshot();
        assert!(matches!(
            snapshot.index().top_k("nope", 3),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_centrality_lookup() {
        let snapshot = snapshot();
        let centrality = snapshot.index().centrality("b").unwrap();
        assert!((centrality - (0.4 / 3.0)).abs() < 1e-6);
    }
}
