//! Immutable, versioned pairing of the book table with its similarity matrix.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::Book;

use super::index::SimilarityIndex;

/// Dense N x N row-major similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    pub fn new(size: usize, values: Vec<f32>) -> AppResult<Self> {
        if values.len() != size * size {
            return Err(AppError::Internal(format!(
                "similarity matrix of size {} needs {} values, got {}",
                size,
                size * size,
                values.len()
            )));
        }
        Ok(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// One catalog version: books and matrix, aligned row for row
///
/// Never mutated after construction. A rebuild produces a new snapshot.
#[derive(Debug)]
pub struct CatalogSnapshot {
    version: u64,
    built_at: DateTime<Utc>,
    books: Vec<Book>,
    matrix: SimilarityMatrix,
    rows_by_id: HashMap<String, usize>,
    centrality: Vec<f32>,
}

impl CatalogSnapshot {
    /// Validates alignment and derives the id lookup and centrality
    pub fn new(
        version: u64,
        built_at: DateTime<Utc>,
        books: Vec<Book>,
        matrix: SimilarityMatrix,
    ) -> AppResult<Self> {
        if books.is_empty() {
            return Err(AppError::BuildFailure(
                "snapshot must contain at least one book".to_string(),
            ));
        }
        if books.len() != matrix.size() {
            return Err(AppError::Internal(format!(
                "book table has {} rows but similarity matrix has {}",
                books.len(),
                matrix.size()
            )));
        }

        let mut rows_by_id = HashMap::with_capacity(books.len());
        for (row, book) in books.iter().enumerate() {
            if rows_by_id.insert(book.id.clone(), row).is_some() {
                return Err(AppError::Internal(format!("duplicate book id {}", book.id)));
            }
        }

        let n = books.len();
        let centrality = (0..n)
            .map(|i| {
                if n < 2 {
                    return 0.0;
                }
                let total: f64 = matrix
                    .row(i)
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, &v)| v as f64)
                    .sum();
                (total / (n - 1) as f64) as f32
            })
            .collect();

        Ok(Self {
            version,
            built_at,
            books,
            matrix,
            rows_by_id,
            centrality,
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book(&self, row: usize) -> &Book {
        &self.books[row]
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    /// Row of `book_id`, or `NotFound` if this snapshot does not know it
    pub fn row_of(&self, book_id: &str) -> AppResult<usize> {
        self.rows_by_id
            .get(book_id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("book {} not in catalog", book_id)))
    }

    pub fn get(&self, book_id: &str) -> AppResult<&Book> {
        self.row_of(book_id).map(|row| &self.books[row])
    }

    pub fn centrality_at(&self, row: usize) -> f32 {
        self.centrality[row]
    }

    /// Nearest-neighbour and centrality queries over this snapshot
    pub fn index(&self) -> SimilarityIndex<'_> {
        SimilarityIndex::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(ids: &[&str]) -> Vec<Book> {
        ids.iter()
            .map(|id| Book::new(*id, "T", "A", "D", "G", ""))
            .collect()
    }

    #[test]
    fn test_matrix_rejects_wrong_length() {
        assert!(SimilarityMatrix::new(2, vec![1.0, 0.5, 0.5]).is_err());
    }

    #[test]
    fn test_snapshot_rejects_misaligned_matrix() {
        let matrix = SimilarityMatrix::new(1, vec![1.0]).unwrap();
        let result = CatalogSnapshot::new(1, Utc::now(), books(&["a", "b"]), matrix);
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_rejects_empty_book_table() {
        let matrix = SimilarityMatrix::new(0, vec![]).unwrap();
        let result = CatalogSnapshot::new(1, Utc::now(), vec![], matrix);
        assert!(matches!(result, Err(AppError::BuildFailure(_))));
    }

    #[test]
    fn test_centrality_excludes_self() {
        let matrix = SimilarityMatrix::new(
            3,
            vec![
                1.0, 0.2, 0.4, //
                0.2, 1.0, 0.0, //
                0.4, 0.0, 1.0,
            ],
        )
        .unwrap();
        let snapshot = CatalogSnapshot::new(1, Utc::now(), books(&["a", "b", "c"]), matrix).unwrap();

        assert!((snapshot.centrality_at(0) - 0.3).abs() < 1e-6);
        assert!((snapshot.centrality_at(1) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let matrix = SimilarityMatrix::new(1, vec![1.0]).unwrap();
        let snapshot = CatalogSnapshot::new(1, Utc::now(), books(&["a"]), matrix).unwrap();

        assert_eq!(snapshot.row_of("a").unwrap(), 0);
        assert!(matches!(snapshot.row_of("zzz"), Err(AppError::NotFound(_))));
    }
}
