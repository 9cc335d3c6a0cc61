//! Whole-corpus construction of a [`CatalogSnapshot`].

use chrono::Utc;
use rayon::prelude::*;
use std::time::Instant;

use crate::error::{AppError, AppResult};
use crate::models::{Book, RawBookRecord};

use super::normalizer::normalize;
use super::snapshot::{CatalogSnapshot, SimilarityMatrix};
use super::vectorizer::{fit_transform, SparseVector};

/// Normalizes raw records and builds a snapshot tagged with `version`
///
/// Fails with `BuildFailure` when no record survives normalization.
pub fn build_snapshot(records: Vec<RawBookRecord>, version: u64) -> AppResult<CatalogSnapshot> {
    let received = records.len();
    let corpus = normalize(records);

    if corpus.dropped() > 0 {
        tracing::warn!(
            received,
            missing_id = corpus.dropped_missing_id,
            duplicate_id = corpus.dropped_duplicate_id,
            "Dropped catalog records during normalization"
        );
    }

    build_from_books(corpus.books, version)
}

/// Builds a snapshot from an already normalized book table
pub fn build_from_books(books: Vec<Book>, version: u64) -> AppResult<CatalogSnapshot> {
    if books.is_empty() {
        return Err(AppError::BuildFailure(
            "catalog contains no books with an id".to_string(),
        ));
    }

    let start = Instant::now();
    tracing::info!(books = books.len(), version, "Building similarity index");

    let soups: Vec<String> = books.iter().map(Book::soup).collect();
    let tfidf = fit_transform(&soups);
    let matrix = cosine_matrix(&tfidf.rows, tfidf.vocabulary_size)?;

    let snapshot = CatalogSnapshot::new(version, Utc::now(), books, matrix)?;

    tracing::info!(
        books = snapshot.len(),
        vocabulary = tfidf.vocabulary_size,
        version,
        elapsed_ms = start.elapsed().as_millis(),
        "Similarity index built"
    );

    Ok(snapshot)
}

/// Pairwise dot products of L2-normalized rows
///
/// Each row accumulates over an inverted index. A pair only meets on shared terms,
/// visited in term order from both sides, so `M[i][j]` and `M[j][i]` are bitwise equal.
fn cosine_matrix(rows: &[SparseVector], vocabulary_size: usize) -> AppResult<SimilarityMatrix> {
    let n = rows.len();

    let mut postings: Vec<Vec<(usize, f64)>> = vec![Vec::new(); vocabulary_size];
    for (doc, row) in rows.iter().enumerate() {
        for &(term, weight) in row {
            postings[term].push((doc, weight));
        }
    }

    let values: Vec<f32> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let mut acc = vec![0.0f64; n];
            for &(term, weight) in &rows[i] {
                for &(j, other) in &postings[term] {
                    acc[j] += weight * other;
                }
            }
            acc[i] = 1.0;
            acc.into_iter().map(|v| v.clamp(0.0, 1.0) as f32)
        })
        .collect();

    SimilarityMatrix::new(n, values)
}
