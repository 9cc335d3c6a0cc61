//! TF-IDF vectorization of book soups.
//!
//! Tokens are runs of two or more word characters, lowercased, with English stop
//! words removed. Weights use raw term counts times a smoothed idf,
//! `ln((1 + n) / (1 + df)) + 1`, and every document vector is L2-normalized.

use std::collections::{BTreeMap, BTreeSet};

use super::stopwords::is_stop_word;

/// Sparse document vector: `(term index, weight)` pairs sorted by term index
pub type SparseVector = Vec<(usize, f64)>;

/// Result of fitting the vectorizer over a corpus
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    pub rows: Vec<SparseVector>,
    pub vocabulary_size: usize,
}

/// Splits text into lowercase tokens, dropping stop words and single characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2 && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Fits vocabulary and idf over `documents` and returns their normalized vectors
///
/// The vocabulary is ordered alphabetically so the output only depends on the input.
pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> TfidfMatrix {
    let counts: Vec<BTreeMap<String, usize>> = documents
        .iter()
        .map(|doc| {
            let mut terms = BTreeMap::new();
            for token in tokenize(doc.as_ref()) {
                *terms.entry(token).or_insert(0) += 1;
            }
            terms
        })
        .collect();

    let vocabulary: BTreeMap<&str, usize> = counts
        .iter()
        .flat_map(|terms| terms.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(index, term)| (term, index))
        .collect();

    let mut document_frequency = vec![0usize; vocabulary.len()];
    for terms in &counts {
        for term in terms.keys() {
            document_frequency[vocabulary[term.as_str()]] += 1;
        }
    }

    let n = documents.len() as f64;
    let idf: Vec<f64> = document_frequency
        .iter()
        .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    let rows = counts
        .iter()
        .map(|terms| {
            // BTreeMap iteration is alphabetical, matching vocabulary order
            let mut row: SparseVector = terms
                .iter()
                .map(|(term, &count)| {
                    let index = vocabulary[term.as_str()];
                    (index, count as f64 * idf[index])
                })
                .collect();
            l2_normalize(&mut row);
            row
        })
        .collect();

    TfidfMatrix {
        rows,
        vocabulary_size: vocabulary.len(),
    }
}

fn l2_normalize(row: &mut SparseVector) {
    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, weight) in row.iter_mut() {
            *weight /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_filters() {
        let tokens = tokenize("The Hobbit: a Sci-Fi? No, Fantasy! x 42");
        assert_eq!(tokens, vec!["hobbit", "sci", "fi", "fantasy", "42"]);
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let matrix = fit_transform(&["dragons and wizards", "wizards of the coast", "space opera"]);

        assert_eq!(matrix.rows.len(), 3);
        for row in &matrix.rows {
            let norm: f64 = row.iter().map(|(_, w)| w * w).sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let matrix = fit_transform(&["wizard dragon", "wizard castle", "wizard tower"]);
        let row = &matrix.rows[0];
        // vocabulary: castle, dragon, tower, wizard
        let dragon = row.iter().find(|(i, _)| *i == 1).unwrap().1;
        let wizard = row.iter().find(|(i, _)| *i == 3).unwrap().1;
        assert!(dragon > wizard);
    }

    #[test]
    fn test_stop_word_only_document_is_zero_vector() {
        let matrix = fit_transform(&["the and of", "dragon"]);
        assert!(matrix.rows[0].is_empty());
        assert_eq!(matrix.vocabulary_size, 1);
    }
}
