//! Document feature vectors.
//!
//! A document's vector holds its raw count of each vocabulary term divided
//! by `total_words + ε`. An optional covariate (typically a shifted
//! publication date) is appended last and is not divided by length.

use crate::error::{AuthorfoldError, Result};
use crate::primitives::Matrix;
use crate::vocabulary::{TermCounts, Vocabulary};
use serde::{Deserialize, Serialize};

/// Shifts a raw covariate value so that `origin` maps to zero, clamping
/// anything earlier to zero.
#[must_use]
pub fn shifted_covariate(value: f64, origin: f64) -> f64 {
    (value - origin).max(0.0)
}

/// One document as the builder sees it.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSource<'a> {
    /// Raw term counts
    pub counts: &'a TermCounts,
    /// Total words in the document, including terms outside the vocabulary
    pub total_words: u64,
    /// Covariate value, required when the builder appends one
    pub covariate: Option<f64>,
}

/// Converts documents into rows against a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct FeatureBuilder<'v> {
    vocabulary: &'v Vocabulary,
    length_epsilon: f64,
    with_covariate: bool,
}

impl<'v> FeatureBuilder<'v> {
    /// Creates a builder with length-normalization constant `length_epsilon`.
    #[must_use]
    pub fn new(vocabulary: &'v Vocabulary, length_epsilon: f64) -> Self {
        Self {
            vocabulary,
            length_epsilon,
            with_covariate: false,
        }
    }

    /// Appends a trailing covariate column to every row.
    #[must_use]
    pub fn with_covariate(mut self) -> Self {
        self.with_covariate = true;
        self
    }

    /// Row width: vocabulary size, plus one with a covariate.
    #[must_use]
    pub fn width(&self) -> usize {
        self.vocabulary.len() + usize::from(self.with_covariate)
    }

    /// Builds one document's feature vector.
    ///
    /// # Errors
    ///
    /// Returns an error if `length_epsilon` is not positive, or if the
    /// covariate is missing (or non-finite) while the builder expects one.
    pub fn vector(&self, source: &FeatureSource<'_>) -> Result<Vec<f64>> {
        if !(self.length_epsilon > 0.0 && self.length_epsilon.is_finite()) {
            return Err(AuthorfoldError::invalid_param(
                "length_epsilon",
                self.length_epsilon,
                "finite and > 0",
            ));
        }

        let mut row = vec![0.0; self.width()];
        for (term, &count) in source.counts {
            if let Some(col) = self.vocabulary.position(term) {
                row[col] = count as f64;
            }
        }

        let denominator = source.total_words as f64 + self.length_epsilon;
        for v in &mut row[..self.vocabulary.len()] {
            *v /= denominator;
        }

        if self.with_covariate {
            match source.covariate {
                Some(value) if value.is_finite() => row[self.vocabulary.len()] = value,
                Some(value) => {
                    return Err(AuthorfoldError::invalid_param("covariate", value, "finite"))
                }
                None => return Err("covariate column requested but value missing".into()),
            }
        }
        Ok(row)
    }

    /// Builds the full matrix, one row per source in input order.
    ///
    /// # Errors
    ///
    /// Same as [`FeatureBuilder::vector`].
    pub fn matrix(&self, sources: &[FeatureSource<'_>]) -> Result<FeatureMatrix> {
        let width = self.width();
        let mut data = Vec::with_capacity(sources.len() * width);
        for source in sources {
            data.extend(self.vector(source)?);
        }
        Ok(FeatureMatrix {
            matrix: Matrix::from_vec(sources.len(), width, data)?,
            has_covariate: self.with_covariate,
        })
    }
}

/// Feature rows for every document, plus whether the last column is a
/// covariate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    matrix: Matrix<f64>,
    has_covariate: bool,
}

impl FeatureMatrix {
    /// Wraps an existing matrix.
    #[must_use]
    pub fn new(matrix: Matrix<f64>, has_covariate: bool) -> Self {
        Self {
            matrix,
            has_covariate,
        }
    }

    /// Underlying matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix<f64> {
        &self.matrix
    }

    /// True when the last column is a covariate.
    #[must_use]
    pub fn has_covariate(&self) -> bool {
        self.has_covariate
    }

    /// Number of documents.
    #[must_use]
    pub fn n_documents(&self) -> usize {
        self.matrix.n_rows()
    }

    /// Number of term columns, excluding any covariate.
    #[must_use]
    pub fn n_terms(&self) -> usize {
        self.matrix.n_cols() - usize::from(self.has_covariate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::new(vec!["sea".into(), "ship".into(), "whale".into()]).expect("distinct")
    }

    fn counts(pairs: &[(&str, u64)]) -> TermCounts {
        pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    #[test]
    fn test_counts_divided_by_length() {
        let vocab = vocab();
        let doc = counts(&[("whale", 3), ("sea", 1), ("the", 6)]);
        let row = FeatureBuilder::new(&vocab, 1e-3)
            .vector(&FeatureSource {
                counts: &doc,
                total_words: 10,
                covariate: None,
            })
            .expect("valid");
        let d = 10.0 + 1e-3;
        assert_eq!(row.len(), 3);
        assert!((row[0] - 1.0 / d).abs() < 1e-15);
        assert_eq!(row[1], 0.0);
        assert!((row[2] - 3.0 / d).abs() < 1e-15);
    }

    #[test]
    fn test_empty_document_gives_zeros() {
        let vocab = vocab();
        let empty = TermCounts::new();
        let row = FeatureBuilder::new(&vocab, 1e-4)
            .with_covariate()
            .vector(&FeatureSource {
                counts: &empty,
                total_words: 0,
                covariate: Some(42.0),
            })
            .expect("no division error");
        assert_eq!(row, vec![0.0, 0.0, 0.0, 42.0]);
    }

    #[test]
    fn test_covariate_not_length_scaled() {
        let vocab = vocab();
        let doc = counts(&[("ship", 5)]);
        let row = FeatureBuilder::new(&vocab, 1e-3)
            .with_covariate()
            .vector(&FeatureSource {
                counts: &doc,
                total_words: 5,
                covariate: Some(shifted_covariate(1850.0, 1700.0)),
            })
            .expect("valid");
        assert_eq!(row[3], 150.0);
    }

    #[test]
    fn test_missing_covariate_rejected() {
        let vocab = vocab();
        let doc = TermCounts::new();
        let builder = FeatureBuilder::new(&vocab, 1e-3).with_covariate();
        let source = FeatureSource {
            counts: &doc,
            total_words: 1,
            covariate: None,
        };
        assert!(builder.vector(&source).is_err());
    }

    #[test]
    fn test_shifted_covariate_clamps() {
        assert_eq!(shifted_covariate(1690.0, 1700.0), 0.0);
        assert_eq!(shifted_covariate(1701.0, 1700.0), 1.0);
    }

    #[test]
    fn test_matrix_shape() {
        let vocab = vocab();
        let a = counts(&[("sea", 2)]);
        let b = counts(&[("ship", 1)]);
        let sources = [
            FeatureSource {
                counts: &a,
                total_words: 2,
                covariate: Some(1.0),
            },
            FeatureSource {
                counts: &b,
                total_words: 4,
                covariate: Some(2.0),
            },
        ];
        let features = FeatureBuilder::new(&vocab, 1e-3)
            .with_covariate()
            .matrix(&sources)
            .expect("valid");
        assert_eq!(features.matrix().shape(), (2, 4));
        assert_eq!(features.n_documents(), 2);
        assert_eq!(features.n_terms(), 3);
        assert!(features.has_covariate());
        assert_eq!(features.matrix().get(1, 3), 2.0);
    }

    #[test]
    fn test_bad_epsilon_rejected() {
        let vocab = vocab();
        let doc = TermCounts::new();
        let source = FeatureSource {
            counts: &doc,
            total_words: 0,
            covariate: None,
        };
        assert!(FeatureBuilder::new(&vocab, 0.0).vector(&source).is_err());
    }
}
