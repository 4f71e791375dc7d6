//! Per-fold feature standardization.
//!
//! Every fold computes its own centering and scaling statistics from its
//! training rows alone, then applies them to the held-out row. Statistics
//! are plain values returned to the caller; nothing is cached between folds.
//!
//! # Example
//!
//! ```
//! use authorfold::prelude::*;
//! use authorfold::preprocessing::FoldNormalizer;
//!
//! let train = Matrix::from_vec(3, 2, vec![
//!     0.0, 5.0,
//!     1.0, 5.0,
//!     2.0, 5.0,
//! ]).expect("valid matrix dimensions");
//!
//! let normalizer = FoldNormalizer::new(1e-6);
//! let (scaled, stats) = normalizer.fit_transform(train).expect("non-empty fold");
//!
//! // Second column has zero variance: it becomes zeros, not NaN
//! assert_eq!(scaled.column(1), vec![0.0, 0.0, 0.0]);
//! let test = stats.transform_row(&[1.0, 7.0]).expect("same width");
//! assert!(test[0].abs() < 1e-12);
//! ```

use crate::error::{AuthorfoldError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};

/// Standardizes fold features by removing the mean and dividing by a scale.
///
/// The standard score of a value x is: z = (x - mean) / scale, where scale
/// is the population standard deviation of the training column, floored at
/// `min_scale`. When a covariate column is present (always the last column)
/// its scale is the fixed `covariate_scale` instead, so a feature kept on a
/// near-raw scale is not compressed to unit variance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FoldNormalizer {
    /// Smallest scale any column may get; zero-variance columns use this.
    min_scale: f64,
    /// Fixed scale for a trailing covariate column, when there is one.
    covariate_scale: Option<f64>,
}

impl FoldNormalizer {
    /// Creates a normalizer with the given zero-variance floor and no
    /// covariate column.
    #[must_use]
    pub fn new(min_scale: f64) -> Self {
        Self {
            min_scale,
            covariate_scale: None,
        }
    }

    /// Treats the last column as a covariate scaled by `scale`.
    #[must_use]
    pub fn with_covariate_scale(mut self, scale: f64) -> Self {
        self.covariate_scale = Some(scale);
        self
    }

    /// Returns the zero-variance floor.
    #[must_use]
    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    /// Returns the covariate scale, if a covariate column is expected.
    #[must_use]
    pub fn covariate_scale(&self) -> Option<f64> {
        self.covariate_scale
    }

    /// Computes per-column mean and scale from training rows only.
    ///
    /// # Errors
    ///
    /// Returns an error if the training matrix has no rows, a configured
    /// scale is not positive, or a covariate is expected on a matrix with
    /// no columns.
    pub fn fit(&self, train: &Matrix<f64>) -> Result<FoldStatistics> {
        if !(self.min_scale > 0.0 && self.min_scale.is_finite()) {
            return Err(AuthorfoldError::invalid_param(
                "min_scale",
                self.min_scale,
                "finite and > 0",
            ));
        }
        if let Some(scale) = self.covariate_scale {
            if !(scale > 0.0 && scale.is_finite()) {
                return Err(AuthorfoldError::invalid_param(
                    "covariate_scale",
                    scale,
                    "finite and > 0",
                ));
            }
        }

        let (n_samples, n_features) = train.shape();
        if n_samples == 0 {
            return Err(AuthorfoldError::empty_input("fold training rows"));
        }
        if self.covariate_scale.is_some() && n_features == 0 {
            return Err(AuthorfoldError::dimension_mismatch("covariate column", 1, 0));
        }

        let n = n_samples as f64;
        let mut means = vec![0.0; n_features];
        for row in train.rows() {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut sum_sq = vec![0.0; n_features];
        for row in train.rows() {
            for ((s, v), m) in sum_sq.iter_mut().zip(row).zip(&means) {
                let diff = v - m;
                *s += diff * diff;
            }
        }

        // Population std (divide by n), floored
        let mut scales: Vec<f64> = sum_sq
            .iter()
            .map(|s| (s / n).sqrt().max(self.min_scale))
            .collect();

        if let (Some(scale), Some(last)) = (self.covariate_scale, scales.last_mut()) {
            *last = scale;
        }

        Ok(FoldStatistics { means, scales })
    }

    /// Fits on `train` and standardizes it in place.
    ///
    /// Takes the training matrix by value: the caller hands over its private
    /// fold copy and gets it back normalized.
    ///
    /// # Errors
    ///
    /// Same as [`FoldNormalizer::fit`].
    pub fn fit_transform(&self, mut train: Matrix<f64>) -> Result<(Matrix<f64>, FoldStatistics)> {
        let stats = self.fit(&train)?;
        stats.transform_in_place(&mut train)?;
        Ok((train, stats))
    }
}

/// Per-column mean and scale computed from one fold's training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldStatistics {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl FoldStatistics {
    /// Column means.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Column scales (never zero).
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Standardizes one row, returning a new vector.
    ///
    /// # Errors
    ///
    /// Returns an error on width mismatch.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.means.len() {
            return Err(AuthorfoldError::dimension_mismatch(
                "n_features",
                self.means.len(),
                row.len(),
            ));
        }
        Ok(row
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, m), s)| (v - m) / s)
            .collect())
    }

    /// Standardizes every row of `x` in place.
    ///
    /// # Errors
    ///
    /// Returns an error on width mismatch.
    pub fn transform_in_place(&self, x: &mut Matrix<f64>) -> Result<()> {
        if x.n_cols() != self.means.len() {
            return Err(AuthorfoldError::dimension_mismatch(
                "n_features",
                self.means.len(),
                x.n_cols(),
            ));
        }
        for i in 0..x.n_rows() {
            for ((v, m), s) in x.row_mut(i).iter_mut().zip(&self.means).zip(&self.scales) {
                *v = (*v - m) / s;
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests_normalization_contract;
