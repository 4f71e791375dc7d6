//! Core traits for the model adapters the fold engine drives.
//!
//! The engine never knows which statistical method it is evaluating. It only
//! needs something that turns a normalized training fold into a fitted model
//! and a fitted model that scores one held-out row.

use crate::error::Result;
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};

/// What kind of target a model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Binary labels in {0, 1}; predictions are P(label = 1).
    Classification,
    /// Continuous targets; predictions are point estimates.
    Regression,
}

/// Fit capability for one model family at one regularization strength.
///
/// `fit` takes `&self` and returns a new fitted value, so every fold gets a
/// fresh model and nothing learned in one fold can reach another.
///
/// # Examples
///
/// ```
/// use authorfold::linear_model::Ridge;
/// use authorfold::prelude::*;
///
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = [3.0, 5.0, 7.0, 9.0];
///
/// let adapter = Ridge::new(1e-6);
/// let fitted = adapter.fit(&x, &y).unwrap();
/// let pred = fitted.predict(&[5.0]).unwrap();
/// assert!((pred - 11.0).abs() < 1e-3);
/// ```
pub trait ModelAdapter: Send + Sync {
    /// Model produced by [`ModelAdapter::fit`].
    type Fitted: FittedModel;

    /// Fits a fresh model to a training fold.
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions mismatch, the fold is empty, or the
    /// labels are unusable for this task.
    fn fit(&self, x: &Matrix<f64>, y: &[f64]) -> Result<Self::Fitted>;

    /// Task this adapter solves.
    fn task(&self) -> Task;

    /// The single regularization strength this adapter was built with.
    fn regularization(&self) -> f64;
}

/// A model fitted on one training fold.
pub trait FittedModel: Send {
    /// Predicts the value for one (already normalized) feature row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row width differs from the training width.
    fn predict(&self, row: &[f64]) -> Result<f64>;

    /// Learned per-feature coefficients, in column order.
    fn coefficients(&self) -> &[f64];

    /// Learned intercept.
    fn intercept(&self) -> f64;
}
