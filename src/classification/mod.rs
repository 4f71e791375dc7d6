//! Classification adapter.
//!
//! [`LogisticRegression`] is the binary classifier the fold engine uses when
//! the target is a class tag (e.g. reviewed vs. random). Predictions are the
//! probability of class 1.
//!
//! # Example
//!
//! ```
//! use authorfold::classification::LogisticRegression;
//! use authorfold::prelude::*;
//!
//! let x = Matrix::from_vec(4, 1, vec![-2.0, -1.0, 1.0, 2.0])
//!     .expect("Matrix dimensions match data length");
//! let y = [0.0, 0.0, 1.0, 1.0];
//!
//! let model = LogisticRegression::new(10.0)
//!     .fit(&x, &y)
//!     .expect("Training data has both classes");
//! let p = model.predict(&[1.5]).expect("one feature");
//! assert!(p > 0.5);
//! ```

use crate::error::{AuthorfoldError, Result};
use crate::primitives::{dot, Matrix};
use crate::traits::{FittedModel, ModelAdapter, Task};
use serde::{Deserialize, Serialize};

/// L2-regularized logistic regression for binary classification.
///
/// Minimizes the same objective as the usual liblinear formulation,
/// scaled by `1 / (C n)`:
///
/// ```text
/// (1/n) Σ logloss(yᵢ, σ(xᵢ·w + b)) + (1 / (2 C n)) ||w||²
/// ```
///
/// `C` is the inverse regularization strength, so smaller values mean a
/// simpler model. The intercept is not penalized. Optimization is full-batch
/// gradient descent with step `1/L`, where `L` bounds the gradient's
/// Lipschitz constant, so no learning rate needs tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    c: f64,
    /// Maximum number of iterations
    max_iter: usize,
    /// Convergence tolerance on the largest gradient component
    tol: f64,
}

impl LogisticRegression {
    /// Creates a new logistic regression classifier with inverse
    /// regularization strength `c`.
    #[must_use]
    pub fn new(c: f64) -> Self {
        Self {
            c,
            max_iter: 1000,
            tol: 1e-6,
        }
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Inverse regularization strength.
    #[must_use]
    pub fn c(&self) -> f64 {
        self.c
    }

    fn validate(&self, x: &Matrix<f64>, y: &[f64]) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(AuthorfoldError::invalid_param("C", self.c, "finite and > 0"));
        }
        if self.max_iter == 0 {
            return Err(AuthorfoldError::invalid_param("max_iter", 0, ">= 1"));
        }
        if x.n_rows() != y.len() {
            return Err(AuthorfoldError::dimension_mismatch("label length", x.n_rows(), y.len()));
        }
        if y.is_empty() {
            return Err(AuthorfoldError::empty_input("logistic training set"));
        }
        if y.iter().any(|&label| label != 0.0 && label != 1.0) {
            return Err("Labels must be 0 or 1 for binary classification".into());
        }
        let positives = y.iter().filter(|&&label| label == 1.0).count();
        if positives == 0 || positives == y.len() {
            return Err("training labels contain a single class".into());
        }
        Ok(())
    }
}

/// A fitted logistic model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
    iterations: usize,
}

impl LogisticModel {
    /// Gradient steps taken before convergence (or the iteration cap).
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Sigmoid activation, evaluated without overflowing for large |z|.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl ModelAdapter for LogisticRegression {
    type Fitted = LogisticModel;

    fn fit(&self, x: &Matrix<f64>, y: &[f64]) -> Result<LogisticModel> {
        self.validate(x, y)?;

        let (n_samples, n_features) = x.shape();
        let n = n_samples as f64;
        let lambda = 1.0 / (self.c * n);

        // ||[X 1]||_F² / (4n) + λ bounds the Hessian's largest eigenvalue
        let frobenius: f64 = x.as_slice().iter().map(|v| v * v).sum::<f64>() + n;
        let step = 1.0 / (frobenius / (4.0 * n) + lambda);

        let mut coef = vec![0.0; n_features];
        let mut intercept = 0.0;
        let mut coef_grad = vec![0.0; n_features];
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            coef_grad.iter_mut().for_each(|g| *g = 0.0);
            let mut intercept_grad = 0.0;

            for (row, &label) in x.rows().zip(y) {
                let error = sigmoid(dot(row, &coef) + intercept) - label;
                intercept_grad += error;
                for (g, v) in coef_grad.iter_mut().zip(row) {
                    *g += error * v;
                }
            }

            intercept_grad /= n;
            for (g, w) in coef_grad.iter_mut().zip(&coef) {
                *g = *g / n + lambda * w;
            }

            intercept -= step * intercept_grad;
            for (w, g) in coef.iter_mut().zip(&coef_grad) {
                *w -= step * g;
            }

            let largest = coef_grad
                .iter()
                .fold(intercept_grad.abs(), |acc, g| acc.max(g.abs()));
            if largest < self.tol {
                break;
            }
        }

        Ok(LogisticModel {
            coefficients: coef,
            intercept,
            iterations,
        })
    }

    fn task(&self) -> Task {
        Task::Classification
    }

    fn regularization(&self) -> f64 {
        self.c
    }
}

impl FittedModel for LogisticModel {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(AuthorfoldError::dimension_mismatch(
                "n_features",
                self.coefficients.len(),
                row.len(),
            ));
        }
        Ok(sigmoid(dot(row, &self.coefficients) + self.intercept))
    }

    fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn intercept(&self) -> f64 {
        self.intercept
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
