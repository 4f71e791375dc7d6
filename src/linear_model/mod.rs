//! Linear regression adapter.
//!
//! [`Ridge`] is the regression model the fold engine uses for continuous
//! targets such as publication date.

use crate::error::{AuthorfoldError, Result};
use crate::primitives::{dot, Matrix};
use crate::traits::{FittedModel, ModelAdapter, Task};
use serde::{Deserialize, Serialize};

/// Ridge regression with L2 regularization.
///
/// Fits a linear model with an L2 penalty on coefficient magnitudes:
///
/// ```text
/// minimize ||y - Xβ - b||² + α||β||²
/// ```
///
/// The intercept `b` is not penalized. It is handled by centering `X` and
/// `y` on their training means before solving.
///
/// # Solver
///
/// Text features usually outnumber documents, so the solve picks whichever
/// system is smaller:
///
/// - primal, `p <= n`: `(XᵀX + αI) β = Xᵀy`
/// - dual, `p > n`: `(XXᵀ + αI) a = y`, then `β = Xᵀa`
///
/// Both are symmetric positive definite for `α > 0` and go through
/// Cholesky.
///
/// # Examples
///
/// ```
/// use authorfold::prelude::*;
/// use authorfold::linear_model::Ridge;
///
/// let x = Matrix::from_vec(5, 2, vec![
///     1.0, 2.0,
///     2.0, 3.0,
///     3.0, 5.0,
///     4.0, 4.0,
///     5.0, 6.0,
/// ]).expect("Valid matrix dimensions");
/// let y = [5.0, 8.0, 13.0, 12.0, 17.0];
///
/// let model = Ridge::new(0.01).fit(&x, &y).expect("Fit should succeed with valid data");
/// assert_eq!(model.coefficients().len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ridge {
    /// Regularization strength (alpha).
    alpha: f64,
}

impl Ridge {
    /// Creates a new Ridge adapter with the given regularization strength.
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Returns the regularization strength.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// A fitted ridge model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl ModelAdapter for Ridge {
    type Fitted = RidgeModel;

    fn fit(&self, x: &Matrix<f64>, y: &[f64]) -> Result<RidgeModel> {
        let (n_samples, n_features) = x.shape();

        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(AuthorfoldError::invalid_param("alpha", self.alpha, "finite and > 0"));
        }
        if n_samples != y.len() {
            return Err(AuthorfoldError::dimension_mismatch("target length", n_samples, y.len()));
        }
        if n_samples == 0 {
            return Err(AuthorfoldError::empty_input("ridge training set"));
        }

        let (xc, x_mean) = center_columns(x)?;
        let y_mean = y.iter().sum::<f64>() / n_samples as f64;
        let yc: Vec<f64> = y.iter().map(|v| v - y_mean).collect();

        let xt = xc.transpose();
        let coefficients = if n_features <= n_samples {
            let mut xtx = xt.matmul(&xc)?;
            add_to_diagonal(&mut xtx, self.alpha);
            let xty = xt.matvec(&yc)?;
            xtx.cholesky_solve(&xty)?
        } else {
            let mut gram = xc.matmul(&xt)?;
            add_to_diagonal(&mut gram, self.alpha);
            let dual = gram.cholesky_solve(&yc)?;
            xt.matvec(&dual)?
        };

        let intercept = y_mean - dot(&x_mean, &coefficients);

        Ok(RidgeModel {
            coefficients,
            intercept,
        })
    }

    fn task(&self) -> Task {
        Task::Regression
    }

    fn regularization(&self) -> f64 {
        self.alpha
    }
}

impl FittedModel for RidgeModel {
    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(AuthorfoldError::dimension_mismatch(
                "n_features",
                self.coefficients.len(),
                row.len(),
            ));
        }
        Ok(dot(row, &self.coefficients) + self.intercept)
    }

    fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Subtracts each column's mean, returning the centered copy and the means.
fn center_columns(x: &Matrix<f64>) -> Result<(Matrix<f64>, Vec<f64>)> {
    let (n_samples, n_features) = x.shape();
    let mut means = vec![0.0; n_features];
    for row in x.rows() {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= n_samples as f64;
    }

    let mut data = Vec::with_capacity(n_samples * n_features);
    for row in x.rows() {
        data.extend(row.iter().zip(&means).map(|(v, m)| v - m));
    }
    Ok((Matrix::from_vec(n_samples, n_features, data)?, means))
}

fn add_to_diagonal(m: &mut Matrix<f64>, value: f64) {
    for i in 0..m.n_rows() {
        let current = m.get(i, i);
        m.set(i, i, current + value);
    }
}
