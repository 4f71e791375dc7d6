//! Core compute primitives.
//!
//! Feature matrices, fold slices and model design matrices are all
//! [`Matrix<f64>`] values.

mod matrix;

pub use matrix::{dot, Matrix};
