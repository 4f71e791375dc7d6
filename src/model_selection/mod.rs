//! Author-grouped leave-one-out cross-validation.
//!
//! This module provides:
//! - [`ExclusionGroups`]: which documents each fold must not train on
//! - [`GroupedLeaveOneOut`]: the per-document fold pipeline
//! - [`FoldScheduler`]: parallel execution with ordered results

mod engine;
mod exclusion;
mod scheduler;

pub use engine::{
    CrossValidationResult, DegeneratePolicy, FoldData, FoldOutcome, FoldSplit, FullModel,
    GroupedLeaveOneOut, Prediction,
};
pub use exclusion::{remove_descending, select_by_mask, ExclusionGroups};
pub use scheduler::{CancellationToken, FoldScheduler};


#[cfg(test)]
mod tests_grouped_loo_contract;
