//! Grouped leave-one-out fold evaluation.
//!
//! Every document is held out once. Its fold trains on every other document
//! except those sharing its author and those banned from training. Each fold
//! slices a private copy of the training rows out of the shared, read-only
//! feature matrix, fits its own normalization statistics, fits a fresh
//! model, and scores the held-out row taken from the unmodified matrix.

use super::exclusion::{select_by_mask, ExclusionGroups};
use super::scheduler::FoldScheduler;
use crate::error::{AuthorfoldError, Result};
use crate::features::FeatureMatrix;
use crate::preprocessing::{FoldNormalizer, FoldStatistics};
use crate::traits::{FittedModel, ModelAdapter, Task};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to do when a fold cannot be trained meaningfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Mark the document's prediction unavailable and continue.
    Skip,
    /// Fail the whole run.
    Abort,
}

/// Result of one fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum FoldOutcome {
    /// The held-out document was scored.
    Predicted {
        /// Probability of class 1, or the regression estimate
        value: f64,
    },
    /// The fold was degenerate and skipped.
    Unavailable {
        /// Why no prediction exists
        reason: String,
    },
}

/// Prediction for one document, addressed by its original index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Position of the document in the input order
    pub index: usize,
    /// Document identifier
    pub doc_id: String,
    /// Fold result
    pub outcome: FoldOutcome,
}

impl Prediction {
    /// Predicted value, if the fold produced one.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self.outcome {
            FoldOutcome::Predicted { value } => Some(value),
            FoldOutcome::Unavailable { .. } => None,
        }
    }
}

/// Read-only inputs shared by every fold.
#[derive(Debug, Clone, Copy)]
pub struct FoldData<'a> {
    features: &'a FeatureMatrix,
    targets: &'a [f64],
    doc_ids: &'a [String],
    groups: &'a ExclusionGroups,
}

impl<'a> FoldData<'a> {
    /// Bundles fold inputs, checking that they describe the same documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the target, id or exclusion counts differ from the
    /// feature row count.
    pub fn new(
        features: &'a FeatureMatrix,
        targets: &'a [f64],
        doc_ids: &'a [String],
        groups: &'a ExclusionGroups,
    ) -> Result<Self> {
        let n = features.n_documents();
        if targets.len() != n {
            return Err(AuthorfoldError::dimension_mismatch("targets", n, targets.len()));
        }
        if doc_ids.len() != n {
            return Err(AuthorfoldError::dimension_mismatch("document ids", n, doc_ids.len()));
        }
        if groups.len() != n {
            return Err(AuthorfoldError::dimension_mismatch("exclusion lists", n, groups.len()));
        }
        Ok(Self {
            features,
            targets,
            doc_ids,
            groups,
        })
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Exclusion lists.
    #[must_use]
    pub fn groups(&self) -> &ExclusionGroups {
        self.groups
    }
}

/// Training rows and targets for one fold, plus the raw held-out row.
#[derive(Debug, Clone)]
pub struct FoldSplit {
    /// Private copy of the training rows
    pub train: crate::primitives::Matrix<f64>,
    /// Training targets, aligned with `train`
    pub targets: Vec<f64>,
    /// Held-out row, copied from the unmodified matrix
    pub test: Vec<f64>,
}

/// Model fitted on every trainable document, with the statistics used to
/// normalize its inputs.
#[derive(Debug, Clone)]
pub struct FullModel<F> {
    /// Fitted model
    pub model: F,
    /// Normalization statistics of the training set
    pub statistics: FoldStatistics,
}

/// Ordered predictions for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationResult {
    /// One prediction per document, in input order
    pub predictions: Vec<Prediction>,
}

impl CrossValidationResult {
    /// Documents that received a prediction.
    #[must_use]
    pub fn predicted(&self) -> usize {
        self.predictions.iter().filter(|p| p.value().is_some()).count()
    }

    /// Documents whose fold was skipped.
    #[must_use]
    pub fn unavailable(&self) -> usize {
        self.predictions.len() - self.predicted()
    }
}

/// Grouped leave-one-out cross-validation around a model adapter.
///
/// # Examples
///
/// ```
/// use authorfold::features::FeatureMatrix;
/// use authorfold::linear_model::Ridge;
/// use authorfold::model_selection::{ExclusionGroups, FoldData, FoldScheduler, GroupedLeaveOneOut};
/// use authorfold::prelude::*;
///
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).expect("valid");
/// let features = FeatureMatrix::new(x, false);
/// let targets = [2.0, 4.0, 6.0, 8.0];
/// let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
/// let groups = ExclusionGroups::build(&["A", "B", "A", "C"], &[]).expect("valid");
///
/// let data = FoldData::new(&features, &targets, &ids, &groups).expect("aligned");
/// let engine = GroupedLeaveOneOut::new(Ridge::new(1e-6), 1e-6);
/// let result = engine.run(&data, &FoldScheduler::new(2).expect("workers > 0")).expect("folds run");
///
/// assert_eq!(result.predictions.len(), 4);
/// assert!((result.predictions[1].value().expect("predicted") - 4.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct GroupedLeaveOneOut<M> {
    adapter: M,
    min_scale: f64,
    covariate_scale: f64,
    on_degenerate: DegeneratePolicy,
}

impl<M: ModelAdapter> GroupedLeaveOneOut<M> {
    /// Creates an engine with the given zero-variance scale floor.
    ///
    /// Degenerate folds are skipped and a covariate column, when present,
    /// is scaled by 0.1 unless configured otherwise.
    #[must_use]
    pub fn new(adapter: M, min_scale: f64) -> Self {
        Self {
            adapter,
            min_scale,
            covariate_scale: 0.1,
            on_degenerate: DegeneratePolicy::Skip,
        }
    }

    /// Sets the fixed scale of a trailing covariate column.
    #[must_use]
    pub fn with_covariate_scale(mut self, scale: f64) -> Self {
        self.covariate_scale = scale;
        self
    }

    /// Sets the degenerate-fold policy.
    #[must_use]
    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.on_degenerate = policy;
        self
    }

    /// The model adapter.
    #[must_use]
    pub fn adapter(&self) -> &M {
        &self.adapter
    }

    fn normalizer(&self, features: &FeatureMatrix) -> FoldNormalizer {
        let normalizer = FoldNormalizer::new(self.min_scale);
        if features.has_covariate() {
            normalizer.with_covariate_scale(self.covariate_scale)
        } else {
            normalizer
        }
    }

    /// Slices document `index`'s fold out of the shared inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn split(&self, data: &FoldData<'_>, index: usize) -> Result<FoldSplit> {
        if index >= data.len() {
            return Err(AuthorfoldError::Other(format!(
                "fold index {index} out of range for {} documents",
                data.len()
            )));
        }
        let keep = data.groups.keep_mask(index);
        let matrix = data.features.matrix();
        Ok(FoldSplit {
            train: matrix.select_rows(&keep)?,
            targets: select_by_mask(data.targets, &keep)?,
            test: matrix.row(index).to_vec(),
        })
    }

    /// Why a training set cannot support a fit, if it cannot.
    fn degeneracy(&self, targets: &[f64]) -> Option<String> {
        if targets.is_empty() {
            return Some("empty training set".to_string());
        }
        if self.adapter.task() == Task::Classification {
            let positives = targets.iter().filter(|&&y| y == 1.0).count();
            if positives == 0 || positives == targets.len() {
                return Some("training labels contain a single class".to_string());
            }
        }
        None
    }

    /// Runs the fold for document `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorfoldError::DegenerateFold`] for a degenerate fold under
    /// [`DegeneratePolicy::Abort`], or any error raised while fitting.
    pub fn fold(&self, data: &FoldData<'_>, index: usize) -> Result<Prediction> {
        let split = self.split(data, index)?;
        let doc_id = data.doc_ids[index].clone();

        if let Some(reason) = self.degeneracy(&split.targets) {
            return match self.on_degenerate {
                DegeneratePolicy::Skip => {
                    warn!(doc_id = %doc_id, reason = %reason, "skipping degenerate fold");
                    Ok(Prediction {
                        index,
                        doc_id,
                        outcome: FoldOutcome::Unavailable { reason },
                    })
                }
                DegeneratePolicy::Abort => Err(AuthorfoldError::DegenerateFold { doc_id, reason }),
            };
        }

        let (train, stats) = self.normalizer(data.features).fit_transform(split.train)?;
        let test = stats.transform_row(&split.test)?;
        let model = self.adapter.fit(&train, &split.targets)?;
        let value = model.predict(&test)?;

        debug!(
            index,
            doc_id = %doc_id,
            training_rows = split.targets.len(),
            value,
            "fold complete"
        );
        Ok(Prediction {
            index,
            doc_id,
            outcome: FoldOutcome::Predicted { value },
        })
    }

    /// Runs every fold on `scheduler` and returns predictions in input order.
    ///
    /// # Errors
    ///
    /// Returns the first failing fold's error (by document index), a
    /// [`AuthorfoldError::TaskPanicked`] if a fold panicked, or
    /// [`AuthorfoldError::Cancelled`] if the run was cancelled.
    pub fn run(&self, data: &FoldData<'_>, scheduler: &FoldScheduler) -> Result<CrossValidationResult> {
        info!(
            documents = data.len(),
            banned = data.groups.banned_count(),
            workers = scheduler.workers(),
            "starting grouped leave-one-out"
        );
        let predictions = scheduler.run(data.len(), |index| self.fold(data, index))?;
        let result = CrossValidationResult { predictions };
        info!(
            predicted = result.predicted(),
            unavailable = result.unavailable(),
            "cross-validation complete"
        );
        Ok(result)
    }

    /// Fits one model on every document that is not banned.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorfoldError::DegenerateFold`] (with an empty document
    /// id) if the trainable set is degenerate, or any fitting error.
    pub fn fit_full(&self, data: &FoldData<'_>) -> Result<FullModel<M::Fitted>> {
        let keep = data.groups.trainable_mask();
        let train = data.features.matrix().select_rows(&keep)?;
        let targets = select_by_mask(data.targets, &keep)?;
        if let Some(reason) = self.degeneracy(&targets) {
            return Err(AuthorfoldError::DegenerateFold {
                doc_id: String::new(),
                reason,
            });
        }
        let (train, statistics) = self.normalizer(data.features).fit_transform(train)?;
        let model = self.adapter.fit(&train, &targets)?;
        Ok(FullModel { model, statistics })
    }
}
