//! Run configuration loaded from TOML.
//!
//! The six parameters that shape an evaluation (vocabulary size, selection
//! policy, covariate on/off, regularization strength, per-class size cap,
//! worker count) are required keys. Everything else has a documented
//! default.
//!
//! ## Example
//!
//! ```toml
//! vocab_size = 3200
//! size_cap = 350
//! workers = 8
//!
//! [selection]
//! policy = "frequency"
//! skip_top = 500
//!
//! [covariate]
//! enabled = false
//!
//! [model]
//! regularization = 0.00005
//!
//! [target]
//! kind = "classification"
//! positive_label = "rev"
//!
//! [metadata]
//! label_column = "reviewed"
//! exclude_below = { date = 1700 }
//!
//! [never_train]
//! if_equals = { reviewed = "addedbecausecanon" }
//! ```

use crate::error::{AuthorfoldError, Result};
use crate::metadata::{MetadataSpec, NeverTrain, TargetSpec};
use crate::model_selection::DegeneratePolicy;
use crate::traits::Task;
use crate::vocabulary::{SelectionPolicy, VocabularySelector};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Vocabulary selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    /// `frequency` or `binormal`
    pub policy: SelectionPolicy,
    /// Most frequent terms to drop first
    #[serde(default)]
    pub skip_top: usize,
    /// Frequent terms scored by binormal selection (all when absent)
    #[serde(default)]
    pub candidate_pool: Option<usize>,
    /// Minimum term length in characters
    #[serde(default = "default_min_term_len")]
    pub min_term_len: usize,
}

fn default_min_term_len() -> usize {
    1
}

/// Trailing covariate column settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CovariateConfig {
    /// Whether to append the covariate
    pub enabled: bool,
    /// Metadata column holding the covariate
    #[serde(default = "default_covariate_column")]
    pub column: String,
    /// Value mapped to zero; earlier values clamp to zero
    #[serde(default = "default_covariate_origin")]
    pub origin: f64,
    /// Fixed normalization scale of the covariate column
    #[serde(default = "default_covariate_scale")]
    pub scale: f64,
}

fn default_covariate_column() -> String {
    "date".to_string()
}

fn default_covariate_origin() -> f64 {
    1700.0
}

fn default_covariate_scale() -> f64 {
    0.1
}

/// Model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Inverse strength `C` for classification, `alpha` for regression
    pub regularization: f64,
    /// Gradient-descent iteration cap for classification
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

fn default_max_iter() -> usize {
    1000
}

/// Normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Scale floor for zero-variance columns
    pub min_scale: f64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { min_scale: 1e-6 }
    }
}

/// Feature-vector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    /// Added to the word total before dividing
    pub length_epsilon: f64,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            length_epsilon: 1e-3,
        }
    }
}

/// Fold settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldsConfig {
    /// `skip` or `abort`
    pub on_degenerate: DegeneratePolicy,
}

impl Default for FoldsConfig {
    fn default() -> Self {
        Self {
            on_degenerate: DegeneratePolicy::Skip,
        }
    }
}

/// Corpus settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusConfig {
    /// Volume file extension
    pub extension: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            extension: ".tsv".to_string(),
        }
    }
}

/// Report settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Metadata columns written between `target` and `allwords`
    pub auxiliary: Vec<String>,
}

/// Complete run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Requested vocabulary size
    pub vocab_size: usize,
    /// Per-class size cap; 0 disables it
    pub size_cap: usize,
    /// Worker threads
    pub workers: usize,
    /// Seed for size-cap sampling
    #[serde(default)]
    pub seed: u64,
    /// Vocabulary selection
    pub selection: SelectionConfig,
    /// Covariate column
    pub covariate: CovariateConfig,
    /// Model
    pub model: ModelConfig,
    /// Target derivation
    pub target: TargetSpec,
    /// Metadata columns and filters
    #[serde(default)]
    pub metadata: MetadataSpec,
    /// Training bans
    #[serde(default)]
    pub never_train: NeverTrain,
    /// Corpus file naming
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Normalization
    #[serde(default)]
    pub normalize: NormalizeConfig,
    /// Feature vectors
    #[serde(default)]
    pub features: FeaturesConfig,
    /// Fold policy
    #[serde(default)]
    pub folds: FoldsConfig,
    /// Report layout
    #[serde(default)]
    pub report: ReportConfig,
}

impl RunConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorfoldError::Config`] for TOML or missing-key problems
    /// and [`AuthorfoldError::InvalidHyperparameter`] for bad values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Same as [`RunConfig::from_toml_str`], plus I/O errors.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|err| match err {
            AuthorfoldError::Config(msg) => {
                AuthorfoldError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Applies command-line overrides and re-validates.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is out of range.
    pub fn apply_overrides(&mut self, workers: Option<usize>, vocab_size: Option<usize>) -> Result<()> {
        if let Some(workers) = workers {
            self.workers = workers;
        }
        if let Some(vocab_size) = vocab_size {
            self.vocab_size = vocab_size;
        }
        self.validate()
    }

    /// Checks value ranges and cross-field rules.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorfoldError::InvalidHyperparameter`] on the first
    /// violation.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            return Err(AuthorfoldError::invalid_param("vocab_size", 0, "> 0"));
        }
        if self.workers == 0 {
            return Err(AuthorfoldError::invalid_param("workers", 0, "> 0"));
        }
        positive("model.regularization", self.model.regularization)?;
        if self.model.max_iter == 0 {
            return Err(AuthorfoldError::invalid_param("model.max_iter", 0, "> 0"));
        }
        positive("normalize.min_scale", self.normalize.min_scale)?;
        positive("features.length_epsilon", self.features.length_epsilon)?;
        positive("covariate.scale", self.covariate.scale)?;
        if !self.covariate.origin.is_finite() {
            return Err(AuthorfoldError::invalid_param(
                "covariate.origin",
                self.covariate.origin,
                "finite",
            ));
        }
        if self.selection.candidate_pool == Some(0) {
            return Err(AuthorfoldError::invalid_param("selection.candidate_pool", 0, "> 0"));
        }
        if self.selection.policy == SelectionPolicy::Binormal && self.task() == Task::Regression {
            return Err(AuthorfoldError::invalid_param(
                "selection.policy",
                "binormal",
                "frequency when the target is a regression",
            ));
        }
        if self.covariate.enabled && self.target.reads_column(&self.covariate.column) {
            return Err(AuthorfoldError::invalid_param(
                "covariate.column",
                &self.covariate.column,
                "a column the regression target is not derived from",
            ));
        }
        if self.corpus.extension.is_empty() {
            return Err(AuthorfoldError::invalid_param("corpus.extension", "\"\"", "non-empty"));
        }
        Ok(())
    }

    /// Task implied by the target.
    #[must_use]
    pub fn task(&self) -> Task {
        self.target.task()
    }

    /// Vocabulary selector described by this configuration.
    #[must_use]
    pub fn selector(&self) -> VocabularySelector {
        let selector = VocabularySelector::new(self.vocab_size, self.selection.policy)
            .with_skip_top(self.selection.skip_top)
            .with_min_term_len(self.selection.min_term_len);
        match self.selection.candidate_pool {
            Some(pool) => selector.with_candidate_pool(pool),
            None => selector,
        }
    }
}

fn positive(param: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AuthorfoldError::invalid_param(param, value, "finite and > 0"))
    }
}
