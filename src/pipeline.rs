//! End-to-end evaluation run.
//!
//! Reads the corpus, joins it to filtered metadata, derives targets and the
//! banned set, selects a vocabulary, builds feature vectors and runs grouped
//! leave-one-out. The result carries everything the report writers need.

use crate::classification::LogisticRegression;
use crate::config::RunConfig;
use crate::corpus::{CorpusReader, RawVolume, ReadReport};
use crate::error::{AuthorfoldError, Result};
use crate::features::{shifted_covariate, FeatureBuilder, FeatureSource};
use crate::linear_model::Ridge;
use crate::metadata::{size_cap_mask, JoinCounts, MetadataRecord, MetadataTable};
use crate::model_selection::{
    select_by_mask, CancellationToken, CrossValidationResult, DegeneratePolicy, ExclusionGroups,
    FoldData, FoldScheduler, GroupedLeaveOneOut,
};
use crate::report::{coefficient_table, CoefficientRow, ReportRow};
use crate::traits::{FittedModel, ModelAdapter, Task};
use crate::vocabulary::{Selection, TermCounts};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Counts describing a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Documents evaluated
    pub documents: usize,
    /// Documents with a prediction
    pub predicted: usize,
    /// Documents whose fold was skipped
    pub unavailable: usize,
    /// Documents never used for training
    pub banned: usize,
    /// Terms in the vocabulary
    pub vocabulary_size: usize,
    /// Whether fewer terms were available than requested
    pub vocabulary_underflow: bool,
    /// Corpus lines skipped as malformed
    pub malformed_lines: usize,
    /// Corpus volumes without admitted metadata
    pub missing_in_metadata: usize,
    /// Admitted metadata rows without a corpus volume
    pub missing_in_corpus: usize,
}

/// Corpus joined to metadata, with targets and vocabulary.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    /// Volumes in evaluation order
    pub volumes: Vec<RawVolume>,
    /// Metadata for each volume
    pub records: Vec<MetadataRecord>,
    /// Numeric target for each volume
    pub targets: Vec<f64>,
    /// Vocabulary selection
    pub selection: Selection,
    /// Corpus read diagnostics
    pub read_report: ReadReport,
    /// Join diagnostics
    pub join: JoinCounts,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Summary counts
    pub summary: RunSummary,
    /// Ordered predictions
    pub result: CrossValidationResult,
    /// Prediction report rows, in evaluation order
    pub rows: Vec<ReportRow>,
    /// Full-model coefficients, when the full training set was usable
    pub coefficients: Option<Vec<CoefficientRow>>,
    /// Candidate term scores from discriminative selection
    pub term_scores: Option<Vec<(String, f64)>>,
}

/// A configured evaluation.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RunConfig,
    token: CancellationToken,
}

impl Pipeline {
    /// Creates a pipeline for a validated configuration.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            token: CancellationToken::new(),
        }
    }

    /// Uses `token` to cancel the fold stage.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Reads and joins inputs, derives targets, applies the size cap and
    /// selects the vocabulary.
    ///
    /// # Errors
    ///
    /// Returns an error if inputs cannot be read, a target cannot be
    /// derived, no documents remain, or selection fails.
    pub fn prepare(&self, corpus_dir: &Path, metadata_path: &Path) -> Result<PreparedCorpus> {
        let config = &self.config;
        let (volumes, read_report) = CorpusReader::new(config.corpus.extension.as_str()).read_dir(corpus_dir)?;
        let table = MetadataTable::load(metadata_path, &config.metadata)?;
        if table.skipped_rows() > 0 {
            warn!(rows = table.skipped_rows(), "metadata rows skipped as malformed");
        }

        let ids: Vec<&str> = volumes.iter().map(|v| v.id.as_str()).collect();
        let (matched, join) = table.join(&ids);
        let matched: Vec<Option<MetadataRecord>> = matched.into_iter().map(|m| m.cloned()).collect();

        let mut kept_volumes = Vec::new();
        let mut records = Vec::new();
        for (volume, record) in volumes.into_iter().zip(matched) {
            if let Some(record) = record {
                kept_volumes.push(volume);
                records.push(record);
            }
        }

        let mut targets = records
            .iter()
            .map(|r| config.target.value(r))
            .collect::<Result<Vec<f64>>>()?;

        if config.size_cap > 0 {
            let classes = match config.task() {
                Task::Classification => targets.clone(),
                Task::Regression => vec![0.0; targets.len()],
            };
            let keep = size_cap_mask(&classes, config.size_cap, config.seed);
            kept_volumes = select_by_mask(&kept_volumes, &keep)?;
            records = select_by_mask(&records, &keep)?;
            targets = select_by_mask(&targets, &keep)?;
            info!(cap = config.size_cap, remaining = targets.len(), "size cap applied");
        }

        if kept_volumes.is_empty() {
            return Err(AuthorfoldError::empty_input("no documents remain after joining metadata"));
        }

        let counts: Vec<&TermCounts> = kept_volumes.iter().map(|v| &v.counts).collect();
        let selection = config.selector().select(&counts, &targets)?;
        info!(
            documents = kept_volumes.len(),
            terms = selection.vocabulary().len(),
            "inputs prepared"
        );

        Ok(PreparedCorpus {
            volumes: kept_volumes,
            records,
            targets,
            selection,
            read_report,
            join,
        })
    }

    /// Runs the whole evaluation.
    ///
    /// # Errors
    ///
    /// Returns any preparation error, fold failure, or cancellation.
    pub fn run(&self, corpus_dir: &Path, metadata_path: &Path) -> Result<RunOutput> {
        let prepared = self.prepare(corpus_dir, metadata_path)?;
        self.evaluate(prepared)
    }

    /// Runs folds over already prepared inputs.
    ///
    /// # Errors
    ///
    /// Returns any feature, fold or cancellation error.
    pub fn evaluate(&self, prepared: PreparedCorpus) -> Result<RunOutput> {
        let config = &self.config;
        let vocabulary = prepared.selection.vocabulary();

        let covariates: Vec<Option<f64>> = prepared
            .records
            .iter()
            .map(|r| {
                config.covariate.enabled.then(|| {
                    let raw = r
                        .field(&config.covariate.column)
                        .and_then(|v| v.trim().parse::<f64>().ok())
                        .unwrap_or(0.0);
                    shifted_covariate(raw, config.covariate.origin)
                })
            })
            .collect();
        let sources: Vec<FeatureSource<'_>> = prepared
            .volumes
            .iter()
            .zip(&covariates)
            .map(|(v, &covariate)| FeatureSource {
                counts: &v.counts,
                total_words: v.total_words,
                covariate,
            })
            .collect();

        let builder = FeatureBuilder::new(vocabulary, config.features.length_epsilon);
        let builder = if config.covariate.enabled {
            builder.with_covariate()
        } else {
            builder
        };
        let features = builder.matrix(&sources)?;

        let banned = config
            .never_train
            .banned_indices(&prepared.records.iter().collect::<Vec<_>>());
        let authors: Vec<&str> = prepared.records.iter().map(|r| r.author.as_str()).collect();
        let groups = ExclusionGroups::build(&authors, &banned)?;
        let doc_ids: Vec<String> = prepared.volumes.iter().map(|v| v.id.clone()).collect();
        let data = FoldData::new(&features, &prepared.targets, &doc_ids, &groups)?;

        let scheduler = FoldScheduler::new(config.workers)?.with_cancellation(self.token.clone());
        let mut names: Vec<String> = vocabulary.terms().to_vec();
        if config.covariate.enabled {
            names.push(config.covariate.column.clone());
        }

        let (result, coefficients) = match config.task() {
            Task::Classification => {
                let adapter = LogisticRegression::new(config.model.regularization)
                    .with_max_iter(config.model.max_iter);
                self.cross_validate(adapter, &data, &scheduler, &names)?
            }
            Task::Regression => {
                let adapter = Ridge::new(config.model.regularization);
                self.cross_validate(adapter, &data, &scheduler, &names)?
            }
        };

        let rows = prepared
            .volumes
            .iter()
            .zip(&prepared.records)
            .zip(&prepared.targets)
            .zip(&result.predictions)
            .map(|(((volume, record), &target), prediction)| ReportRow {
                doc_id: volume.id.clone(),
                label: record.label.clone(),
                target,
                auxiliary: config
                    .report
                    .auxiliary
                    .iter()
                    .map(|c| record.field(c).unwrap_or("").to_string())
                    .collect(),
                allwords: volume.total_words,
                prediction: prediction.value(),
            })
            .collect();

        let summary = RunSummary {
            documents: result.predictions.len(),
            predicted: result.predicted(),
            unavailable: result.unavailable(),
            banned: groups.banned_count(),
            vocabulary_size: vocabulary.len(),
            vocabulary_underflow: prepared.selection.is_underflow(),
            malformed_lines: prepared.read_report.malformed_lines,
            missing_in_metadata: prepared.join.missing_in_metadata,
            missing_in_corpus: prepared.join.missing_in_corpus,
        };

        Ok(RunOutput {
            summary,
            result,
            rows,
            coefficients,
            term_scores: prepared.selection.term_scores().map(<[_]>::to_vec),
        })
    }

    fn cross_validate<M: ModelAdapter>(
        &self,
        adapter: M,
        data: &FoldData<'_>,
        scheduler: &FoldScheduler,
        names: &[String],
    ) -> Result<(CrossValidationResult, Option<Vec<CoefficientRow>>)> {
        let engine = GroupedLeaveOneOut::new(adapter, self.config.normalize.min_scale)
            .with_covariate_scale(self.config.covariate.scale)
            .with_degenerate_policy(self.config.folds.on_degenerate);
        let result = engine.run(data, scheduler)?;

        let coefficients = match engine.fit_full(data) {
            Ok(full) => Some(coefficient_table(
                names,
                full.model.coefficients(),
                full.statistics.scales(),
            )?),
            Err(AuthorfoldError::DegenerateFold { reason, .. })
                if self.config.folds.on_degenerate == DegeneratePolicy::Skip =>
            {
                warn!(reason = %reason, "full-model fit skipped");
                None
            }
            Err(err) => return Err(err),
        };
        Ok((result, coefficients))
    }
}
