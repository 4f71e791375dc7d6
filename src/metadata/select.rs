//! Turning admitted records into targets, banned sets and capped samples.

use super::{force_int, MetadataRecord};
use crate::error::{AuthorfoldError, Result};
use crate::traits::Task;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// How a record's numeric target is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetSpec {
    /// 1 when the label equals `positive_label`, else 0.
    Classification {
        /// Label value of the positive class
        positive_label: String,
    },
    /// Numeric value of `column`, or of `first_column` when that value is
    /// earlier than `column` and later than `first_after`.
    Regression {
        /// Column holding the target
        column: String,
        /// Column holding an earlier value that replaces the target when it
        /// qualifies (for example a first-publication date)
        #[serde(default)]
        first_column: Option<String>,
        /// Lower bound, exclusive, for an earlier value to qualify
        #[serde(default = "default_first_after")]
        first_after: f64,
        /// Inclusive `[low, high]` range outside which a target is logged
        #[serde(default)]
        expected_range: Option<[f64; 2]>,
    },
}

fn default_first_after() -> f64 {
    1750.0
}

fn numeric(record: &MetadataRecord, column: &str) -> Option<f64> {
    record
        .field(column)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl TargetSpec {
    /// Task this target implies.
    #[must_use]
    pub fn task(&self) -> Task {
        match self {
            Self::Classification { .. } => Task::Classification,
            Self::Regression { .. } => Task::Regression,
        }
    }

    /// True when the target is derived from the column `name`.
    #[must_use]
    pub fn reads_column(&self, name: &str) -> bool {
        match self {
            Self::Classification { .. } => false,
            Self::Regression {
                column,
                first_column,
                ..
            } => column == name || first_column.as_deref() == Some(name),
        }
    }

    /// Target value for one record.
    ///
    /// # Errors
    ///
    /// Returns an error if a regression target is missing or not numeric.
    pub fn value(&self, record: &MetadataRecord) -> Result<f64> {
        match self {
            Self::Classification { positive_label } => {
                Ok(if record.label == *positive_label { 1.0 } else { 0.0 })
            }
            Self::Regression {
                column,
                first_column,
                first_after,
                expected_range,
            } => {
                let primary = numeric(record, column).ok_or_else(|| {
                    AuthorfoldError::Other(format!(
                        "document {} has no numeric '{column}' target",
                        record.id
                    ))
                })?;
                let value = first_column
                    .as_deref()
                    .and_then(|first| numeric(record, first))
                    .filter(|&first| first < primary && first > *first_after)
                    .unwrap_or(primary);
                if let Some([low, high]) = expected_range {
                    if value < *low || value > *high {
                        warn!(id = %record.id, value, low, high, "target outside expected range");
                    }
                }
                Ok(value)
            }
        }
    }
}

/// Predicates for documents that are predicted but never trained on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NeverTrain {
    /// Banned when `field == value`
    pub if_equals: BTreeMap<String, String>,
    /// Banned when `int(field) > n`
    pub above: BTreeMap<String, i64>,
}

impl NeverTrain {
    /// True when `record` must never appear in a training fold.
    #[must_use]
    pub fn bans(&self, record: &MetadataRecord) -> bool {
        let get = |key: &str| record.field(key).unwrap_or("");
        self.if_equals.iter().any(|(k, v)| get(k) == v)
            || self.above.iter().any(|(k, &n)| force_int(get(k)) > n)
    }

    /// Indices of banned records, ascending.
    #[must_use]
    pub fn banned_indices(&self, records: &[&MetadataRecord]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.bans(r))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Keep-mask that caps every class at `cap` members.
///
/// Classes larger than the cap keep a random subset drawn from a generator
/// seeded with `seed`; smaller classes keep everything. A cap of 0 keeps
/// every document. Classes are keyed by exact target value, so pass a
/// constant slice to cap a regression corpus as a single group.
#[must_use]
pub fn size_cap_mask(classes: &[f64], cap: usize, seed: u64) -> Vec<bool> {
    if cap == 0 {
        return vec![true; classes.len()];
    }

    let mut groups: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (idx, class) in classes.iter().enumerate() {
        groups.entry(class.to_bits()).or_default().push(idx);
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut keep = vec![false; classes.len()];
    for members in groups.values_mut() {
        if members.len() > cap {
            members.shuffle(&mut rng);
            members.truncate(cap);
        }
        for &idx in members.iter() {
            keep[idx] = true;
        }
    }
    keep
}
