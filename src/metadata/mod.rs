//! Metadata table loading, filtering and joining.
//!
//! The metadata file is tab-separated with a header row. Each surviving row
//! becomes a [`MetadataRecord`] with typed core fields; every column stays
//! reachable through [`MetadataRecord::field`] for filters and report
//! auxiliaries.

mod select;

pub use select::{size_cap_mask, NeverTrain, TargetSpec};

use crate::error::{AuthorfoldError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Parses an integer field, treating anything unparsable as 0.
#[must_use]
pub fn force_int(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

/// Normalizes a volume id to pairtree "dirty" form.
///
/// Everything after the first period gets `+` → `:` and `=` → `/`, but only
/// when that part contains `=`. Ids without a period are returned as-is.
#[must_use]
pub fn dirty_pairtree(id: &str) -> String {
    match id.split_once('.') {
        Some((prefix, postfix)) if postfix.contains('=') => {
            format!("{prefix}.{}", postfix.replace('+', ":").replace('=', "/"))
        }
        _ => id.to_string(),
    }
}

/// Column names and row filters for a metadata table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataSpec {
    /// Column holding the volume id
    pub id_column: String,
    /// Column holding the author name
    pub author_column: String,
    /// Column holding the title
    pub title_column: String,
    /// Column holding the class label
    pub label_column: String,
    /// Column holding the (integer) date
    pub date_column: String,
    /// Rows whose label equals this value are dropped
    pub drop_label: String,
    /// Drop rows where `field == value`
    pub exclude_if: BTreeMap<String, String>,
    /// Drop rows where `field != value`
    pub exclude_if_not: BTreeMap<String, String>,
    /// Drop rows where `int(field) < n`
    pub exclude_below: BTreeMap<String, i64>,
    /// Drop rows where `int(field) > n`
    pub exclude_above: BTreeMap<String, i64>,
}

impl Default for MetadataSpec {
    fn default() -> Self {
        Self {
            id_column: "docid".to_string(),
            author_column: "author".to_string(),
            title_column: "title".to_string(),
            label_column: "label".to_string(),
            date_column: "date".to_string(),
            drop_label: "remove".to_string(),
            exclude_if: BTreeMap::new(),
            exclude_if_not: BTreeMap::new(),
            exclude_below: BTreeMap::new(),
            exclude_above: BTreeMap::new(),
        }
    }
}

impl MetadataSpec {
    /// True when the row passes every inclusion predicate.
    fn admits(&self, row: &HashMap<String, String>) -> bool {
        let get = |key: &str| row.get(key).map_or("", String::as_str);

        if get(&self.label_column).trim() == self.drop_label {
            return false;
        }
        if self.exclude_if.iter().any(|(k, v)| get(k) == v) {
            return false;
        }
        if self.exclude_if_not.iter().any(|(k, v)| get(k) != v) {
            return false;
        }
        if self.exclude_below.iter().any(|(k, &n)| force_int(get(k)) < n) {
            return false;
        }
        !self.exclude_above.iter().any(|(k, &n)| force_int(get(k)) > n)
    }

    /// Every column the loader will read.
    fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        [
            self.id_column.as_str(),
            self.author_column.as_str(),
            self.title_column.as_str(),
            self.label_column.as_str(),
            self.date_column.as_str(),
        ]
        .into_iter()
        .chain(self.exclude_if.keys().map(String::as_str))
        .chain(self.exclude_if_not.keys().map(String::as_str))
        .chain(self.exclude_below.keys().map(String::as_str))
        .chain(self.exclude_above.keys().map(String::as_str))
    }
}

/// One admitted metadata row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    /// Pairtree-normalized volume id
    pub id: String,
    /// Author; empty authors become `anonymous<N>`
    pub author: String,
    /// Title
    pub title: String,
    /// Class label, trimmed
    pub label: String,
    /// Integer date (0 when unparsable)
    pub date: i64,
    fields: HashMap<String, String>,
}

impl MetadataRecord {
    /// Raw value of any column.
    #[must_use]
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Counts from joining corpus volumes to metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinCounts {
    /// Corpus volumes with no admitted metadata row
    pub missing_in_metadata: usize,
    /// Admitted metadata rows with no corpus volume
    pub missing_in_corpus: usize,
}

/// Admitted metadata rows keyed by normalized id.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    records: HashMap<String, MetadataRecord>,
    skipped_rows: usize,
}

impl MetadataTable {
    /// Loads and filters a metadata file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is empty, or lacks a
    /// column named in `spec`.
    pub fn load(path: &Path, spec: &MetadataSpec) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, spec).map_err(|err| match err {
            AuthorfoldError::Parse { line, message, .. } => AuthorfoldError::Parse {
                path: path.to_path_buf(),
                line,
                message,
            },
            other => other,
        })
    }

    /// Parses metadata text.
    ///
    /// # Errors
    ///
    /// Same as [`MetadataTable::load`], with an empty path in parse errors.
    pub fn parse(text: &str, spec: &MetadataSpec) -> Result<Self> {
        let mut lines = text.lines().enumerate();
        let Some((_, header)) = lines.next() else {
            return Err(AuthorfoldError::empty_input("metadata table"));
        };
        let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
        for needed in spec.referenced_columns() {
            if !columns.contains(&needed) {
                return Err(AuthorfoldError::Parse {
                    path: Default::default(),
                    line: 1,
                    message: format!("missing column '{needed}'"),
                });
            }
        }

        let mut table = Self::default();
        let mut anonymous = 0usize;

        for (line_no, line) in lines {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let values: Vec<&str> = line.split('\t').collect();
            if values.len() != columns.len() {
                warn!(
                    line = line_no + 1,
                    expected = columns.len(),
                    actual = values.len(),
                    "skipping malformed metadata row"
                );
                table.skipped_rows += 1;
                continue;
            }
            let row: HashMap<String, String> = columns
                .iter()
                .zip(&values)
                .map(|(c, v)| (c.to_string(), v.to_string()))
                .collect();
            if !spec.admits(&row) {
                continue;
            }

            let get = |key: &str| row.get(key).cloned().unwrap_or_default();
            let mut author = get(&spec.author_column);
            if author.is_empty() {
                author = format!("anonymous{anonymous}");
                anonymous += 1;
            }
            let record = MetadataRecord {
                id: dirty_pairtree(&get(&spec.id_column)),
                author,
                title: get(&spec.title_column),
                label: get(&spec.label_column).trim().to_string(),
                date: force_int(&get(&spec.date_column)),
                fields: row,
            };
            table.records.insert(record.id.clone(), record);
        }

        Ok(table)
    }

    /// Record for a corpus volume id (normalized before lookup).
    #[must_use]
    pub fn get(&self, volume_id: &str) -> Option<&MetadataRecord> {
        self.records.get(&dirty_pairtree(volume_id))
    }

    /// Number of admitted rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no rows were admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows skipped for having the wrong number of fields.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Matches corpus volume ids against admitted rows.
    ///
    /// Returns one entry per input id (in input order) plus the omission
    /// counts in both directions.
    pub fn join<'a, S: AsRef<str>>(
        &'a self,
        volume_ids: &[S],
    ) -> (Vec<Option<&'a MetadataRecord>>, JoinCounts) {
        let mut seen = HashSet::new();
        let matched: Vec<Option<&MetadataRecord>> = volume_ids
            .iter()
            .map(|id| {
                let record = self.get(id.as_ref());
                if let Some(r) = record {
                    seen.insert(r.id.as_str());
                }
                record
            })
            .collect();

        let counts = JoinCounts {
            missing_in_metadata: matched.iter().filter(|m| m.is_none()).count(),
            missing_in_corpus: self.records.len() - seen.len(),
        };
        info!(
            missing_in_metadata = counts.missing_in_metadata,
            missing_in_corpus = counts.missing_in_corpus,
            "joined corpus to metadata"
        );
        (matched, counts)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
