//! Word-count corpus reader.
//!
//! A corpus is a directory of per-volume files named `<id><extension>`
//! (for example `uc1.b3342759.poe.tsv`). Each line holds one token and its
//! count separated by a tab. Malformed lines are skipped with a warning and
//! counted; they never fail the read.

use crate::error::Result;
use crate::vocabulary::TermCounts;
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Word counts for one volume.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVolume {
    /// Volume identifier (file name minus extension)
    pub id: String,
    /// Token to count
    pub counts: TermCounts,
    /// Sum of every well-formed count, including tokens that never become
    /// features
    pub total_words: u64,
}

/// Diagnostics collected while reading a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadReport {
    /// Volume files read
    pub files: usize,
    /// Lines skipped because they were malformed
    pub malformed_lines: usize,
}

/// Reads corpus directories.
#[derive(Debug, Clone)]
pub struct CorpusReader {
    extension: String,
}

impl CorpusReader {
    /// Creates a reader for files ending in `extension`.
    #[must_use]
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// File extension this reader matches.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Lists `(id, path)` for every matching file, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn list(&self, dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(id) = name.strip_suffix(self.extension.as_str()) {
                if !id.is_empty() {
                    entries.push((id.to_string(), path.clone()));
                }
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Reads every volume in `dir`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a volume file cannot be read.
    pub fn read_dir(&self, dir: &Path) -> Result<(Vec<RawVolume>, ReadReport)> {
        let entries = self.list(dir)?;
        let mut report = ReadReport::default();
        let mut volumes = Vec::with_capacity(entries.len());

        for (id, path) in entries {
            let (volume, malformed) = read_volume(&path, id)?;
            report.files += 1;
            report.malformed_lines += malformed;
            volumes.push(volume);
        }

        info!(
            volumes = report.files,
            malformed_lines = report.malformed_lines,
            dir = %dir.display(),
            "corpus read"
        );
        Ok((volumes, report))
    }
}

/// Reads one volume file, returning it with its malformed-line count.
///
/// Blank lines are ignored silently. Lines that are not valid UTF-8 count
/// as malformed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn read_volume(path: &Path, id: String) -> Result<(RawVolume, usize)> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let mut counts = TermCounts::new();
    let mut total_words = 0u64;
    let mut malformed = 0usize;
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let Ok(line) = std::str::from_utf8(&buf) else {
            malformed += 1;
            warn!(
                path = %path.display(),
                line = line_no,
                "skipping word-count line that is not valid UTF-8"
            );
            continue;
        };
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((term, count)) => {
                *counts.entry(term.to_string()).or_insert(0) += count;
                total_words += count;
            }
            None => {
                malformed += 1;
                warn!(
                    path = %path.display(),
                    line = line_no,
                    "skipping malformed word-count line"
                );
            }
        }
    }

    debug!(id = %id, terms = counts.len(), total_words, "volume read");
    Ok((
        RawVolume {
            id,
            counts,
            total_words,
        },
        malformed,
    ))
}

/// Parses `term<TAB>count`; anything else is malformed.
fn parse_line(line: &str) -> Option<(&str, u64)> {
    let mut fields = line.split('\t');
    let term = fields.next()?;
    let count = fields.next()?.trim().parse::<u64>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((term, count))
}
