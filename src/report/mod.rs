//! Output files: per-document predictions, model coefficients and term
//! scores.
//!
//! Prediction CSV columns are a fixed contract: `docid`, `label`, `target`,
//! the configured auxiliary metadata columns in order, `allwords`,
//! `prediction`. Unavailable predictions are written as `NA`.

use crate::error::{AuthorfoldError, Result};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Marker written for documents without a prediction.
pub const MISSING: &str = "NA";

/// One prediction-report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Document identifier
    pub doc_id: String,
    /// Label column value
    pub label: String,
    /// Numeric target the model was trained against
    pub target: f64,
    /// Auxiliary metadata values, aligned with the configured column names
    pub auxiliary: Vec<String>,
    /// Total words in the document
    pub allwords: u64,
    /// Predicted value, if the fold produced one
    pub prediction: Option<f64>,
}

/// One coefficient-report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientRow {
    /// Feature name
    pub term: String,
    /// Coefficient on the normalized feature
    pub coefficient: f64,
    /// Coefficient divided by the feature's normalization scale
    pub normalized: f64,
}

/// Quotes a CSV field when it holds a comma, quote or line break.
#[must_use]
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn csv_line(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes the prediction CSV.
///
/// # Errors
///
/// Returns an error if a row's auxiliary values do not match the column
/// names, or on write failure.
pub fn write_predictions<W: Write>(out: W, auxiliary: &[String], rows: &[ReportRow]) -> Result<()> {
    let mut out = BufWriter::new(out);

    let mut header: Vec<&str> = vec!["docid", "label", "target"];
    header.extend(auxiliary.iter().map(String::as_str));
    header.extend(["allwords", "prediction"]);
    writeln!(out, "{}", csv_line(&header))?;

    for row in rows {
        if row.auxiliary.len() != auxiliary.len() {
            return Err(AuthorfoldError::dimension_mismatch(
                "auxiliary columns",
                auxiliary.len(),
                row.auxiliary.len(),
            ));
        }
        let target = row.target.to_string();
        let allwords = row.allwords.to_string();
        let prediction = row
            .prediction
            .map_or_else(|| MISSING.to_string(), |p| p.to_string());

        let mut fields: Vec<&str> = vec![row.doc_id.as_str(), row.label.as_str(), target.as_str()];
        fields.extend(row.auxiliary.iter().map(String::as_str));
        fields.extend([allwords.as_str(), prediction.as_str()]);
        writeln!(out, "{}", csv_line(&fields))?;
    }
    out.flush()?;
    Ok(())
}

/// Pairs feature names with fitted coefficients, sorted ascending by
/// coefficient (ties by name).
///
/// # Errors
///
/// Returns an error if the three slices differ in length.
pub fn coefficient_table(names: &[String], coefficients: &[f64], scales: &[f64]) -> Result<Vec<CoefficientRow>> {
    if coefficients.len() != names.len() {
        return Err(AuthorfoldError::dimension_mismatch("coefficients", names.len(), coefficients.len()));
    }
    if scales.len() != names.len() {
        return Err(AuthorfoldError::dimension_mismatch("scales", names.len(), scales.len()));
    }
    let mut rows: Vec<CoefficientRow> = names
        .iter()
        .zip(coefficients)
        .zip(scales)
        .map(|((term, &coefficient), &scale)| CoefficientRow {
            term: term.clone(),
            coefficient,
            normalized: coefficient / scale,
        })
        .collect();
    rows.sort_by(|a, b| a.coefficient.total_cmp(&b.coefficient).then_with(|| a.term.cmp(&b.term)));
    Ok(rows)
}

/// Writes the coefficient CSV (`term,coefficient,normalized`).
///
/// # Errors
///
/// Returns an error on write failure.
pub fn write_coefficients<W: Write>(out: W, rows: &[CoefficientRow]) -> Result<()> {
    let mut out = BufWriter::new(out);
    writeln!(out, "term,coefficient,normalized")?;
    for row in rows {
        writeln!(out, "{},{},{}", csv_field(&row.term), row.coefficient, row.normalized)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes `term<TAB>score` lines, in the given order.
///
/// # Errors
///
/// Returns an error on write failure.
pub fn write_term_scores<W: Write>(out: W, scores: &[(String, f64)]) -> Result<()> {
    let mut out = BufWriter::new(out);
    for (term, score) in scores {
        writeln!(out, "{term}\t{score}")?;
    }
    out.flush()?;
    Ok(())
}

/// Creates `path` and hands it to `write`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or `write` fails.
pub fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(fs::File) -> Result<()>,
{
    write(fs::File::create(path)?)?;
    debug!(path = %path.display(), "report written");
    Ok(())
}
