//! Feature vocabulary selection.
//!
//! Selection is a single explicit accumulation pass over the corpus that
//! returns an immutable [`Vocabulary`]. No counters outlive the call.
//!
//! Two policies are available:
//!
//! - [`SelectionPolicy::Frequency`]: rank terms by document frequency
//!   (number of documents containing the term), optionally skipping the most
//!   frequent `skip_top` terms, and keep the top `k`.
//! - [`SelectionPolicy::BiNormalSeparation`]: rank frequent candidates by how
//!   well they separate the two classes (Forman's bi-normal separation) and
//!   keep the top `k`.
//!
//! Ties are always broken by ascending term, so identical input yields an
//! identical ordered vocabulary.
//!
//! # Example
//!
//! ```
//! use authorfold::vocabulary::{TermCounts, VocabularySelector};
//!
//! let docs: Vec<TermCounts> = vec![
//!     [("the", 10), ("whale", 2)].iter().map(|(t, c)| (t.to_string(), *c)).collect(),
//!     [("the", 7), ("sea", 1)].iter().map(|(t, c)| (t.to_string(), *c)).collect(),
//! ];
//! let refs: Vec<&TermCounts> = docs.iter().collect();
//!
//! let selection = VocabularySelector::frequency(2).select(&refs, &[]).expect("valid input");
//! assert_eq!(selection.vocabulary().terms(), &["the".to_string(), "sea".to_string()]);
//! assert!(!selection.is_underflow());
//! ```

mod bns;

pub use bns::{binormal_score, probit};

use crate::error::{AuthorfoldError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Raw term to occurrence-count mapping for one document.
pub type TermCounts = HashMap<String, u64>;

/// Returns true when `term` may become a feature column.
///
/// Eligible terms start with an alphabetic character and are at least
/// `min_len` characters long. Punctuation and numerals still count towards a
/// document's total word count, they just never become features.
#[must_use]
pub fn is_eligible_term(term: &str, min_len: usize) -> bool {
    term.chars().next().is_some_and(char::is_alphabetic) && term.chars().count() >= min_len
}

/// Ordered sequence of distinct terms used as feature columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from an ordered term list.
    ///
    /// # Errors
    ///
    /// Returns an error if a term appears more than once.
    pub fn new(terms: Vec<String>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(terms.len());
        for (idx, term) in terms.iter().enumerate() {
            if positions.insert(term.clone(), idx).is_some() {
                return Err(AuthorfoldError::Other(format!(
                    "duplicate vocabulary term '{term}'"
                )));
            }
        }
        Ok(Self { terms, positions })
    }

    /// Terms in column order.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Column index of `term`, if it is part of the vocabulary.
    #[must_use]
    pub fn position(&self, term: &str) -> Option<usize> {
        self.positions.get(term).copied()
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the vocabulary has no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// How candidate terms are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Descending document frequency.
    Frequency,
    /// Descending bi-normal separation score between the two classes.
    Binormal,
}

/// Result of a selection pass.
#[derive(Debug, Clone)]
pub struct Selection {
    vocabulary: Vocabulary,
    requested: usize,
    term_scores: Option<Vec<(String, f64)>>,
}

impl Selection {
    /// The selected vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Consumes the selection, keeping only the vocabulary.
    #[must_use]
    pub fn into_vocabulary(self) -> Vocabulary {
        self.vocabulary
    }

    /// Vocabulary size that was asked for.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// True when fewer terms were available than requested.
    #[must_use]
    pub fn is_underflow(&self) -> bool {
        self.vocabulary.len() < self.requested
    }

    /// Every scored candidate, best first. Only bi-normal selection
    /// produces scores.
    #[must_use]
    pub fn term_scores(&self) -> Option<&[(String, f64)]> {
        self.term_scores.as_deref()
    }
}

/// Chooses an ordered vocabulary of at most `size` terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularySelector {
    size: usize,
    policy: SelectionPolicy,
    skip_top: usize,
    candidate_pool: Option<usize>,
    min_term_len: usize,
}

impl VocabularySelector {
    /// Creates a selector for `size` terms with the given policy.
    #[must_use]
    pub fn new(size: usize, policy: SelectionPolicy) -> Self {
        Self {
            size,
            policy,
            skip_top: 0,
            candidate_pool: None,
            min_term_len: 1,
        }
    }

    /// Frequency selection of `size` terms.
    #[must_use]
    pub fn frequency(size: usize) -> Self {
        Self::new(size, SelectionPolicy::Frequency)
    }

    /// Bi-normal separation selection of `size` terms.
    #[must_use]
    pub fn binormal(size: usize) -> Self {
        Self::new(size, SelectionPolicy::Binormal)
    }

    /// Drops the `skip_top` most frequent terms before anything else
    /// (stop-word suppression).
    #[must_use]
    pub fn with_skip_top(mut self, skip_top: usize) -> Self {
        self.skip_top = skip_top;
        self
    }

    /// Limits bi-normal scoring to the `pool` most frequent terms.
    #[must_use]
    pub fn with_candidate_pool(mut self, pool: usize) -> Self {
        self.candidate_pool = Some(pool);
        self
    }

    /// Minimum term length, in characters.
    #[must_use]
    pub fn with_min_term_len(mut self, min_len: usize) -> Self {
        self.min_term_len = min_len;
        self
    }

    /// Selection policy.
    #[must_use]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Selects the vocabulary.
    ///
    /// `labels` holds one class label (0 or 1) per document and is only read
    /// by bi-normal selection; frequency selection accepts an empty slice.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero, or if bi-normal selection gets
    /// mismatched or non-binary labels, or only one class.
    pub fn select(&self, documents: &[&TermCounts], labels: &[f64]) -> Result<Selection> {
        if self.size == 0 {
            return Err(AuthorfoldError::invalid_param("vocab_size", 0, "> 0"));
        }

        let ranked = self.ranked_by_frequency(documents);
        let candidates: Vec<String> = ranked
            .into_iter()
            .skip(self.skip_top)
            .map(|(term, _)| term)
            .collect();

        let (terms, term_scores) = match self.policy {
            SelectionPolicy::Frequency => {
                let terms: Vec<String> = candidates.into_iter().take(self.size).collect();
                (terms, None)
            }
            SelectionPolicy::Binormal => {
                let pool = self.candidate_pool.unwrap_or(candidates.len());
                let candidates: Vec<String> = candidates.into_iter().take(pool).collect();
                let scores = bns::score_terms(&candidates, documents, labels)?;
                let terms = scores.iter().take(self.size).map(|(t, _)| t.clone()).collect();
                (terms, Some(scores))
            }
        };

        if terms.len() < self.size {
            warn!(
                requested = self.size,
                available = terms.len(),
                "vocabulary underflow: using every available term"
            );
        }
        debug!(policy = ?self.policy, terms = terms.len(), "vocabulary selected");

        Ok(Selection {
            vocabulary: Vocabulary::new(terms)?,
            requested: self.size,
            term_scores,
        })
    }

    /// Eligible terms with their document frequency, most frequent first.
    fn ranked_by_frequency(&self, documents: &[&TermCounts]) -> Vec<(String, usize)> {
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            for (term, &count) in doc.iter() {
                if count > 0 && is_eligible_term(term, self.min_term_len) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = doc_freq
            .into_iter()
            .map(|(term, df)| (term.to_string(), df))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}
