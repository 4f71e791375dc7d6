//! Author-grouped exclusion lists.
//!
//! For document `i`, the exclusion list holds every other document by the
//! same author plus every globally banned document, deduplicated and sorted
//! in strictly descending order. Document `i` itself is never in its own
//! list: it is the held-out row and is dropped from the fold separately.

use crate::error::{AuthorfoldError, Result};
use std::collections::HashMap;
use std::hash::Hash;

/// Per-document exclusion lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionGroups {
    lists: Vec<Vec<usize>>,
    banned: Vec<bool>,
}

impl ExclusionGroups {
    /// Builds exclusion lists from per-document authors and banned indices.
    ///
    /// Runs one pass to map each author to its documents, then one lookup
    /// per document.
    ///
    /// # Errors
    ///
    /// Returns an error if a banned index is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use authorfold::model_selection::ExclusionGroups;
    ///
    /// let groups = ExclusionGroups::build(&["A", "B", "A", "C"], &[]).expect("valid indices");
    /// assert_eq!(groups.excluded(0), &[2]);
    /// assert_eq!(groups.excluded(2), &[0]);
    /// assert!(groups.excluded(1).is_empty());
    /// ```
    pub fn build<A: Eq + Hash>(authors: &[A], banned: &[usize]) -> Result<Self> {
        let n = authors.len();
        let mut is_banned = vec![false; n];
        for &idx in banned {
            if idx >= n {
                return Err(AuthorfoldError::Other(format!(
                    "banned index {idx} out of range for {n} documents"
                )));
            }
            is_banned[idx] = true;
        }

        let mut by_author: HashMap<&A, Vec<usize>> = HashMap::new();
        for (idx, author) in authors.iter().enumerate() {
            by_author.entry(author).or_default().push(idx);
        }

        let banned_desc: Vec<usize> = (0..n).rev().filter(|&j| is_banned[j]).collect();

        let lists = authors
            .iter()
            .enumerate()
            .map(|(i, author)| {
                let same_author = by_author.get(author).map_or(&[][..], Vec::as_slice);
                let mut list: Vec<usize> = same_author
                    .iter()
                    .chain(&banned_desc)
                    .copied()
                    .filter(|&j| j != i)
                    .collect();
                list.sort_unstable_by(|a, b| b.cmp(a));
                list.dedup();
                list
            })
            .collect();

        Ok(Self {
            lists,
            banned: is_banned,
        })
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether there are no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Indices excluded from document `index`'s training fold, descending.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn excluded(&self, index: usize) -> &[usize] {
        &self.lists[index]
    }

    /// Whether document `index` is banned from all training.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn is_banned(&self, index: usize) -> bool {
        self.banned[index]
    }

    /// Number of banned documents.
    #[must_use]
    pub fn banned_count(&self) -> usize {
        self.banned.iter().filter(|b| **b).count()
    }

    /// Row keep-mask for document `index`'s training fold: false for the
    /// document itself and everything it excludes.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn keep_mask(&self, index: usize) -> Vec<bool> {
        let mut keep = vec![true; self.lists.len()];
        keep[index] = false;
        for &j in &self.lists[index] {
            keep[j] = false;
        }
        keep
    }

    /// Keep-mask for a fit on every document that is not banned.
    #[must_use]
    pub fn trainable_mask(&self) -> Vec<bool> {
        self.banned.iter().map(|b| !b).collect()
    }
}

/// Deletes positions from a copy of `values`, one at a time.
///
/// `descending` must be sorted highest first, so each deletion leaves the
/// positions still to be deleted unshifted.
///
/// # Errors
///
/// Returns an error if `descending` is not strictly descending or holds an
/// out-of-range position.
pub fn remove_descending<T: Clone>(values: &[T], descending: &[usize]) -> Result<Vec<T>> {
    if descending.windows(2).any(|w| w[0] <= w[1]) {
        return Err("deletion positions must be strictly descending".into());
    }
    if descending.first().is_some_and(|&top| top >= values.len()) {
        return Err(AuthorfoldError::Other(format!(
            "deletion position out of range for {} values",
            values.len()
        )));
    }
    let mut out = values.to_vec();
    for &idx in descending {
        out.remove(idx);
    }
    Ok(out)
}

/// Copies the entries whose `keep` flag is set.
///
/// # Errors
///
/// Returns an error if the mask length differs from `values`.
pub fn select_by_mask<T: Clone>(values: &[T], keep: &[bool]) -> Result<Vec<T>> {
    if values.len() != keep.len() {
        return Err(AuthorfoldError::dimension_mismatch(
            "keep mask",
            values.len(),
            keep.len(),
        ));
    }
    Ok(values
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(v, _)| v.clone())
        .collect())
}
