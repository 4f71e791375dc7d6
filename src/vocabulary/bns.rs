//! Bi-normal separation scoring.
//!
//! For a term, every document is a "detection" when its count of the term
//! exceeds the term's mean count over all documents (absent counts as zero).
//! With tpr the detection rate among positive documents and fpr the rate
//! among negatives, the score is |Φ⁻¹(tpr) − Φ⁻¹(fpr)|.
//!
//! These are the textbook rates: tp counts positive documents above the
//! mean and fp counts negative documents above the mean, each divided by
//! its class size. Formulations that count fp differently (for example as
//! positives at or below the mean) rank terms differently, so scores are
//! not comparable across them.
//!
//! Φ⁻¹ is undefined at 0 and 1. A rate of exactly 0 or 1, or any other
//! non-finite result, scores 0.

use super::TermCounts;
use crate::error::{AuthorfoldError, Result};
use std::collections::HashMap;

/// Inverse standard-normal CDF (probit), or `None` outside the open
/// interval (0, 1).
///
/// Uses Acklam's rational approximation (relative error below 1.15e-9).
#[must_use]
pub fn probit(p: f64) -> Option<f64> {
    if !(p > 0.0 && p < 1.0) {
        return None;
    }

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let z = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    };
    Some(z)
}

/// Bi-normal separation from detection rates, 0 when undefined.
#[must_use]
pub fn binormal_score(tpr: f64, fpr: f64) -> f64 {
    match (probit(tpr), probit(fpr)) {
        (Some(a), Some(b)) => {
            let score = (a - b).abs();
            if score.is_finite() {
                score
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Scores `candidates` against the class split in `labels`, best first with
/// ties broken by ascending term.
pub(super) fn score_terms(
    candidates: &[String],
    documents: &[&TermCounts],
    labels: &[f64],
) -> Result<Vec<(String, f64)>> {
    if labels.len() != documents.len() {
        return Err(AuthorfoldError::dimension_mismatch(
            "class labels",
            documents.len(),
            labels.len(),
        ));
    }
    if labels.iter().any(|&l| l != 0.0 && l != 1.0) {
        return Err("binormal selection needs 0/1 class labels".into());
    }
    let n_pos = labels.iter().filter(|&&l| l == 1.0).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err("binormal selection needs documents from both classes".into());
    }

    // Per-term (count, is_positive) pairs for documents that contain it;
    // every other document contributes an implicit zero.
    let mut postings: HashMap<&str, Vec<(u64, bool)>> =
        candidates.iter().map(|t| (t.as_str(), Vec::new())).collect();
    for (doc, &label) in documents.iter().zip(labels) {
        for (term, &count) in doc.iter() {
            if let Some(list) = postings.get_mut(term.as_str()) {
                list.push((count, label == 1.0));
            }
        }
    }

    let total = labels.len() as f64;
    let mut scores: Vec<(String, f64)> = candidates
        .iter()
        .map(|term| {
            let list = postings.get(term.as_str()).map_or(&[][..], Vec::as_slice);
            let mean = list.iter().map(|&(c, _)| c as f64).sum::<f64>() / total;
            let mut tp = 0usize;
            let mut fp = 0usize;
            for &(count, positive) in list {
                if count as f64 > mean {
                    if positive {
                        tp += 1;
                    } else {
                        fp += 1;
                    }
                }
            }
            let tpr = tp as f64 / n_pos as f64;
            let fpr = fp as f64 / n_neg as f64;
            (term.clone(), binormal_score(tpr, fpr))
        })
        .collect();

    scores.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(scores)
}
