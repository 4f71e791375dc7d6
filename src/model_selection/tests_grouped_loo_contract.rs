// =========================================================================
// FALSIFY-GL: grouped leave-one-out contract
//
// A document's training fold never holds the document, its co-authored
// documents, or banned documents. Deletion by descending position agrees
// with membership filtering. Fold statistics never see excluded rows.
// =========================================================================

use super::*;
use crate::features::FeatureMatrix;
use crate::linear_model::Ridge;
use crate::preprocessing::FoldNormalizer;
use crate::primitives::Matrix;
use proptest::prelude::*;
use std::collections::HashSet;

fn corpus_strategy() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    (1usize..24).prop_flat_map(|n| {
        (
            proptest::collection::vec(0u8..6, n),
            proptest::collection::vec(0..n, 0..4),
        )
    })
}

/// FALSIFY-GL-001: Exclusion lists are strictly descending
#[test]
fn falsify_gl_001_lists_strictly_descending() {
    let groups = ExclusionGroups::build(&[1, 2, 1, 1, 3, 1], &[4, 0]).expect("valid");
    for i in 0..groups.len() {
        let list = groups.excluded(i);
        assert!(
            list.windows(2).all(|w| w[0] > w[1]),
            "FALSIFIED GL-001: list {i} = {list:?}"
        );
    }
}

/// FALSIFY-GL-002: Unique authors with no bans exclude nothing
#[test]
fn falsify_gl_002_unique_authors_exclude_nothing() {
    let groups = ExclusionGroups::build(&["a", "b", "c"], &[]).expect("valid");
    for i in 0..3 {
        assert!(groups.excluded(i).is_empty(), "FALSIFIED GL-002: doc {i}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// FALSIFY-GL-003: No leakage of self, co-authors or banned documents
    #[test]
    fn falsify_gl_003_no_leakage((authors, banned) in corpus_strategy()) {
        let groups = ExclusionGroups::build(&authors, &banned).expect("in range");
        let banned: HashSet<usize> = banned.into_iter().collect();
        for i in 0..authors.len() {
            let keep = groups.keep_mask(i);
            for (j, kept) in keep.iter().enumerate() {
                let must_drop = j == i || authors[j] == authors[i] || banned.contains(&j);
                prop_assert_eq!(*kept, !must_drop, "doc {} row {}", i, j);
            }
            prop_assert!(!groups.excluded(i).contains(&i));
        }
    }

    /// FALSIFY-GL-004: Descending deletion equals membership filtering
    #[test]
    fn falsify_gl_004_deletion_order_agrees_with_filter(
        (authors, banned) in corpus_strategy(),
        seed in any::<u64>(),
    ) {
        let labels: Vec<u64> = (0..authors.len() as u64).map(|k| k.wrapping_mul(seed | 1)).collect();
        let groups = ExclusionGroups::build(&authors, &banned).expect("in range");
        for i in 0..authors.len() {
            let excluded = groups.excluded(i);
            let deleted = remove_descending(&labels, excluded).expect("descending");
            let filtered: Vec<u64> = labels
                .iter()
                .enumerate()
                .filter(|(j, _)| !excluded.contains(j))
                .map(|(_, v)| *v)
                .collect();
            prop_assert_eq!(deleted, filtered);
        }
    }

    /// FALSIFY-GL-005: The engine's fold targets match descending deletion of
    /// the exclusion list plus the held-out row
    #[test]
    fn falsify_gl_005_split_matches_deletion((authors, banned) in corpus_strategy()) {
        let n = authors.len();
        let x = Matrix::from_vec(n, 1, (0..n).map(|v| v as f64).collect()).expect("valid");
        let features = FeatureMatrix::new(x, false);
        let targets: Vec<f64> = (0..n).map(|v| v as f64 * 10.0).collect();
        let ids: Vec<String> = (0..n).map(|v| v.to_string()).collect();
        let groups = ExclusionGroups::build(&authors, &banned).expect("in range");
        let data = FoldData::new(&features, &targets, &ids, &groups).expect("aligned");
        let engine = GroupedLeaveOneOut::new(Ridge::new(1.0), 1e-6);

        for i in 0..n {
            let mut positions: Vec<usize> = groups.excluded(i).to_vec();
            positions.push(i);
            positions.sort_unstable_by(|a, b| b.cmp(a));
            let expected = remove_descending(&targets, &positions).expect("descending");
            let split = engine.split(&data, i).expect("in range");
            prop_assert_eq!(&split.targets, &expected);
            prop_assert_eq!(split.train.column(0), expected.iter().map(|t| t / 10.0).collect::<Vec<_>>());
            prop_assert_eq!(split.test, vec![i as f64]);
        }
    }

    /// FALSIFY-GL-006: Perturbing an excluded document leaves the fold's
    /// statistics unchanged
    #[test]
    fn falsify_gl_006_excluded_rows_do_not_move_statistics(
        (authors, banned) in corpus_strategy(),
        noise in -1e3f64..1e3,
    ) {
        let n = authors.len();
        let base: Vec<f64> = (0..n * 2).map(|v| (v as f64 * 0.37).sin()).collect();
        let targets = vec![0.0; n];
        let ids: Vec<String> = (0..n).map(|v| v.to_string()).collect();
        let groups = ExclusionGroups::build(&authors, &banned).expect("in range");
        let engine = GroupedLeaveOneOut::new(Ridge::new(1.0), 1e-6);
        let normalizer = FoldNormalizer::new(1e-6);

        for i in 0..n {
            let mut perturbed = base.clone();
            // Held-out row and every excluded row get noise
            for j in std::iter::once(i).chain(groups.excluded(i).iter().copied()) {
                perturbed[j * 2] += noise;
                perturbed[j * 2 + 1] -= noise;
            }

            let a = FeatureMatrix::new(Matrix::from_vec(n, 2, base.clone()).expect("valid"), false);
            let b = FeatureMatrix::new(Matrix::from_vec(n, 2, perturbed).expect("valid"), false);
            let data_a = FoldData::new(&a, &targets, &ids, &groups).expect("aligned");
            let data_b = FoldData::new(&b, &targets, &ids, &groups).expect("aligned");

            let split_a = engine.split(&data_a, i).expect("in range");
            let split_b = engine.split(&data_b, i).expect("in range");
            if split_a.train.n_rows() == 0 {
                continue;
            }
            let stats_a = normalizer.fit(&split_a.train).expect("non-empty");
            let stats_b = normalizer.fit(&split_b.train).expect("non-empty");
            prop_assert_eq!(stats_a, stats_b);
        }
    }
}
