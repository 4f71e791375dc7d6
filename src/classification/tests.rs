use super::*;

fn separable() -> (Matrix<f64>, Vec<f64>) {
    let x = Matrix::from_vec(
        6,
        2,
        vec![
            -2.0, -1.0, //
            -1.5, -0.5, //
            -1.0, -1.5, //
            1.0, 1.5, //
            1.5, 0.5, //
            2.0, 1.0,
        ],
    )
    .expect("valid");
    (x, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
}

#[test]
fn test_sigmoid_is_stable() {
    assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    assert!(sigmoid(800.0) <= 1.0);
    assert!(sigmoid(-800.0) >= 0.0);
    assert!(sigmoid(-800.0).is_finite());
}

#[test]
fn test_separable_probabilities() {
    let (x, y) = separable();
    let model = LogisticRegression::new(1.0).fit(&x, &y).expect("fit succeeds");

    for (row, &label) in x.rows().zip(&y) {
        let p = model.predict(row).expect("two features");
        assert!((0.0..=1.0).contains(&p));
        if label == 1.0 {
            assert!(p > 0.5, "positive row scored {p}");
        } else {
            assert!(p < 0.5, "negative row scored {p}");
        }
    }
}

#[test]
fn test_tiny_c_pulls_towards_base_rate() {
    let (x, y) = separable();
    let model = LogisticRegression::new(1e-6).fit(&x, &y).expect("fit succeeds");
    for w in model.coefficients() {
        assert!(w.abs() < 1e-3, "coefficient {w} should be shrunk");
    }
    // Balanced classes: unpenalized intercept settles at logit(0.5) = 0
    let p = model.predict(&[2.0, 2.0]).expect("two features");
    assert!((p - 0.5).abs() < 0.01);
}

#[test]
fn test_larger_c_gives_larger_weights() {
    let (x, y) = separable();
    let weak = LogisticRegression::new(0.01).fit(&x, &y).expect("fit succeeds");
    let strong = LogisticRegression::new(10.0).fit(&x, &y).expect("fit succeeds");
    let norm = |m: &LogisticModel| m.coefficients().iter().map(|w| w * w).sum::<f64>();
    assert!(norm(&strong) > norm(&weak));
}

#[test]
fn test_rejects_single_class() {
    let x = Matrix::zeros(3, 1);
    let err = LogisticRegression::new(1.0)
        .fit(&x, &[1.0, 1.0, 1.0])
        .unwrap_err();
    assert!(err.to_string().contains("single class"));
}

#[test]
fn test_rejects_non_binary_labels() {
    let x = Matrix::zeros(2, 1);
    assert!(LogisticRegression::new(1.0).fit(&x, &[0.0, 2.0]).is_err());
}

#[test]
fn test_rejects_bad_c() {
    let (x, y) = separable();
    for c in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = LogisticRegression::new(c).fit(&x, &y).unwrap_err();
        assert!(matches!(err, AuthorfoldError::InvalidHyperparameter { .. }));
    }
}

#[test]
fn test_iteration_cap_respected() {
    let (x, y) = separable();
    let model = LogisticRegression::new(100.0)
        .with_max_iter(5)
        .with_tolerance(0.0)
        .fit(&x, &y)
        .expect("fit succeeds");
    assert_eq!(model.iterations(), 5);
}

#[test]
fn test_predict_width_mismatch() {
    let (x, y) = separable();
    let model = LogisticRegression::new(1.0).fit(&x, &y).expect("fit succeeds");
    assert!(model.predict(&[1.0]).is_err());
}

#[test]
fn test_adapter_metadata() {
    let clf = LogisticRegression::new(0.5);
    assert_eq!(clf.task(), Task::Classification);
    assert!((clf.regularization() - 0.5).abs() < 1e-12);
    assert!((clf.c() - 0.5).abs() < 1e-12);
}
