pub(crate) use super::*;

#[test]
fn test_from_vec() {
    let m: Matrix<f64> = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    assert_eq!(m.shape(), (2, 3));
    assert!((m.get(0, 0) - 1.0).abs() < 1e-12);
    assert!((m.get(1, 2) - 6.0).abs() < 1e-12);
}

#[test]
fn test_from_vec_error() {
    let result = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0]);
    assert!(result.is_err());
}

#[test]
fn test_from_rows() {
    let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
    let m = Matrix::from_rows(2, &rows).expect("rows have equal length");
    assert_eq!(m.shape(), (3, 2));
    assert_eq!(m.row(2), &[5.0, 6.0]);
}

#[test]
fn test_from_rows_ragged() {
    let rows = vec![vec![1.0, 2.0], vec![3.0]];
    assert!(Matrix::from_rows(2, &rows).is_err());
}

#[test]
fn test_from_rows_empty_keeps_width() {
    let rows: Vec<Vec<f64>> = Vec::new();
    let m = Matrix::from_rows(4, &rows).expect("empty is fine");
    assert_eq!(m.shape(), (0, 4));
    assert_eq!(m.rows().count(), 0);
}

#[test]
fn test_zeros() {
    let m = Matrix::zeros(2, 3);
    assert_eq!(m.shape(), (2, 3));
    assert!(m.as_slice().iter().all(|&x| x == 0.0));
}

#[test]
fn test_transpose() {
    let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .expect("test data has correct dimensions: 2*3=6 elements");
    let t = m.transpose();
    assert_eq!(t.shape(), (3, 2));
    assert!((t.get(0, 1) - 4.0).abs() < 1e-12);
    assert!((t.get(2, 1) - 6.0).abs() < 1e-12);
}

#[test]
fn test_column() {
    let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("valid");
    assert_eq!(m.column(1), vec![2.0, 5.0]);
}

#[test]
fn test_select_rows_preserves_order() {
    let m = Matrix::from_vec(4, 2, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5]).expect("valid");
    let sub = m
        .select_rows(&[true, false, true, true])
        .expect("mask matches rows");
    assert_eq!(sub.shape(), (3, 2));
    assert_eq!(sub.row(0), &[0.0, 0.5]);
    assert_eq!(sub.row(1), &[2.0, 2.5]);
    assert_eq!(sub.row(2), &[3.0, 3.5]);
    // Source untouched
    assert_eq!(m.n_rows(), 4);
}

#[test]
fn test_select_rows_mask_length() {
    let m = Matrix::zeros(3, 1);
    assert!(m.select_rows(&[true, false]).is_err());
}

#[test]
fn test_matmul() {
    let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("valid");
    let b = Matrix::from_vec(2, 2, vec![5.0, 6.0, 7.0, 8.0]).expect("valid");
    let c = a.matmul(&b).expect("dimensions match");
    assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
}

#[test]
fn test_matmul_dimension_error() {
    let a = Matrix::zeros(2, 3);
    let b = Matrix::zeros(2, 3);
    assert!(a.matmul(&b).is_err());
}

#[test]
fn test_matvec() {
    let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("valid");
    let v = a.matvec(&[1.0, 0.0, -1.0]).expect("dimensions match");
    assert_eq!(v, vec![-2.0, -2.0]);
}

#[test]
fn test_cholesky_solve() {
    // [[4, 2], [2, 3]] x = [2, 1] -> x = [0.5, 0]
    let a = Matrix::from_vec(2, 2, vec![4.0, 2.0, 2.0, 3.0]).expect("valid");
    let x = a.cholesky_solve(&[2.0, 1.0]).expect("positive definite");
    assert!((x[0] - 0.5).abs() < 1e-10);
    assert!(x[1].abs() < 1e-10);
}

#[test]
fn test_cholesky_not_positive_definite() {
    let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 2.0, 1.0]).expect("valid");
    let err = a.cholesky_solve(&[1.0, 1.0]).unwrap_err();
    assert!(matches!(err, AuthorfoldError::SingularMatrix(_)));
}

#[test]
fn test_set_and_row_mut() {
    let mut m = Matrix::zeros(2, 2);
    m.set(0, 1, 3.0);
    m.row_mut(1)[0] = 7.0;
    assert_eq!(m.as_slice(), &[0.0, 3.0, 7.0, 0.0]);
}

#[test]
fn test_dot() {
    assert!((dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-12);
}
