//! Integration tests for the matrix parameter variants

use ndarray::{array, Array1, Array2};
use paramflat_rs::{
    flatten, orthogonal, positive_definite, positive_definite_with_margin, positive_semidefinite,
    resolve, value_flatten, Value,
};

use crate::test_helpers::{matrix_approx_eq, random_matrix, random_spd, test_rng};

fn resolved_matrix(value: &Value) -> Array2<f64> {
    resolve(value).unwrap().as_matrix().unwrap()
}

#[test]
fn test_positive_definite_recovers_input() {
    let mut rng = test_rng(17);

    for n in [1, 2, 4, 7] {
        let m = random_spd(&mut rng, n);
        let param = positive_definite(&m).unwrap();
        assert!(matrix_approx_eq(&resolved_matrix(&param), &m, 1e-8));
    }
}

#[test]
fn test_positive_semidefinite_recovers_input() {
    let mut rng = test_rng(18);
    let m = random_spd(&mut rng, 3);
    let param = positive_semidefinite(&m).unwrap();
    assert!(matrix_approx_eq(&resolved_matrix(&param), &m, 1e-8));
}

#[test]
fn test_positive_definite_flatten_length() {
    let mut rng = test_rng(19);
    let m = random_spd(&mut rng, 4);
    let param = positive_definite(&m).unwrap();

    let (vector, unflatten) = flatten(&param);
    // Packed lower triangle of a 4x4 matrix.
    assert_eq!(vector.len(), 10);
    assert_eq!(unflatten.unflatten(&vector).unwrap(), param);
}

#[test]
fn test_zeroed_packed_vector_still_definite() {
    let mut rng = test_rng(20);
    let m = random_spd(&mut rng, 3);
    let param = positive_definite_with_margin(&m, 1e-9).unwrap();

    let (vector, unflatten) = value_flatten(&param);
    let zeros = Array1::zeros(vector.len());
    let resolved = unflatten.unflatten(&zeros).unwrap().as_matrix().unwrap();

    // eps * I: strictly positive definite by construction.
    assert!(matrix_approx_eq(
        &resolved,
        &(Array2::eye(3) * 1e-9),
        1e-15
    ));
}

#[test]
fn test_arbitrary_packed_vector_resolves_psd() {
    let mut rng = test_rng(21);
    let m = random_spd(&mut rng, 3);
    let param = positive_semidefinite(&m).unwrap();

    let (vector, unflatten) = value_flatten(&param);
    // A deliberately hostile vector of mixed signs.
    let hostile = Array1::from_vec((0..vector.len()).map(|i| (i as f64) - 2.5).collect());
    let resolved = unflatten.unflatten(&hostile).unwrap().as_matrix().unwrap();

    // L * L^T is symmetric with nonnegative quadratic forms.
    assert!(matrix_approx_eq(&resolved, &resolved.t().to_owned(), 1e-12));
    let probe = array![1.0, -1.0, 0.5];
    let quad = probe.dot(&resolved.dot(&probe));
    assert!(quad >= -1e-12);
}

#[test]
fn test_positive_definite_construction_errors() {
    // Indefinite
    assert!(positive_definite(&array![[1.0, 2.0], [2.0, 1.0]]).is_err());
    // Asymmetric
    assert!(positive_definite(&array![[2.0, 1.0], [0.0, 2.0]]).is_err());
    // Non-square
    assert!(positive_definite(&array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).is_err());
    // Non-positive margin
    let m = array![[2.0, 0.0], [0.0, 2.0]];
    assert!(positive_definite_with_margin(&m, 0.0).is_err());
    assert!(positive_definite_with_margin(&m, -1e-6).is_err());
}

#[test]
fn test_orthogonal_projection_is_orthonormal() {
    let mut rng = test_rng(22);

    for (nrows, ncols) in [(2, 2), (4, 4), (5, 3)] {
        let x = random_matrix(&mut rng, nrows, ncols);
        let param = orthogonal(x).unwrap();
        let q = resolved_matrix(&param);
        assert_eq!(q.dim(), (nrows, ncols));

        let gram = q.t().dot(&q);
        assert!(matrix_approx_eq(&gram, &Array2::eye(ncols), 1e-9));
    }
}

#[test]
fn test_orthogonal_projection_idempotent() {
    let mut rng = test_rng(23);
    let x = random_matrix(&mut rng, 4, 4);

    let once = resolved_matrix(&orthogonal(x).unwrap());
    let twice = resolved_matrix(&orthogonal(once.clone()).unwrap());
    assert!(matrix_approx_eq(&once, &twice, 1e-9));
}

#[test]
fn test_orthogonal_flattens_raw_elements() {
    let x = array![[2.0, 0.0], [0.0, 0.5]];
    let param = orthogonal(x).unwrap();

    let (vector, unflatten) = flatten(&param);
    // Raw, intentionally overparameterized storage.
    assert_eq!(vector.to_vec(), vec![2.0, 0.0, 0.0, 0.5]);
    assert_eq!(unflatten.unflatten(&vector).unwrap(), param);
}

#[test]
fn test_orthogonal_retuned_through_vector() {
    let param = orthogonal(array![[1.0, 0.0], [0.0, 1.0]]).unwrap();
    let (vector, unflatten) = value_flatten(&param);

    // Perturb the raw matrix; the resolution must still be orthonormal.
    let perturbed = &vector + &Array1::from_vec(vec![0.3, -0.2, 0.1, 0.4]);
    let q = unflatten.unflatten(&perturbed).unwrap().as_matrix().unwrap();
    let gram = q.t().dot(&q);
    assert!(matrix_approx_eq(&gram, &Array2::eye(2), 1e-9));
}
