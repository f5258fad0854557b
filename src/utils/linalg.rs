//! Dense linear algebra kernels for the matrix parameter variants.
//!
//! This module provides the small set of factorizations the parameter system
//! needs: a Cholesky decomposition for positive-definite seeding, packed
//! lower-triangular storage, and a one-sided Jacobi orthogonal projection for
//! the orthogonal variant.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{ParamFlatError, Result};

/// Calculate the Cholesky decomposition of a positive definite matrix.
///
/// Computes the lower triangular factor L such that A = L * L^T.
///
/// # Arguments
///
/// * `a` - The input matrix (must be square and positive definite)
///
/// # Returns
///
/// * The lower triangular Cholesky factor, or an error if the matrix is not
///   square or not positive definite
pub(crate) fn cholesky_decomposition(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.shape()[0];
    if a.shape()[1] != n {
        return Err(ParamFlatError::DimensionMismatch(format!(
            "Matrix must be square, got shape {:?}",
            a.shape()
        )));
    }

    let mut l: Array2<f64> = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;

            if j == i {
                // Diagonal element
                for k in 0..j {
                    sum += l[[j, k]].powi(2);
                }

                let val = a[[j, j]] - sum;
                if val <= 0.0 {
                    return Err(ParamFlatError::NotPositiveDefinite(format!(
                        "pivot at position ({}, {}) is not positive",
                        j, j
                    )));
                }

                l[[j, j]] = val.sqrt();
            } else {
                // Off-diagonal element
                for k in 0..j {
                    sum += l[[i, k]] * l[[j, k]];
                }

                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Ok(l)
}

/// Number of entries in the packed lower triangle of an n x n matrix.
pub(crate) fn packed_length(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Pack the lower triangle (diagonal included) of a square matrix row by row.
pub(crate) fn pack_lower_triangular(l: &Array2<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut packed = Array1::zeros(packed_length(n));

    let mut idx = 0;
    for i in 0..n {
        for j in 0..=i {
            packed[idx] = l[[i, j]];
            idx += 1;
        }
    }

    packed
}

/// Expand a packed lower triangle back into a full square matrix.
///
/// The strict upper triangle of the result is zero.
pub(crate) fn unpack_lower_triangular(packed: &ArrayView1<f64>, n: usize) -> Array2<f64> {
    debug_assert_eq!(packed.len(), packed_length(n));
    let mut l = Array2::zeros((n, n));

    let mut idx = 0;
    for i in 0..n {
        for j in 0..=i {
            l[[i, j]] = packed[idx];
            idx += 1;
        }
    }

    l
}

/// Check that a square matrix is symmetric within a small tolerance.
pub(crate) fn check_symmetric(a: &Array2<f64>) -> Result<()> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(ParamFlatError::DimensionMismatch(format!(
            "Matrix must be square, got shape {:?}",
            a.shape()
        )));
    }

    let scale = a.iter().fold(1.0f64, |acc, &v| acc.max(v.abs()));
    for i in 0..n {
        for j in 0..i {
            if (a[[i, j]] - a[[j, i]]).abs() > 1e-8 * scale {
                return Err(ParamFlatError::InvalidParameter(format!(
                    "matrix is not symmetric at ({}, {})",
                    i, j
                )));
            }
        }
    }

    Ok(())
}

/// Project a matrix onto the nearest orthonormal factor in Frobenius norm.
///
/// Computes the polar factor U * V^T of the thin SVD X = U * S * V^T using
/// one-sided Jacobi rotations. The input must have full column (or, for wide
/// matrices, full row) rank; projection of an already-orthogonal matrix
/// returns it up to numerical tolerance.
///
/// # Arguments
///
/// * `x` - The matrix to project (any shape with at least one row and column)
///
/// # Returns
///
/// * The orthonormal projection, or an error for empty or rank-deficient input
pub(crate) fn polar_factor(x: &Array2<f64>) -> Result<Array2<f64>> {
    let (m, n) = x.dim();
    if m == 0 || n == 0 {
        return Err(ParamFlatError::DimensionMismatch(
            "cannot project an empty matrix".to_string(),
        ));
    }

    // Jacobi sweeps assume at least as many rows as columns; the polar factor
    // of the transpose is the transpose of the polar factor.
    if m < n {
        let projected = polar_factor(&x.t().to_owned())?;
        return Ok(projected.t().to_owned());
    }

    let mut u = x.clone();
    let mut v: Array2<f64> = Array2::eye(n);

    let tol = 1e-14;
    let max_sweeps = 60;

    for _ in 0..max_sweeps {
        let mut rotated = false;

        for p in 0..n {
            for q in (p + 1)..n {
                let alpha = u.column(p).dot(&u.column(p));
                let beta = u.column(q).dot(&u.column(q));
                let gamma = u.column(p).dot(&u.column(q));

                if gamma.abs() <= tol * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                // Rotation angle that annihilates the (p, q) column product.
                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = if zeta >= 0.0 {
                    1.0 / (zeta + (1.0 + zeta * zeta).sqrt())
                } else {
                    -1.0 / (-zeta + (1.0 + zeta * zeta).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;

                for i in 0..m {
                    let up = u[[i, p]];
                    let uq = u[[i, q]];
                    u[[i, p]] = c * up - s * uq;
                    u[[i, q]] = s * up + c * uq;
                }

                for i in 0..n {
                    let vp = v[[i, p]];
                    let vq = v[[i, q]];
                    v[[i, p]] = c * vp - s * vq;
                    v[[i, q]] = s * vp + c * vq;
                }
            }
        }

        if !rotated {
            break;
        }
    }

    // Normalize the rotated columns; a vanishing norm means the input had
    // deficient rank and the projection is not unique.
    let scale = x.iter().fold(0.0f64, |acc, &v| acc.max(v.abs())).max(1.0);
    for j in 0..n {
        let norm = u.column(j).dot(&u.column(j)).sqrt();
        if norm <= scale * (m as f64) * f64::EPSILON {
            return Err(ParamFlatError::InvalidComputation(format!(
                "matrix is rank deficient (singular value {} vanishes)",
                j
            )));
        }

        for i in 0..m {
            u[[i, j]] /= norm;
        }
    }

    Ok(u.dot(&v.t()))
}
