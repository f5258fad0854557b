//! Matrix-valued parameter variants
//!
//! This module provides the `Orthogonal` and `PositiveDefinite` wrappers.
//! `Orthogonal` stores a raw, intentionally overparameterized matrix and
//! resolves by projecting onto the nearest orthonormal matrix.
//! `PositiveDefinite` stores a packed lower-triangular Cholesky-style vector
//! and resolves as `L * L^T (+ eps * I)`, so every internal state resolves to
//! a valid positive (semi)definite matrix.

use ndarray::{Array1, Array2};

use crate::error::{ParamFlatError, Result};
use crate::params::bounds::DEFAULT_INTERVAL_MARGIN;
use crate::utils::{
    check_symmetric, cholesky_decomposition, pack_lower_triangular, packed_length, polar_factor,
    unpack_lower_triangular,
};

/// A parameter constrained to be an orthonormal matrix.
///
/// The internal state is the raw matrix itself; resolution projects it onto
/// the nearest orthonormal matrix in Frobenius norm via the polar factor
/// `U * V^T` of its SVD. The projection is idempotent: resolving an
/// already-orthogonal matrix returns it up to numerical tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct Orthogonal {
    raw: Array2<f64>,
}

impl Orthogonal {
    /// Create an orthogonal parameter from a seed matrix.
    ///
    /// The seed need not be orthogonal; it only has to be finite, nonempty
    /// and of full (column or row) rank so the projection is well defined.
    ///
    /// # Arguments
    ///
    /// * `raw` - The seed matrix
    pub fn new(raw: Array2<f64>) -> Result<Self> {
        if raw.nrows() == 0 || raw.ncols() == 0 {
            return Err(ParamFlatError::DimensionMismatch(
                "orthogonal parameter requires a nonempty matrix".to_string(),
            ));
        }

        if raw.iter().any(|v| !v.is_finite()) {
            return Err(ParamFlatError::InvalidParameter(
                "orthogonal parameter requires finite entries".to_string(),
            ));
        }

        // Fail at construction, not at resolve time, if the projection is
        // undefined for this seed.
        polar_factor(&raw)?;

        Ok(Self { raw })
    }

    /// Rebuild from raw elements produced by an optimizer.
    pub(crate) fn from_raw(raw: Array2<f64>) -> Self {
        Self { raw }
    }

    /// The raw (possibly non-orthogonal) internal matrix.
    pub fn raw(&self) -> &Array2<f64> {
        &self.raw
    }

    /// The resolved orthonormal matrix.
    pub fn resolve(&self) -> Result<Array2<f64>> {
        polar_factor(&self.raw)
    }
}

/// A parameter constrained to be a positive (semi)definite matrix.
///
/// The internal state is a packed lower-triangular vector of length
/// `n * (n + 1) / 2`; resolution computes `L * L^T + eps * I`. With
/// `eps > 0` the result is strictly positive definite; with `eps = 0` any
/// packed vector, including all zeros, still resolves to a valid positive
/// semidefinite matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PositiveDefinite {
    packed: Array1<f64>,
    n: usize,
    eps: f64,
}

impl PositiveDefinite {
    /// Create a strictly positive definite parameter with the default margin
    /// (`1e-12`).
    ///
    /// # Arguments
    ///
    /// * `matrix` - The initial value; `matrix - eps * I` must be positive
    ///   definite
    pub fn new(matrix: &Array2<f64>) -> Result<Self> {
        Self::with_margin(matrix, DEFAULT_INTERVAL_MARGIN)
    }

    /// Create a strictly positive definite parameter with an explicit margin.
    ///
    /// # Arguments
    ///
    /// * `matrix` - The initial value
    /// * `eps` - Diagonal margin; must be positive and finite
    pub fn with_margin(matrix: &Array2<f64>, eps: f64) -> Result<Self> {
        if !eps.is_finite() || eps <= 0.0 {
            return Err(ParamFlatError::InvalidParameter(format!(
                "positive definite margin must be positive and finite, got {}",
                eps
            )));
        }

        Self::build(matrix, eps)
    }

    /// Create a positive semidefinite parameter (zero margin).
    ///
    /// Construction still requires the seed matrix itself to be positive
    /// definite so the Cholesky seeding is well defined; resolution of
    /// arbitrary internal states may land on the semidefinite boundary.
    pub fn semidefinite(matrix: &Array2<f64>) -> Result<Self> {
        Self::build(matrix, 0.0)
    }

    fn build(matrix: &Array2<f64>, eps: f64) -> Result<Self> {
        check_symmetric(matrix)?;
        let n = matrix.nrows();

        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(ParamFlatError::InvalidParameter(
                "positive definite parameter requires finite entries".to_string(),
            ));
        }

        // Seed the packed vector from the Cholesky factor of the
        // margin-reduced matrix.
        let mut shifted = matrix.clone();
        for i in 0..n {
            shifted[[i, i]] -= eps;
        }
        let l = cholesky_decomposition(&shifted)?;

        Ok(Self {
            packed: pack_lower_triangular(&l),
            n,
            eps,
        })
    }

    /// Rebuild from a packed vector produced by an optimizer.
    pub(crate) fn from_packed(packed: Array1<f64>, n: usize, eps: f64) -> Self {
        debug_assert_eq!(packed.len(), packed_length(n));
        Self { packed, n, eps }
    }

    /// The packed lower-triangular internal vector.
    pub fn packed(&self) -> &Array1<f64> {
        &self.packed
    }

    /// Side length of the resolved matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// The diagonal margin (zero for the semidefinite form).
    pub fn margin(&self) -> f64 {
        self.eps
    }

    /// The resolved positive (semi)definite matrix.
    pub fn resolve(&self) -> Array2<f64> {
        let l = unpack_lower_triangular(&self.packed.view(), self.n);
        let mut result = l.dot(&l.t());

        for i in 0..self.n {
            result[[i, i]] += self.eps;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn matrix_close(a: &Array2<f64>, b: &Array2<f64>, eps: f64) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = eps, max_relative = eps);
        }
    }

    #[test]
    fn test_orthogonal_projection_idempotent() {
        let x = array![[2.0, 1.0], [0.0, 1.0]];
        let param = Orthogonal::new(x).unwrap();

        let once = param.resolve().unwrap();
        let twice = Orthogonal::new(once.clone()).unwrap().resolve().unwrap();
        matrix_close(&once, &twice, 1e-10);
    }

    #[test]
    fn test_orthogonal_rejects_bad_input() {
        assert!(Orthogonal::new(Array2::zeros((0, 2))).is_err());
        assert!(Orthogonal::new(array![[1.0, f64::NAN], [0.0, 1.0]]).is_err());
        // Rank deficient: projection undefined
        assert!(Orthogonal::new(array![[1.0, 2.0], [2.0, 4.0]]).is_err());
    }

    #[test]
    fn test_positive_definite_round_trip() {
        let m = array![[4.0, 1.0], [1.0, 3.0]];
        let param = PositiveDefinite::new(&m).unwrap();
        matrix_close(&param.resolve(), &m, 1e-9);
    }

    #[test]
    fn test_positive_definite_zero_packed_is_valid() {
        let m = array![[4.0, 1.0], [1.0, 3.0]];
        let param = PositiveDefinite::with_margin(&m, 1e-6).unwrap();

        let zeroed =
            PositiveDefinite::from_packed(Array1::zeros(param.packed().len()), 2, param.margin());
        let resolved = zeroed.resolve();

        // eps * I is strictly positive definite
        assert!(cholesky_decomposition(&resolved).is_ok());
    }

    #[test]
    fn test_positive_definite_rejects_indefinite() {
        let m = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(PositiveDefinite::new(&m).is_err());

        let asym = array![[4.0, 1.0], [2.0, 3.0]];
        assert!(PositiveDefinite::new(&asym).is_err());

        let m = array![[4.0, 1.0], [1.0, 3.0]];
        assert!(PositiveDefinite::with_margin(&m, 0.0).is_err());
        assert!(PositiveDefinite::with_margin(&m, -1.0).is_err());
    }

    #[test]
    fn test_semidefinite_zero_margin() {
        let m = array![[2.0, 0.5], [0.5, 1.0]];
        let param = PositiveDefinite::semidefinite(&m).unwrap();
        assert_eq!(param.margin(), 0.0);
        matrix_close(&param.resolve(), &m, 1e-10);
    }
}
