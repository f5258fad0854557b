//! # Constrained Parameter System
//!
//! This module provides the family of constrained parameter wrappers. Each
//! wrapper pairs an unconstrained internal representation (the values an
//! optimizer actually tunes) with an invertible transform guaranteeing the
//! resolved value satisfies its constraint: strictly positive, inside an open
//! interval, fixed, computed from other values, orthogonal, or positive
//! (semi)definite.
//!
//! ## Key Properties
//!
//! - **Eager validation**: every constructor checks its domain precondition
//!   and fails immediately; nothing is clamped silently or deferred to
//!   resolve time
//! - **Immutability**: parameters never mutate; new values arrive by
//!   rebuilding through [`Unflatten`](crate::flatten::Unflatten)
//! - **Engine participation**: only the unconstrained representation enters
//!   the flat vector, so any vector an optimizer proposes resolves to a
//!   constraint-satisfying value
//!
//! ## Example Usage
//!
//! ```rust
//! use paramflat_rs::{bounded, fixed, positive, Value};
//!
//! let tree = Value::tuple(vec![
//!     positive(2.0).unwrap(),
//!     bounded(0.5, 0.0, 1.0).unwrap(),
//!     fixed(Value::Real(3.0)),
//! ]);
//!
//! let (vector, _unflatten) = paramflat_rs::flatten(&tree);
//! // Only the two tunable wrappers contribute to the vector.
//! assert_eq!(vector.len(), 2);
//! ```

pub mod array;
pub mod bounds;
pub mod matrix;
pub mod scalar;

use ndarray::{Array2, ArrayD};

use crate::error::Result;
use crate::value::Value;

// Re-export key types
pub use array::{BoundedArray, PositiveArray};
pub use bounds::{
    default_positive_margin, BoundsError, IntervalTransform, PositiveTransform,
    DEFAULT_INTERVAL_MARGIN,
};
pub use matrix::{Orthogonal, PositiveDefinite};
pub use scalar::{Bounded, Deferred, DeferredFn, Fixed, Positive};

/// A constrained parameter wrapper.
///
/// The closed set of variants the flatten engine and the resolver dispatch
/// over. Every variant resolves to a plain value and flattens only its
/// unconstrained representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Strictly positive scalar.
    Positive(Positive),

    /// Scalar inside an open interval.
    Bounded(Bounded),

    /// Sub-tree removed from the tunable space.
    Fixed(Fixed),

    /// Value computed from other values by a pure function.
    Deferred(Deferred),

    /// Orthonormal matrix via polar projection.
    Orthogonal(Orthogonal),

    /// Positive (semi)definite matrix via packed Cholesky factors.
    PositiveDefinite(PositiveDefinite),

    /// Array with every element strictly positive.
    PositiveArray(PositiveArray),

    /// Array with every element inside an open interval.
    BoundedArray(BoundedArray),
}

impl Param {
    /// Apply the constraint transform and return the resolved plain value.
    pub fn resolve(&self) -> Result<Value> {
        match self {
            Param::Positive(p) => Ok(Value::Real(p.resolve())),
            Param::Bounded(p) => Ok(Value::Real(p.resolve())),
            Param::Fixed(p) => crate::resolve::resolve(p.value()),
            Param::Deferred(p) => p.resolve(),
            Param::Orthogonal(p) => Ok(Value::Array(p.resolve()?.into_dyn())),
            Param::PositiveDefinite(p) => Ok(Value::Array(p.resolve().into_dyn())),
            Param::PositiveArray(p) => Ok(Value::Array(p.resolve())),
            Param::BoundedArray(p) => Ok(Value::Array(p.resolve())),
        }
    }
}

/// Create a strictly positive scalar parameter with the default margin
/// (`sqrt(f64::EPSILON)`).
///
/// # Arguments
///
/// * `value` - Initial value; must exceed the margin
///
/// # Examples
///
/// ```
/// use paramflat_rs::{positive, resolve};
///
/// let param = positive(0.5).unwrap();
/// let resolved = resolve(&param).unwrap();
/// assert!((resolved.as_real().unwrap() - 0.5).abs() < 1e-10);
/// ```
pub fn positive(value: f64) -> Result<Value> {
    Ok(Value::Param(Param::Positive(Positive::new(value)?)))
}

/// Create a strictly positive scalar parameter with an explicit margin.
pub fn positive_with_margin(value: f64, eps: f64) -> Result<Value> {
    Ok(Value::Param(Param::Positive(Positive::with_margin(
        value, eps,
    )?)))
}

/// Create a scalar parameter constrained to the open interval `(min, max)`
/// with the default margin (`1e-12`).
///
/// # Arguments
///
/// * `value` - Initial value; must lie within `[min + eps, max - eps]`
/// * `min` - Lower bound (open)
/// * `max` - Upper bound (open)
///
/// # Examples
///
/// ```
/// use paramflat_rs::{bounded, resolve};
///
/// let param = bounded(-0.05, -0.1, 2.0).unwrap();
/// let resolved = resolve(&param).unwrap().as_real().unwrap();
/// assert!(resolved > -0.1 && resolved < 2.0);
/// ```
pub fn bounded(value: f64, min: f64, max: f64) -> Result<Value> {
    Ok(Value::Param(Param::Bounded(Bounded::new(value, min, max)?)))
}

/// Create a bounded scalar parameter with an explicit margin.
pub fn bounded_with_margin(value: f64, min: f64, max: f64, eps: f64) -> Result<Value> {
    Ok(Value::Param(Param::Bounded(Bounded::with_margin(
        value, min, max, eps,
    )?)))
}

/// Fix a sub-tree at its current value, removing it from the tunable space.
///
/// The sub-tree still takes part in resolution, so fixed parameters keep
/// their constraint semantics.
pub fn fixed(value: impl Into<Value>) -> Value {
    Value::Param(Param::Fixed(Fixed::new(value.into())))
}

/// Create a parameter whose resolved value is `f` applied to the resolved
/// arguments.
///
/// The function must be pure and stateless; it is captured once and never
/// flattened. Only the arguments participate in the tunable vector.
///
/// # Arguments
///
/// * `f` - Pure function over the resolved arguments
/// * `args` - Argument sub-trees; may contain further parameters
pub fn deferred<F>(f: F, args: Vec<Value>) -> Value
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
{
    Value::Param(Param::Deferred(Deferred::from_fn(f, args)))
}

/// Create an orthonormal-matrix parameter seeded by `raw`.
///
/// The seed is stored as-is (intentionally overparameterized) and resolution
/// projects it onto the nearest orthonormal matrix.
pub fn orthogonal(raw: Array2<f64>) -> Result<Value> {
    Ok(Value::Param(Param::Orthogonal(Orthogonal::new(raw)?)))
}

/// Create a strictly positive definite matrix parameter with the default
/// margin (`1e-12`).
///
/// # Arguments
///
/// * `matrix` - Initial value; `matrix - eps * I` must be positive definite
pub fn positive_definite(matrix: &Array2<f64>) -> Result<Value> {
    Ok(Value::Param(Param::PositiveDefinite(PositiveDefinite::new(
        matrix,
    )?)))
}

/// Create a strictly positive definite matrix parameter with an explicit
/// margin.
pub fn positive_definite_with_margin(matrix: &Array2<f64>, eps: f64) -> Result<Value> {
    Ok(Value::Param(Param::PositiveDefinite(
        PositiveDefinite::with_margin(matrix, eps)?,
    )))
}

/// Create a positive semidefinite matrix parameter (zero margin).
pub fn positive_semidefinite(matrix: &Array2<f64>) -> Result<Value> {
    Ok(Value::Param(Param::PositiveDefinite(
        PositiveDefinite::semidefinite(matrix)?,
    )))
}

/// Create an element-wise positive array parameter with the default margin.
pub fn positive_array(values: &ArrayD<f64>) -> Result<Value> {
    Ok(Value::Param(Param::PositiveArray(PositiveArray::new(
        values,
    )?)))
}

/// Create an element-wise positive array parameter with an explicit margin.
pub fn positive_array_with_margin(values: &ArrayD<f64>, eps: f64) -> Result<Value> {
    Ok(Value::Param(Param::PositiveArray(
        PositiveArray::with_margin(values, eps)?,
    )))
}

/// Create an element-wise bounded array parameter with the default margin.
pub fn bounded_array(values: &ArrayD<f64>, min: f64, max: f64) -> Result<Value> {
    Ok(Value::Param(Param::BoundedArray(BoundedArray::new(
        values, min, max,
    )?)))
}

/// Create an element-wise bounded array parameter with an explicit margin.
pub fn bounded_array_with_margin(
    values: &ArrayD<f64>,
    min: f64,
    max: f64,
    eps: f64,
) -> Result<Value> {
    Ok(Value::Param(Param::BoundedArray(BoundedArray::with_margin(
        values, min, max, eps,
    )?)))
}
