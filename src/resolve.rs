//! Value resolver and flatten composition
//!
//! `resolve` recursively replaces every parameter wrapper in a tree with its
//! resolved plain value, leaving the surrounding structure intact.
//! `value_flatten` composes the flatten engine with the resolver so callers
//! only ever observe fully resolved, constraint-satisfying trees.

use std::collections::BTreeMap;

use ndarray::Array1;

use crate::error::Result;
use crate::flatten::{flatten_with_width, Unflatten, Width};
use crate::value::{Record, Value};

/// Recursively replace every parameter wrapper with its resolved value.
///
/// Containers (tuples, records, maps) are rebuilt with resolved children;
/// plain leaves pass through unchanged, so the function is idempotent on
/// trees already free of parameters. Custom nodes without a specialized
/// structure participate through their decompose/rebuild pair: an empty
/// decomposition means an opaque leaf returned as-is, otherwise every
/// constituent is resolved and an equivalent node is rebuilt from them in
/// declared order.
///
/// # Arguments
///
/// * `x` - The tree to resolve
///
/// # Examples
///
/// ```
/// use paramflat_rs::{positive, resolve, Value};
///
/// let tree = Value::tuple(vec![positive(2.0).unwrap(), Value::Real(1.0)]);
/// let resolved = resolve(&tree).unwrap();
///
/// let elements = resolved.as_tuple().unwrap();
/// assert!((elements[0].as_real().unwrap() - 2.0).abs() < 1e-10);
/// assert_eq!(elements[1], Value::Real(1.0));
/// ```
pub fn resolve(x: &Value) -> Result<Value> {
    match x {
        Value::Param(param) => param.resolve(),

        Value::Tuple(elements) => {
            let resolved: Vec<Value> = elements.iter().map(resolve).collect::<Result<_>>()?;
            Ok(Value::Tuple(resolved))
        }

        Value::Record(record) => {
            let mut fields = Vec::with_capacity(record.len());
            for (name, value) in record.fields() {
                fields.push((name.clone(), resolve(value)?));
            }
            Ok(Value::Record(Record::from_parts(fields)))
        }

        Value::Map(map) => {
            let mut resolved = BTreeMap::new();
            for (key, value) in map {
                resolved.insert(key.clone(), resolve(value)?);
            }
            Ok(Value::Map(resolved))
        }

        Value::Custom(node) => {
            let constituents = node.decompose();
            if constituents.is_empty() {
                return Ok(x.clone());
            }

            let resolved: Vec<Value> = constituents.iter().map(resolve).collect::<Result<_>>()?;
            Ok(Value::Custom(node.rebuild(resolved)?))
        }

        // Plain leaves: scalars, ints, bools, arrays, sparse matrices.
        _ => Ok(x.clone()),
    }
}

/// Reconstructor that resolves as it rebuilds.
///
/// The composition `resolve . unflatten`: callers never observe raw
/// unconstrained internals, only resolved trees.
#[derive(Debug, Clone)]
pub struct ValueUnflatten<W: Width> {
    inner: Unflatten<W>,
}

impl<W: Width> ValueUnflatten<W> {
    /// The vector length this reconstructor is contractually valid for.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the paired flat vector is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Rebuild and fully resolve a tree from a flat vector.
    ///
    /// # Panics
    ///
    /// Panics on a vector of the wrong length, like
    /// [`Unflatten::unflatten`].
    pub fn unflatten(&self, vector: &Array1<W>) -> Result<Value> {
        resolve(&self.inner.unflatten(vector)?)
    }
}

/// Flatten a tree and pair the vector with a resolving reconstructor.
///
/// # Arguments
///
/// * `x` - The tree to flatten
///
/// # Returns
///
/// The flat vector of tunable reals and a [`ValueUnflatten`] that yields
/// fully resolved trees
///
/// # Examples
///
/// ```
/// use paramflat_rs::{positive, value_flatten, Value};
///
/// let tree = positive(2.0).unwrap();
/// let (vector, unflatten) = value_flatten(&tree);
///
/// // Whatever vector an optimizer proposes, the result satisfies the
/// // constraint.
/// let proposed = ndarray::Array1::from_vec(vec![-40.0]);
/// let resolved = unflatten.unflatten(&proposed).unwrap();
/// assert!(resolved.as_real().unwrap() > 0.0);
/// ```
pub fn value_flatten(x: &Value) -> (Array1<f64>, ValueUnflatten<f64>) {
    value_flatten_with_width::<f64>(x)
}

/// Width-generic form of [`value_flatten`].
pub fn value_flatten_with_width<W: Width>(x: &Value) -> (Array1<W>, ValueUnflatten<W>) {
    let (vector, inner) = flatten_with_width::<W>(x);
    (vector, ValueUnflatten { inner })
}
