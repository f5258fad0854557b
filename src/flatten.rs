//! Flatten engine
//!
//! Generic, reversible conversion between nested [`Value`] trees and flat
//! vectors of reals. `flatten` walks a tree once, emits every tunable real in
//! a deterministic order, and captures all shape, key and fixed-value
//! metadata into an [`Unflatten`] reconstructor. The reconstructor is the
//! sole owner of that metadata: the returned vector is a pure data copy with
//! no remaining relationship to the source tree.
//!
//! The engine is a pure function of its input. Independent flatten/unflatten
//! pairs over independent trees can be used from separate threads without
//! coordination.

use std::fmt;
use std::marker::PhantomData;

use ndarray::{Array1, Array2, ArrayD, IxDyn};

use crate::error::{ParamFlatError, Result};
use crate::params::bounds::{IntervalTransform, PositiveTransform};
use crate::params::{
    Bounded, BoundedArray, Deferred, Orthogonal, Param, Positive, PositiveArray, PositiveDefinite,
};
use crate::value::{Record, SparseMatrix, Value};

/// Target numeric width of a flattened vector.
///
/// The tree itself always stores `f64`; flattening casts each tunable real to
/// the requested width and unflattening casts back, so round trips are exact
/// to the representable precision of the chosen width.
pub trait Width: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Cast a tree value to this width.
    fn from_f64(v: f64) -> Self;

    /// Cast a flattened value back to the tree's precision.
    fn to_f64(self) -> f64;
}

impl Width for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Width for f32 {
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Captured shape metadata for one tree node.
///
/// Composite variants record the flat length of every child so unflatten can
/// slice the vector without re-walking values.
#[derive(Debug, Clone)]
enum Shape {
    /// A single tunable real.
    Real,

    /// A zero-length leaf returned verbatim: ints, bools, absent values,
    /// fixed sub-trees and opaque custom nodes.
    Captured(Value),

    /// Dense array of the given dimensions, elements in logical order.
    Array { dim: Vec<usize> },

    /// Sparse matrix; the pattern template carries shape and indices.
    Sparse { pattern: SparseMatrix },

    Tuple {
        elements: Vec<(Shape, usize)>,
    },

    Record {
        fields: Vec<(String, Shape, usize)>,
    },

    /// Map entries in the iteration order captured at flatten time
    /// (deterministic: sorted by key).
    Map {
        entries: Vec<(String, Shape, usize)>,
    },

    Positive {
        transform: PositiveTransform,
    },

    Bounded {
        transform: IntervalTransform,
    },

    /// Deferred parameter: the template owns the callable, the argument
    /// shapes drive reconstruction.
    Deferred {
        template: Deferred,
        args: Vec<(Shape, usize)>,
    },

    Orthogonal {
        nrows: usize,
        ncols: usize,
    },

    PositiveDefinite {
        n: usize,
        eps: f64,
    },

    PositiveArray {
        dim: Vec<usize>,
        transform: PositiveTransform,
    },

    BoundedArray {
        dim: Vec<usize>,
        transform: IntervalTransform,
    },

    /// Custom node with constituents; the template rebuilds from new parts.
    Custom {
        template: Value,
        parts: Vec<(Shape, usize)>,
    },
}

/// Reconstructor half of a flatten pair.
///
/// Owns all shape/key/fixed-value metadata captured at flatten time and
/// rebuilds a tree of the exact original shape from any vector of the paired
/// length.
#[derive(Debug, Clone)]
pub struct Unflatten<W: Width> {
    shape: Shape,
    len: usize,
    _width: PhantomData<W>,
}

impl<W: Width> Unflatten<W> {
    /// The vector length this reconstructor is contractually valid for.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the paired flat vector is empty (a fully non-tunable tree).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rebuild a tree of the original shape from a flat vector.
    ///
    /// # Arguments
    ///
    /// * `vector` - A vector of exactly the paired length
    ///
    /// # Returns
    ///
    /// The reconstructed tree; the only error path is a custom node failing
    /// to rebuild from its constituents
    ///
    /// # Panics
    ///
    /// Supplying a vector of the wrong length is a contract violation and
    /// panics: callers must only use vectors paired with this flatten call
    /// or of identical shape and length.
    pub fn unflatten(&self, vector: &Array1<W>) -> Result<Value> {
        assert_eq!(
            vector.len(),
            self.len,
            "unflatten contract violation: expected a vector of length {}, got {}",
            self.len,
            vector.len()
        );

        let values: Vec<W> = vector.iter().copied().collect();
        unflatten_shape(&self.shape, &values)
    }
}

/// Flatten a tree into a double-precision vector and its reconstructor.
///
/// # Arguments
///
/// * `x` - The tree to flatten
///
/// # Returns
///
/// The flat vector of tunable reals and the paired [`Unflatten`]
///
/// # Examples
///
/// ```
/// use paramflat_rs::{flatten, Record, Value};
///
/// let tree = Value::Record(Record::new(vec![
///     ("a".to_string(), Value::Real(5.0)),
///     (
///         "b".to_string(),
///         Value::tuple(vec![Value::Real(2.0), Value::Real(3.0)]),
///     ),
/// ]).unwrap());
///
/// let (vector, unflatten) = flatten(&tree);
/// assert_eq!(vector.to_vec(), vec![5.0, 2.0, 3.0]);
/// assert_eq!(unflatten.unflatten(&vector).unwrap(), tree);
/// ```
pub fn flatten(x: &Value) -> (Array1<f64>, Unflatten<f64>) {
    flatten_with_width::<f64>(x)
}

/// Flatten a tree into a vector of the requested numeric width.
///
/// Identical to [`flatten`] except every tunable real is cast to `W`.
pub fn flatten_with_width<W: Width>(x: &Value) -> (Array1<W>, Unflatten<W>) {
    let mut buffer = Vec::new();
    let shape = flatten_value(x, &mut buffer);
    let len = buffer.len();

    (
        Array1::from_vec(buffer),
        Unflatten {
            shape,
            len,
            _width: PhantomData,
        },
    )
}

fn flatten_value<W: Width>(x: &Value, out: &mut Vec<W>) -> Shape {
    match x {
        Value::Real(v) => {
            out.push(W::from_f64(*v));
            Shape::Real
        }

        // Non-tunable by construction: captured verbatim, zero length.
        Value::Int(_) | Value::Bool(_) | Value::None => Shape::Captured(x.clone()),

        Value::Array(arr) => {
            out.extend(arr.iter().map(|&v| W::from_f64(v)));
            Shape::Array {
                dim: arr.shape().to_vec(),
            }
        }

        Value::Sparse(sparse) => {
            out.extend(sparse.values().iter().map(|&v| W::from_f64(v)));
            Shape::Sparse {
                pattern: sparse.clone(),
            }
        }

        Value::Tuple(elements) => {
            let mut shapes = Vec::with_capacity(elements.len());
            for element in elements {
                let start = out.len();
                let shape = flatten_value(element, out);
                shapes.push((shape, out.len() - start));
            }
            Shape::Tuple { elements: shapes }
        }

        Value::Record(record) => {
            let mut fields = Vec::with_capacity(record.len());
            for (name, value) in record.fields() {
                let start = out.len();
                let shape = flatten_value(value, out);
                fields.push((name.clone(), shape, out.len() - start));
            }
            Shape::Record { fields }
        }

        Value::Map(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, value) in map {
                let start = out.len();
                let shape = flatten_value(value, out);
                entries.push((key.clone(), shape, out.len() - start));
            }
            Shape::Map { entries }
        }

        Value::Param(param) => flatten_param(param, out),

        Value::Custom(node) => {
            let constituents = node.decompose();
            if constituents.is_empty() {
                // Opaque leaf: nothing tunable inside.
                return Shape::Captured(x.clone());
            }

            let mut parts = Vec::with_capacity(constituents.len());
            for constituent in &constituents {
                let start = out.len();
                let shape = flatten_value(constituent, out);
                parts.push((shape, out.len() - start));
            }
            Shape::Custom {
                template: x.clone(),
                parts,
            }
        }
    }
}

fn flatten_param<W: Width>(param: &Param, out: &mut Vec<W>) -> Shape {
    match param {
        Param::Positive(p) => {
            out.push(W::from_f64(p.unconstrained()));
            Shape::Positive {
                transform: p.transform(),
            }
        }

        Param::Bounded(p) => {
            out.push(W::from_f64(p.unconstrained()));
            Shape::Bounded {
                transform: p.transform(),
            }
        }

        // Fixed removes its whole sub-tree from the tunable space.
        Param::Fixed(_) => Shape::Captured(Value::Param(param.clone())),

        Param::Deferred(d) => {
            let mut args = Vec::with_capacity(d.args().len());
            for arg in d.args() {
                let start = out.len();
                let shape = flatten_value(arg, out);
                args.push((shape, out.len() - start));
            }
            Shape::Deferred {
                template: d.clone(),
                args,
            }
        }

        Param::Orthogonal(p) => {
            out.extend(p.raw().iter().map(|&v| W::from_f64(v)));
            let (nrows, ncols) = p.raw().dim();
            Shape::Orthogonal { nrows, ncols }
        }

        Param::PositiveDefinite(p) => {
            out.extend(p.packed().iter().map(|&v| W::from_f64(v)));
            Shape::PositiveDefinite {
                n: p.dim(),
                eps: p.margin(),
            }
        }

        Param::PositiveArray(p) => {
            out.extend(p.unconstrained().iter().map(|&v| W::from_f64(v)));
            Shape::PositiveArray {
                dim: p.unconstrained().shape().to_vec(),
                transform: p.transform(),
            }
        }

        Param::BoundedArray(p) => {
            out.extend(p.unconstrained().iter().map(|&v| W::from_f64(v)));
            Shape::BoundedArray {
                dim: p.unconstrained().shape().to_vec(),
                transform: p.transform(),
            }
        }
    }
}

fn collect_f64<W: Width>(slice: &[W]) -> Vec<f64> {
    slice.iter().map(|v| v.to_f64()).collect()
}

fn dyn_array_from<W: Width>(dim: &[usize], slice: &[W]) -> Result<ArrayD<f64>> {
    ArrayD::from_shape_vec(IxDyn(dim), collect_f64(slice)).map_err(|e| {
        ParamFlatError::DimensionMismatch(format!("captured array shape is inconsistent: {}", e))
    })
}

fn unflatten_shape<W: Width>(shape: &Shape, slice: &[W]) -> Result<Value> {
    match shape {
        Shape::Real => Ok(Value::Real(slice[0].to_f64())),

        Shape::Captured(value) => Ok(value.clone()),

        Shape::Array { dim } => Ok(Value::Array(dyn_array_from(dim, slice)?)),

        Shape::Sparse { pattern } => Ok(Value::Sparse(
            pattern.with_values(Array1::from_vec(collect_f64(slice))),
        )),

        Shape::Tuple { elements } => {
            let mut values = Vec::with_capacity(elements.len());
            let mut offset = 0;
            for (child, len) in elements {
                values.push(unflatten_shape(child, &slice[offset..offset + len])?);
                offset += len;
            }
            Ok(Value::Tuple(values))
        }

        Shape::Record { fields } => {
            let mut rebuilt = Vec::with_capacity(fields.len());
            let mut offset = 0;
            for (name, child, len) in fields {
                let value = unflatten_shape(child, &slice[offset..offset + len])?;
                rebuilt.push((name.clone(), value));
                offset += len;
            }
            Ok(Value::Record(Record::from_parts(rebuilt)))
        }

        Shape::Map { entries } => {
            let mut map = std::collections::BTreeMap::new();
            let mut offset = 0;
            for (key, child, len) in entries {
                let value = unflatten_shape(child, &slice[offset..offset + len])?;
                map.insert(key.clone(), value);
                offset += len;
            }
            Ok(Value::Map(map))
        }

        Shape::Positive { transform } => Ok(Value::Param(Param::Positive(
            Positive::from_internal(slice[0].to_f64(), *transform),
        ))),

        Shape::Bounded { transform } => Ok(Value::Param(Param::Bounded(Bounded::from_internal(
            slice[0].to_f64(),
            *transform,
        )))),

        Shape::Deferred { template, args } => {
            let mut values = Vec::with_capacity(args.len());
            let mut offset = 0;
            for (child, len) in args {
                values.push(unflatten_shape(child, &slice[offset..offset + len])?);
                offset += len;
            }
            Ok(Value::Param(Param::Deferred(template.with_args(values))))
        }

        Shape::Orthogonal { nrows, ncols } => {
            let raw = Array2::from_shape_vec((*nrows, *ncols), collect_f64(slice)).map_err(|e| {
                ParamFlatError::DimensionMismatch(format!(
                    "captured matrix shape is inconsistent: {}",
                    e
                ))
            })?;
            Ok(Value::Param(Param::Orthogonal(Orthogonal::from_raw(raw))))
        }

        Shape::PositiveDefinite { n, eps } => Ok(Value::Param(Param::PositiveDefinite(
            PositiveDefinite::from_packed(Array1::from_vec(collect_f64(slice)), *n, *eps),
        ))),

        Shape::PositiveArray { dim, transform } => Ok(Value::Param(Param::PositiveArray(
            PositiveArray::from_internal(dyn_array_from(dim, slice)?, *transform),
        ))),

        Shape::BoundedArray { dim, transform } => Ok(Value::Param(Param::BoundedArray(
            BoundedArray::from_internal(dyn_array_from(dim, slice)?, *transform),
        ))),

        Shape::Custom { template, parts } => {
            let node = match template {
                Value::Custom(node) => node,
                _ => {
                    return Err(ParamFlatError::InvalidComputation(
                        "custom shape captured a non-custom template".to_string(),
                    ))
                }
            };

            let mut values = Vec::with_capacity(parts.len());
            let mut offset = 0;
            for (child, len) in parts {
                values.push(unflatten_shape(child, &slice[offset..offset + len])?);
                offset += len;
            }
            Ok(Value::Custom(node.rebuild(values)?))
        }
    }
}
