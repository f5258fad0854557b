//! Nested numeric value trees
//!
//! This module provides the `Value` enum, the structured tree that the flatten
//! engine and the value resolver operate on. A tree mixes plain scalars,
//! arrays, sparse matrices, tuples, records, maps and constrained parameter
//! wrappers. The shape of a tree (types, dimensions, keys, field order) is
//! fixed once built; "mutation" is always expressed by constructing a new
//! tree, typically through `Unflatten`.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, Array2, ArrayD};

use crate::error::{ParamFlatError, Result};
use crate::params::Param;

/// A node in a nested numeric tree.
///
/// The variant set is closed: container shapes are dispatched by matching on
/// this enum rather than by open-ended type-based overloads. User-defined
/// structured types participate through the [`CustomNode`] extension trait.
#[derive(Debug, Clone)]
pub enum Value {
    /// A scalar real. Flattens to a length-1 vector.
    Real(f64),

    /// An integer. Non-tunable by construction; flattens to a length-0 vector.
    Int(i64),

    /// A boolean. Non-tunable by construction; flattens to a length-0 vector.
    Bool(bool),

    /// An absent value. Non-tunable by construction.
    None,

    /// A homogeneous numeric array of any rank, flattened in logical
    /// (row-major) element order.
    Array(ArrayD<f64>),

    /// A sparse matrix. Only the nonzero values are tunable; the nonzero
    /// pattern is part of the fixed shape.
    Sparse(SparseMatrix),

    /// A fixed-arity, heterogeneous sequence.
    Tuple(Vec<Value>),

    /// A fixed set of named fields in declared order.
    Record(Record),

    /// A dynamic key -> value map with deterministic (sorted-by-key)
    /// iteration order.
    Map(BTreeMap<String, Value>),

    /// A constrained parameter wrapper; flattens only its unconstrained
    /// representation.
    Param(Param),

    /// A user-defined structured node, handled through decompose/rebuild.
    Custom(Box<dyn CustomNode>),
}

impl Value {
    /// Build a tuple value from its elements.
    pub fn tuple(elements: Vec<Value>) -> Self {
        Value::Tuple(elements)
    }

    /// Build a map value from key/value pairs.
    ///
    /// Duplicate keys keep the last occurrence, matching `BTreeMap` insertion.
    pub fn map(entries: Vec<(String, Value)>) -> Self {
        Value::Map(entries.into_iter().collect())
    }

    /// Get the scalar real value, if this node is one.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the array value, if this node is one.
    pub fn as_array(&self) -> Option<&ArrayD<f64>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get the array value as a 2-d matrix, if this node is a rank-2 array.
    pub fn as_matrix(&self) -> Option<Array2<f64>> {
        match self {
            Value::Array(arr) => arr.clone().into_dimensionality().ok(),
            _ => None,
        }
    }

    /// Get the tuple elements, if this node is a tuple.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(elements) => Some(elements),
            _ => None,
        }
    }

    /// Get the record, if this node is one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Get the parameter wrapper, if this node is one.
    pub fn as_param(&self) -> Option<&Param> {
        match self {
            Value::Param(param) => Some(param),
            _ => None,
        }
    }

    /// Check whether the tree contains any parameter wrapper.
    pub fn has_params(&self) -> bool {
        match self {
            Value::Param(_) => true,
            Value::Tuple(elements) => elements.iter().any(Value::has_params),
            Value::Record(record) => record.fields().iter().any(|(_, v)| v.has_params()),
            Value::Map(map) => map.values().any(Value::has_params),
            Value::Custom(node) => node.decompose().iter().any(Value::has_params),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Sparse(a), Value::Sparse(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Param(a), Value::Param(b)) => a == b,
            // Custom nodes compare by their structural decomposition.
            (Value::Custom(a), Value::Custom(b)) => a.decompose() == b.decompose(),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(arr: ArrayD<f64>) -> Self {
        Value::Array(arr)
    }
}

impl From<Array1<f64>> for Value {
    fn from(arr: Array1<f64>) -> Self {
        Value::Array(arr.into_dyn())
    }
}

impl From<Array2<f64>> for Value {
    fn from(arr: Array2<f64>) -> Self {
        Value::Array(arr.into_dyn())
    }
}

impl From<Param> for Value {
    fn from(param: Param) -> Self {
        Value::Param(param)
    }
}

/// Extension interface for user-defined structured nodes.
///
/// A custom node exposes its constituent sub-values in a fixed declared order
/// (`decompose`) and can reconstruct an equivalent instance from same-order
/// replacements (`rebuild`). This is the explicit per-type decompose/rebuild
/// pair the resolver and the flatten engine use instead of runtime
/// reflection. A node with no constituents is treated as an opaque leaf: it
/// contributes nothing to the flat vector and resolves to itself.
pub trait CustomNode: fmt::Debug + Send + Sync {
    /// Return the constituent sub-values in declared order.
    fn decompose(&self) -> Vec<Value>;

    /// Reconstruct an equivalent node from resolved constituents.
    ///
    /// The parts are supplied in the same order `decompose` produced them.
    /// Failing here signals the type needs a specialized resolver; it is
    /// reported as `ParamFlatError::StructuralRebuild`.
    fn rebuild(&self, parts: Vec<Value>) -> Result<Box<dyn CustomNode>>;

    /// Clone the node behind the trait object.
    fn clone_node(&self) -> Box<dyn CustomNode>;
}

impl Clone for Box<dyn CustomNode> {
    fn clone(&self) -> Self {
        self.clone_node()
    }
}

/// A fixed set of named fields in declared order.
///
/// Unlike a map, a record's field set and ordering are part of its shape:
/// flatten emits field values in declared order and unflatten rebuilds an
/// equivalent record from the resolved ordered values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a record from named fields.
    ///
    /// # Arguments
    ///
    /// * `fields` - Field name/value pairs in declared order
    ///
    /// # Returns
    ///
    /// The record, or an error if a field name is duplicated
    pub fn new(fields: Vec<(String, Value)>) -> Result<Self> {
        for (i, (name, _)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(other, _)| other == name) {
                return Err(ParamFlatError::InvalidParameter(format!(
                    "duplicate record field '{}'",
                    name
                )));
            }
        }

        Ok(Self { fields })
    }

    /// Get the fields in declared order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rebuild a record from field names captured from a validated record.
    ///
    /// Duplicate checking already happened at the original construction, so
    /// it is not repeated here.
    pub(crate) fn from_parts(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }
}

/// A sparse matrix in coordinate (COO) form.
///
/// The nonzero pattern (shape plus row/column indices) is fixed shape
/// metadata; only the value vector participates in flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Array1<f64>,
}

impl SparseMatrix {
    /// Create a sparse matrix from triplets.
    ///
    /// # Arguments
    ///
    /// * `nrows`, `ncols` - Matrix dimensions
    /// * `rows`, `cols` - Row and column index of each stored entry
    /// * `values` - Stored entry values, parallel to the index vectors
    ///
    /// # Returns
    ///
    /// The sparse matrix, or an error if the triplet vectors disagree in
    /// length or an index is out of range
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if rows.len() != values.len() || cols.len() != values.len() {
            return Err(ParamFlatError::DimensionMismatch(format!(
                "triplet lengths disagree: {} rows, {} cols, {} values",
                rows.len(),
                cols.len(),
                values.len()
            )));
        }

        for (&r, &c) in rows.iter().zip(cols.iter()) {
            if r >= nrows || c >= ncols {
                return Err(ParamFlatError::DimensionMismatch(format!(
                    "entry ({}, {}) outside a {}x{} matrix",
                    r, c, nrows, ncols
                )));
            }
        }

        Ok(Self {
            nrows,
            ncols,
            rows,
            cols,
            values: Array1::from_vec(values),
        })
    }

    /// Matrix dimensions as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored entry values in pattern order.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Row indices of the stored entries.
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    /// Column indices of the stored entries.
    pub fn col_indices(&self) -> &[usize] {
        &self.cols
    }

    /// Materialize the matrix densely. Duplicate entries accumulate.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.nrows, self.ncols));
        for ((&r, &c), &v) in self.rows.iter().zip(self.cols.iter()).zip(self.values.iter()) {
            dense[[r, c]] += v;
        }
        dense
    }

    /// Rebuild a matrix with the same pattern and new values.
    pub(crate) fn with_values(&self, values: Array1<f64>) -> Self {
        debug_assert_eq!(values.len(), self.values.len());
        Self {
            nrows: self.nrows,
            ncols: self.ncols,
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_record_declared_order() {
        let record = Record::new(vec![
            ("b".to_string(), Value::Real(2.0)),
            ("a".to_string(), Value::Real(1.0)),
        ])
        .unwrap();

        let names: Vec<&str> = record.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record.get("a"), Some(&Value::Real(1.0)));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_record_duplicate_field() {
        let result = Record::new(vec![
            ("a".to_string(), Value::Real(1.0)),
            ("a".to_string(), Value::Real(2.0)),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sparse_from_triplets() {
        let sparse =
            SparseMatrix::from_triplets(2, 3, vec![0, 1], vec![2, 0], vec![5.0, -1.0]).unwrap();
        assert_eq!(sparse.shape(), (2, 3));
        assert_eq!(sparse.nnz(), 2);

        let dense = sparse.to_dense();
        assert_eq!(dense, array![[0.0, 0.0, 5.0], [-1.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_sparse_index_out_of_range() {
        let result = SparseMatrix::from_triplets(2, 2, vec![2], vec![0], vec![1.0]);
        assert!(result.is_err());

        let result = SparseMatrix::from_triplets(2, 2, vec![0, 1], vec![0], vec![1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_map_sorted_iteration() {
        let value = Value::map(vec![
            ("zeta".to_string(), Value::Real(1.0)),
            ("alpha".to_string(), Value::Real(2.0)),
        ]);

        match value {
            Value::Map(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["alpha", "zeta"]);
            }
            _ => panic!("Expected Map variant"),
        }
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Real(1.5), Value::Real(1.5));
        assert_ne!(Value::Real(1.5), Value::Int(1));
        assert_eq!(Value::None, Value::None);

        let a = Value::tuple(vec![Value::Real(1.0), Value::Bool(true)]);
        let b = Value::tuple(vec![Value::Real(1.0), Value::Bool(true)]);
        assert_eq!(a, b);
    }
}
