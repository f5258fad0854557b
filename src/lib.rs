//! # paramflat-rs
//!
//! `paramflat-rs` lets a model's parameters be expressed as a structured,
//! nested tree (records, tuples, arrays, maps) while still being usable by
//! generic numeric optimizers and differentiation engines that only
//! understand a flat vector of reals.
//!
//! The library provides:
//! - A generic, type-preserving, reversible flatten/unflatten engine between
//!   nested numeric trees and flat vectors
//! - A family of constrained parameter wrappers (positive, bounded, fixed,
//!   deferred, orthogonal, positive (semi)definite) pairing an unconstrained
//!   representation with an invertible transform
//! - A value resolver that strips the wrappers into plain resolved trees
//! - `value_flatten`, the single vector <-> resolved-value bridge for
//!   optimizer loops
//!
//! ## Basic Usage
//!
//! ```
//! use paramflat_rs::{positive, value_flatten, Record, Value};
//!
//! let model = Value::Record(Record::new(vec![
//!     ("scale".to_string(), positive(2.0).unwrap()),
//!     ("offset".to_string(), Value::Real(0.5)),
//! ]).unwrap());
//!
//! let (vector, unflatten) = value_flatten(&model);
//! assert_eq!(vector.len(), 2);
//!
//! // An optimizer proposes a new vector of the same length; the rebuilt
//! // tree is fully resolved and satisfies every constraint.
//! let resolved = unflatten.unflatten(&vector).unwrap();
//! let scale = resolved.as_record().unwrap().get("scale").unwrap();
//! assert!(scale.as_real().unwrap() > 0.0);
//! ```

// Public modules
pub mod error;

// Value trees and the parameter system
pub mod params;
pub mod value;

// Flatten engine and resolver
pub mod flatten;
pub mod resolve;

// Internal helpers
mod utils;

// Re-exports for convenience
pub use error::{ParamFlatError, Result};

pub use value::{CustomNode, Record, SparseMatrix, Value};

pub use flatten::{flatten, flatten_with_width, Unflatten, Width};
pub use resolve::{resolve, value_flatten, value_flatten_with_width, ValueUnflatten};

pub use params::{
    bounded, bounded_array, bounded_array_with_margin, bounded_with_margin, deferred, fixed,
    orthogonal, positive, positive_array, positive_array_with_margin, positive_definite,
    positive_definite_with_margin, positive_semidefinite, positive_with_margin, Param,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
