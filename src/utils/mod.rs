//! Utility functions and helpers for the paramflat-rs library.

pub mod linalg;

// Re-export commonly used utilities
pub(crate) use linalg::{
    check_symmetric, cholesky_decomposition, pack_lower_triangular, packed_length, polar_factor,
    unpack_lower_triangular,
};
