//! Integration tests for the parameter system
//!
//! These tests verify that each constrained parameter variant behaves
//! correctly through construction, resolution and the flatten engine.

// Tests for the scalar variants (positive, bounded, fixed, deferred)
mod scalar_tests;

// Tests for the matrix variants (orthogonal, positive definite)
mod matrix_tests;

// Tests for the element-wise array variants
mod array_tests;
