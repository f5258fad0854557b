//! Element-wise array parameter variants
//!
//! A single parameter over a whole array, not an array of scalar parameters.
//! The internal state is one same-shaped unconstrained array and resolution
//! applies the scalar transform elementwise through `mapv`, so the allocation
//! count per resolve stays constant regardless of element count.

use ndarray::ArrayD;

use crate::error::Result;
use crate::params::bounds::{
    default_positive_margin, IntervalTransform, PositiveTransform, DEFAULT_INTERVAL_MARGIN,
};

/// An array parameter with every element constrained to be strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PositiveArray {
    unconstrained: ArrayD<f64>,
    transform: PositiveTransform,
}

impl PositiveArray {
    /// Create a positive array parameter with the default margin.
    ///
    /// # Arguments
    ///
    /// * `values` - Initial constrained values; every element must exceed the
    ///   margin
    pub fn new(values: &ArrayD<f64>) -> Result<Self> {
        Self::with_margin(values, default_positive_margin())
    }

    /// Create a positive array parameter with an explicit margin.
    pub fn with_margin(values: &ArrayD<f64>, eps: f64) -> Result<Self> {
        let transform = PositiveTransform::new(eps)?;

        let mut unconstrained = values.clone();
        for v in unconstrained.iter_mut() {
            *v = transform.to_internal(*v)?;
        }

        Ok(Self {
            unconstrained,
            transform,
        })
    }

    /// Rebuild from internal values produced by an optimizer.
    pub(crate) fn from_internal(unconstrained: ArrayD<f64>, transform: PositiveTransform) -> Self {
        Self {
            unconstrained,
            transform,
        }
    }

    /// The internal (unconstrained) array.
    pub fn unconstrained(&self) -> &ArrayD<f64> {
        &self.unconstrained
    }

    /// The positivity margin.
    pub fn margin(&self) -> f64 {
        self.transform.margin()
    }

    pub(crate) fn transform(&self) -> PositiveTransform {
        self.transform
    }

    /// The resolved array; every element is strictly above the margin.
    pub fn resolve(&self) -> ArrayD<f64> {
        let transform = self.transform;
        self.unconstrained.mapv(|u| transform.to_external(u))
    }
}

/// An array parameter with every element constrained to an open interval.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedArray {
    unconstrained: ArrayD<f64>,
    transform: IntervalTransform,
}

impl BoundedArray {
    /// Create a bounded array parameter with the default margin (`1e-12`).
    ///
    /// # Arguments
    ///
    /// * `values` - Initial constrained values
    /// * `min` - Lower bound (open), shared by every element
    /// * `max` - Upper bound (open), shared by every element
    pub fn new(values: &ArrayD<f64>, min: f64, max: f64) -> Result<Self> {
        Self::with_margin(values, min, max, DEFAULT_INTERVAL_MARGIN)
    }

    /// Create a bounded array parameter with an explicit margin.
    pub fn with_margin(values: &ArrayD<f64>, min: f64, max: f64, eps: f64) -> Result<Self> {
        let transform = IntervalTransform::new(min, max, eps)?;

        let mut unconstrained = values.clone();
        for v in unconstrained.iter_mut() {
            *v = transform.to_internal(*v)?;
        }

        Ok(Self {
            unconstrained,
            transform,
        })
    }

    /// Rebuild from internal values produced by an optimizer.
    pub(crate) fn from_internal(unconstrained: ArrayD<f64>, transform: IntervalTransform) -> Self {
        Self {
            unconstrained,
            transform,
        }
    }

    /// The internal (unconstrained) array.
    pub fn unconstrained(&self) -> &ArrayD<f64> {
        &self.unconstrained
    }

    /// Lower bound of the open interval.
    pub fn min(&self) -> f64 {
        self.transform.min()
    }

    /// Upper bound of the open interval.
    pub fn max(&self) -> f64 {
        self.transform.max()
    }

    pub(crate) fn transform(&self) -> IntervalTransform {
        self.transform
    }

    /// The resolved array; every element is strictly inside `(min, max)`.
    pub fn resolve(&self) -> ArrayD<f64> {
        let transform = self.transform;
        self.unconstrained.mapv(|u| transform.to_external(u))
    }
}
