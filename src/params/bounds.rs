//! Constraint transforms with epsilon margins
//!
//! This module provides the invertible scalar bijections behind the
//! constrained parameter variants. Each transform maps between an external
//! (constrained) value and an internal (unconstrained) value that an
//! optimizer can vary freely, keeping resolved values strictly inside an
//! open constraint set via a small positive margin.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default margin for bounded-interval and positive-definite transforms.
pub const DEFAULT_INTERVAL_MARGIN: f64 = 1e-12;

/// Default margin for scalar and array positivity: sqrt of machine epsilon.
pub fn default_positive_margin() -> f64 {
    f64::EPSILON.sqrt()
}

/// Errors that can occur when constructing or applying constraint transforms
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Margin must be positive and finite, got {eps}")]
    InvalidMargin { eps: f64 },

    #[error("Interval [{min}, {max}] is too narrow for margin {eps}")]
    IntervalTooNarrow { min: f64, max: f64, eps: f64 },

    #[error("Value {value} must exceed the positivity margin {eps}")]
    ValueNotAboveMargin { value: f64, eps: f64 },

    #[error("Value {value} is outside the open interval ({min}, {max}) with margin {eps}")]
    ValueOutsideInterval {
        value: f64,
        min: f64,
        max: f64,
        eps: f64,
    },

    #[error("Non-finite value is not allowed")]
    NonFiniteValue,
}

/// Bijection between `(eps, inf)` and the whole real line.
///
/// The internal value is `ln(v - eps)`; the external value is
/// `exp(u) + eps`, guaranteed strictly above the margin for every real `u`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositiveTransform {
    eps: f64,
}

impl PositiveTransform {
    /// Create a positivity transform with the given margin.
    ///
    /// # Arguments
    ///
    /// * `eps` - Margin keeping resolved values strictly above zero
    ///
    /// # Returns
    ///
    /// The transform, or an error if `eps` is not positive and finite
    pub fn new(eps: f64) -> Result<Self, BoundsError> {
        if !eps.is_finite() || eps <= 0.0 {
            return Err(BoundsError::InvalidMargin { eps });
        }

        Ok(Self { eps })
    }

    /// The margin of this transform.
    pub fn margin(&self) -> f64 {
        self.eps
    }

    /// Convert an external (constrained) value to the internal value.
    ///
    /// # Arguments
    ///
    /// * `external_value` - The constrained value; must exceed the margin
    ///
    /// # Returns
    ///
    /// The internal value, or an error if the external value is out of domain
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }

        if external_value <= self.eps {
            return Err(BoundsError::ValueNotAboveMargin {
                value: external_value,
                eps: self.eps,
            });
        }

        Ok((external_value - self.eps).ln())
    }

    /// Convert an internal value back to the constrained external value.
    pub fn to_external(&self, internal_value: f64) -> f64 {
        internal_value.exp() + self.eps
    }
}

/// Bijection between the open interval `(min, max)` and the whole real line.
///
/// A logit/logistic pair over the margin-shrunk interval
/// `(min + eps, max - eps)`. External values at exactly the shrunk interval
/// endpoints are accepted; their logit argument is clamped one ulp inside
/// `(0, 1)` so the internal pre-image stays finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalTransform {
    min: f64,
    max: f64,
    eps: f64,
}

impl IntervalTransform {
    /// Create an interval transform over `(min, max)` with the given margin.
    ///
    /// # Arguments
    ///
    /// * `min` - Lower bound (open)
    /// * `max` - Upper bound (open)
    /// * `eps` - Margin keeping resolved values away from both bounds
    ///
    /// # Returns
    ///
    /// The transform, or an error if the bounds are not finite and ordered,
    /// the margin is not positive, or the margin swallows the interval
    pub fn new(min: f64, max: f64, eps: f64) -> Result<Self, BoundsError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }

        if min >= max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        if !eps.is_finite() || eps <= 0.0 {
            return Err(BoundsError::InvalidMargin { eps });
        }

        if max - min <= 2.0 * eps {
            return Err(BoundsError::IntervalTooNarrow { min, max, eps });
        }

        Ok(Self { min, max, eps })
    }

    /// Lower bound of the open interval.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound of the open interval.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// The margin of this transform.
    pub fn margin(&self) -> f64 {
        self.eps
    }

    /// Width of the margin-shrunk interval the logistic is scaled to.
    fn inner_width(&self) -> f64 {
        (self.max - self.eps) - (self.min + self.eps)
    }

    /// Convert an external (constrained) value to the internal value.
    ///
    /// # Arguments
    ///
    /// * `external_value` - The constrained value; must lie within
    ///   `[min + eps, max - eps]`
    ///
    /// # Returns
    ///
    /// The internal value, or an error if the external value is out of domain
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }

        if external_value < self.min + self.eps || external_value > self.max - self.eps {
            return Err(BoundsError::ValueOutsideInterval {
                value: external_value,
                min: self.min,
                max: self.max,
                eps: self.eps,
            });
        }

        let fraction = (external_value - self.min - self.eps) / self.inner_width();

        // Keep the logit finite when the value sits exactly on the shrunk
        // interval boundary.
        let fraction = fraction.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
        Ok((fraction / (1.0 - fraction)).ln())
    }

    /// Convert an internal value back to the constrained external value.
    ///
    /// The result is strictly inside `(min, max)` for every finite internal
    /// value.
    pub fn to_external(&self, internal_value: f64) -> f64 {
        // Numerically stable logistic for both signs of the argument.
        let sigma = if internal_value >= 0.0 {
            1.0 / (1.0 + (-internal_value).exp())
        } else {
            let e = internal_value.exp();
            e / (1.0 + e)
        };

        self.min + self.eps + sigma * self.inner_width()
    }
}
