//! Scalar and structural parameter variants
//!
//! This module provides the `Positive`, `Bounded`, `Fixed` and `Deferred`
//! parameter wrappers. The scalar variants pair a single unconstrained
//! internal value with a transform from `params::bounds`; `Fixed` removes a
//! whole sub-tree from the tunable space, and `Deferred` resolves through a
//! pure user-supplied function.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::params::bounds::{
    default_positive_margin, IntervalTransform, PositiveTransform, DEFAULT_INTERVAL_MARGIN,
};
use crate::value::Value;

/// A parameter constrained to be strictly positive.
///
/// Stores `unconstrained = ln(value - eps)`; resolution applies
/// `exp(unconstrained) + eps`, so every real internal value resolves to a
/// value strictly above the margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Positive {
    unconstrained: f64,
    transform: PositiveTransform,
}

impl Positive {
    /// Create a positive parameter with the default margin
    /// (`sqrt(f64::EPSILON)`).
    ///
    /// # Arguments
    ///
    /// * `value` - Initial constrained value; must exceed the margin
    ///
    /// # Examples
    ///
    /// ```
    /// use paramflat_rs::params::Positive;
    ///
    /// let param = Positive::new(0.5).unwrap();
    /// assert!((param.resolve() - 0.5).abs() < 1e-10);
    /// ```
    pub fn new(value: f64) -> Result<Self> {
        Self::with_margin(value, default_positive_margin())
    }

    /// Create a positive parameter with an explicit margin.
    ///
    /// # Arguments
    ///
    /// * `value` - Initial constrained value; must satisfy `value > eps`
    /// * `eps` - Positivity margin; must be positive and finite
    pub fn with_margin(value: f64, eps: f64) -> Result<Self> {
        let transform = PositiveTransform::new(eps)?;
        let unconstrained = transform.to_internal(value)?;

        Ok(Self {
            unconstrained,
            transform,
        })
    }

    /// Rebuild a parameter from an internal value produced by an optimizer.
    pub(crate) fn from_internal(unconstrained: f64, transform: PositiveTransform) -> Self {
        Self {
            unconstrained,
            transform,
        }
    }

    /// The internal (unconstrained) representation.
    pub fn unconstrained(&self) -> f64 {
        self.unconstrained
    }

    /// The positivity margin.
    pub fn margin(&self) -> f64 {
        self.transform.margin()
    }

    pub(crate) fn transform(&self) -> PositiveTransform {
        self.transform
    }

    /// The resolved constrained value, strictly above the margin.
    pub fn resolve(&self) -> f64 {
        self.transform.to_external(self.unconstrained)
    }
}

/// A parameter constrained to an open interval `(min, max)`.
///
/// Stores the logit pre-image of the value over the margin-shrunk interval;
/// resolution is a scaled logistic, strictly inside `(min, max)` for every
/// real internal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounded {
    unconstrained: f64,
    transform: IntervalTransform,
}

impl Bounded {
    /// Create a bounded parameter with the default margin (`1e-12`).
    ///
    /// # Arguments
    ///
    /// * `value` - Initial constrained value; must lie within
    ///   `[min + eps, max - eps]`
    /// * `min` - Lower bound (open)
    /// * `max` - Upper bound (open)
    ///
    /// # Examples
    ///
    /// ```
    /// use paramflat_rs::params::Bounded;
    ///
    /// let param = Bounded::new(-0.05, -0.1, 2.0).unwrap();
    /// assert!((param.resolve() - (-0.05)).abs() < 1e-10);
    /// ```
    pub fn new(value: f64, min: f64, max: f64) -> Result<Self> {
        Self::with_margin(value, min, max, DEFAULT_INTERVAL_MARGIN)
    }

    /// Create a bounded parameter with an explicit margin.
    pub fn with_margin(value: f64, min: f64, max: f64, eps: f64) -> Result<Self> {
        let transform = IntervalTransform::new(min, max, eps)?;
        let unconstrained = transform.to_internal(value)?;

        Ok(Self {
            unconstrained,
            transform,
        })
    }

    /// Rebuild a parameter from an internal value produced by an optimizer.
    pub(crate) fn from_internal(unconstrained: f64, transform: IntervalTransform) -> Self {
        Self {
            unconstrained,
            transform,
        }
    }

    /// The internal (unconstrained) representation.
    pub fn unconstrained(&self) -> f64 {
        self.unconstrained
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

    /// The resolved constrained value, strictly inside `(min, max)`.
    pub fn resolve(&self) -> f64 {
        self.transform.to_external(self.unconstrained)
    }
}

/// A sub-tree removed from the tunable space.
///
/// The wrapped value contributes nothing to the flat vector; unflatten always
/// returns the originally captured sub-tree unchanged. Resolution still
/// recurses into the sub-tree, so fixed parameters keep their constraint
/// semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixed {
    value: Box<Value>,
}

impl Fixed {
    /// Fix a sub-tree at its current value.
    pub fn new(value: Value) -> Self {
        Self {
            value: Box::new(value),
        }
    }

    /// The captured sub-tree.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// The callable type stored by a [`Deferred`] parameter.
///
/// Must be pure and stateless: resolution may invoke it any number of times
/// and never tunes it.
pub type DeferredFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A parameter whose resolved value is computed from other values.
///
/// Resolution applies the stored function to the resolved arguments. Only the
/// arguments participate in flattening (as a tuple); the function itself is
/// never part of the tunable vector.
#[derive(Clone)]
pub struct Deferred {
    f: Arc<DeferredFn>,
    args: Vec<Value>,
}

impl Deferred {
    /// Create a deferred parameter from a shared callable and its arguments.
    pub fn new(f: Arc<DeferredFn>, args: Vec<Value>) -> Self {
        Self { f, args }
    }

    /// Create a deferred parameter from a plain closure.
    ///
    /// # Arguments
    ///
    /// * `f` - Pure function applied to the resolved arguments
    /// * `args` - Argument sub-trees; may themselves contain parameters
    pub fn from_fn<F>(f: F, args: Vec<Value>) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(Arc::new(f), args)
    }

    /// The argument sub-trees.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Rebuild with the same callable and new arguments.
    pub(crate) fn with_args(&self, args: Vec<Value>) -> Self {
        debug_assert_eq!(args.len(), self.args.len());
        Self {
            f: Arc::clone(&self.f),
            args,
        }
    }

    /// Resolve the arguments and apply the stored function.
    pub fn resolve(&self) -> Result<Value> {
        let resolved: Vec<Value> = self
            .args
            .iter()
            .map(crate::resolve::resolve)
            .collect::<Result<_>>()?;
        (self.f)(&resolved)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("f", &"<fn>")
            .field("args", &self.args)
            .finish()
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        // Callables compare by identity; arguments structurally.
        Arc::ptr_eq(&self.f, &other.f) && self.args == other.args
    }
}
