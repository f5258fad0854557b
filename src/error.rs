use thiserror::Error;

/// Error types for the paramflat-rs library.
#[derive(Error, Debug)]
pub enum ParamFlatError {
    /// Error indicating a mismatch in matrix or vector dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for invalid parameter values supplied to a constructor.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    BoundsError(#[from] crate::params::bounds::BoundsError),

    /// Error indicating a matrix that was required to be positive definite is not.
    #[error("Matrix is not positive definite: {0}")]
    NotPositiveDefinite(String),

    /// Error during computational operations.
    #[error("Computation error: {0}")]
    InvalidComputation(String),

    /// Error rebuilding a custom node from its resolved constituents.
    #[error("Structural rebuild error: {0}")]
    StructuralRebuild(String),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for paramflat-rs operations.
pub type Result<T> = std::result::Result<T, ParamFlatError>;

/// Extensions for converting from other error types.
impl From<String> for ParamFlatError {
    fn from(s: String) -> Self {
        ParamFlatError::Other(s)
    }
}

impl From<&str> for ParamFlatError {
    fn from(s: &str) -> Self {
        ParamFlatError::Other(s.to_string())
    }
}
