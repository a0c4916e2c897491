//! Error types for the probability engine.
//!
//! Every fallible operation reports one of four typed failures. None of
//! them is used for control flow inside the engine.

use thiserror::Error;

/// Probability engine error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbabilityError {
    /// A distribution parameter or request argument violates its constraint.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation is mathematically undefined at the given arguments.
    #[error("Domain error: {0}")]
    Domain(String),

    /// The transformation rule is incompatible with the source family.
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// No closed form and no moment-only fallback is implemented.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Result type alias
pub type ProbabilityResult<T> = std::result::Result<T, ProbabilityError>;
