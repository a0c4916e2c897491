//! Shared parameter guards.
//!
//! Every constructor and request entry point funnels its checks through
//! these helpers so that a violated constraint always surfaces as
//! [`ProbabilityError::Validation`] with the offending name and value.

use crate::error::{ProbabilityError, ProbabilityResult};

/// Requires `value` to be finite.
pub(crate) fn finite(name: &str, value: f64) -> ProbabilityResult<f64> {
    if !value.is_finite() {
        return Err(ProbabilityError::Validation(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(value)
}

/// Requires `value` to be finite and strictly positive.
pub(crate) fn positive(name: &str, value: f64) -> ProbabilityResult<f64> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(ProbabilityError::Validation(format!(
            "{name} must be > 0, got {value}"
        )));
    }
    Ok(value)
}

/// Requires a probability in `[0, 1]`.
pub(crate) fn probability(name: &str, value: f64) -> ProbabilityResult<f64> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ProbabilityError::Validation(format!(
            "{name} must be finite and in [0,1], got {value}"
        )));
    }
    Ok(value)
}

/// Requires a probability in `(0, 1]`.
pub(crate) fn success_probability(name: &str, value: f64) -> ProbabilityResult<f64> {
    probability(name, value)?;
    if value == 0.0 {
        return Err(ProbabilityError::Validation(format!(
            "{name} must be in (0,1], got {value}"
        )));
    }
    Ok(value)
}

/// Requires a non-negative integer carried in an `f64`.
pub(crate) fn count(name: &str, value: f64) -> ProbabilityResult<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(ProbabilityError::Validation(format!(
            "{name} must be a non-negative integer, got {value}"
        )));
    }
    if value > (1u64 << 53) as f64 {
        return Err(ProbabilityError::Validation(format!(
            "{name} exceeds the exactly representable integer range, got {value}"
        )));
    }
    Ok(value as u64)
}

/// Requires a positive integer carried in an `f64`.
pub(crate) fn positive_count(name: &str, value: f64) -> ProbabilityResult<u64> {
    let n = count(name, value)?;
    if n == 0 {
        return Err(ProbabilityError::Validation(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }
    Ok(n)
}

/// Requires an integer within `[min, max]`.
pub(crate) fn count_in_range(name: &str, value: u64, min: u64, max: u64) -> ProbabilityResult<u64> {
    if value < min || value > max {
        return Err(ProbabilityError::Validation(format!(
            "{name} must be in [{min}, {max}], got {value}"
        )));
    }
    Ok(value)
}
