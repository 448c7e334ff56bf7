//! Constructor-time validation errors shared by the domain entities.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{field} must be a finite number in [0, 1], got {value}")]
    OutOfUnitInterval { field: &'static str, value: f64 },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("invalid content hash {0:?}: expected 64 lowercase hex characters")]
    InvalidContentHash(String),
}

/// Reject anything outside `[0, 1]`, NaN included. Never clamps.
pub(crate) fn check_unit_interval(field: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ModelError::OutOfUnitInterval { field, value })
    }
}

pub(crate) fn check_non_empty(field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        Err(ModelError::Empty { field })
    } else {
        Ok(())
    }
}
