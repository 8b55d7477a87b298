//! Error types for boundary filter synthesis and verification.
//!
//! Every operation in this crate is a pure function, so an error is always
//! reproducible from its inputs and is reported to the immediate caller
//! without any internal recovery.

use thiserror::Error;

use crate::stability::MethodVerdicts;

/// Errors that can occur while synthesizing or verifying a boundary filter.
#[derive(Debug, Error)]
pub enum BoundaryFilterError {
    /// A scalar input is outside its domain.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// The rejected value
        value: f64,
        /// Domain the value should have been in
        reason: &'static str,
    },

    /// Two tap sequences that must have the same length do not.
    #[error("length mismatch: numerator has {numerator} taps, denominator has {denominator}")]
    LengthMismatch {
        /// Length of the numerator (or specular) sequence
        numerator: usize,
        /// Length of the denominator (or diffuse) sequence
        denominator: usize,
    },

    /// The three stability tests disagree on the same polynomial.
    #[error("stability methods disagree on {polynomial:?}: {verdicts}")]
    StabilityMismatch {
        /// The normalized denominator polynomial that was tested
        polynomial: Vec<f64>,
        /// Individual verdicts of the three methods
        verdicts: MethodVerdicts,
    },

    /// All three stability tests agree the filter is unstable.
    #[error("unstable {stage} filter, denominator {polynomial:?}")]
    UnstableFilter {
        /// Pipeline stage that produced the filter
        stage: &'static str,
        /// The offending denominator polynomial
        polynomial: Vec<f64>,
    },

    /// Reading or writing a configuration or export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for boundary filter operations.
pub type Result<T> = std::result::Result<T, BoundaryFilterError>;

impl BoundaryFilterError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        BoundaryFilterError::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Returns `true` if this is an out-of-domain parameter error.
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, BoundaryFilterError::InvalidParameter { .. })
    }

    /// Returns `true` if this is a tap length mismatch.
    pub fn is_length_error(&self) -> bool {
        matches!(self, BoundaryFilterError::LengthMismatch { .. })
    }

    /// Returns `true` if the stability methods disagreed.
    pub fn is_stability_mismatch(&self) -> bool {
        matches!(self, BoundaryFilterError::StabilityMismatch { .. })
    }

    /// Returns `true` for any stability related failure.
    pub fn is_stability_error(&self) -> bool {
        matches!(
            self,
            BoundaryFilterError::StabilityMismatch { .. }
                | BoundaryFilterError::UnstableFilter { .. }
        )
    }
}
