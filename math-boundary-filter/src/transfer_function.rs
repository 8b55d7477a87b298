//! Rational transfer function `H(z) = N(z) / D(z)` in tap form.

use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{BoundaryFilterError, Result};

/// Leading denominator taps with a magnitude at or below this are treated as zero.
pub const DEGENERATE_TOLERANCE: f64 = 1.0e-12;

/// A digital filter given by numerator and denominator taps, ordered from
/// the highest power of `z` to the lowest (equivalently `z^0, z^-1, ...`).
///
/// Both sequences are non-empty, finite, and the leading denominator tap is
/// non-zero. Numerator and denominator may have different lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransferFunction")]
pub struct TransferFunction {
    numerator: Vec<f64>,
    denominator: Vec<f64>,
}

#[derive(Deserialize)]
struct RawTransferFunction {
    numerator: Vec<f64>,
    denominator: Vec<f64>,
}

impl TryFrom<RawTransferFunction> for TransferFunction {
    type Error = BoundaryFilterError;

    fn try_from(raw: RawTransferFunction) -> Result<Self> {
        TransferFunction::new(raw.numerator, raw.denominator)
    }
}

impl TransferFunction {
    /// Creates a transfer function, validating the tap sequences.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if either sequence is empty, holds a
    /// non-finite tap, or the leading denominator tap is zero.
    pub fn new(numerator: Vec<f64>, denominator: Vec<f64>) -> Result<Self> {
        if numerator.is_empty() {
            return Err(BoundaryFilterError::invalid(
                "numerator",
                0.0,
                "must hold at least one tap",
            ));
        }
        if denominator.is_empty() {
            return Err(BoundaryFilterError::invalid(
                "denominator",
                0.0,
                "must hold at least one tap",
            ));
        }
        if let Some(&bad) = numerator.iter().find(|v| !v.is_finite()) {
            return Err(BoundaryFilterError::invalid(
                "numerator",
                bad,
                "taps must be finite",
            ));
        }
        if let Some(&bad) = denominator.iter().find(|v| !v.is_finite()) {
            return Err(BoundaryFilterError::invalid(
                "denominator",
                bad,
                "taps must be finite",
            ));
        }
        if denominator[0].abs() <= DEGENERATE_TOLERANCE {
            return Err(BoundaryFilterError::invalid(
                "denominator[0]",
                denominator[0],
                "leading denominator tap must be non-zero",
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Builds a filter from taps already known to be valid.
    pub(crate) fn from_parts(numerator: Vec<f64>, denominator: Vec<f64>) -> Self {
        debug_assert!(!numerator.is_empty() && !denominator.is_empty());
        Self {
            numerator,
            denominator,
        }
    }

    /// Creates a transfer function and divides every tap by `denominator[0]`.
    pub fn normalized_from(numerator: Vec<f64>, denominator: Vec<f64>) -> Result<Self> {
        Ok(Self::new(numerator, denominator)?.normalized())
    }

    /// The identity filter `H(z) = 1`.
    pub fn identity() -> Self {
        Self {
            numerator: vec![1.0],
            denominator: vec![1.0],
        }
    }

    /// Returns a copy scaled so that the leading denominator tap is exactly 1.
    pub fn normalized(&self) -> Self {
        // x / x is exactly 1
        let a0 = self.denominator[0];
        let numerator = self.numerator.iter().map(|v| v / a0).collect();
        let denominator = self.denominator.iter().map(|v| v / a0).collect();
        Self {
            numerator,
            denominator,
        }
    }

    /// Numerator taps, highest power first.
    pub fn numerator(&self) -> &[f64] {
        &self.numerator
    }

    /// Denominator taps, highest power first.
    pub fn denominator(&self) -> &[f64] {
        &self.denominator
    }

    /// Consumes the filter and returns `(numerator, denominator)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.numerator, self.denominator)
    }

    /// Filter order: the larger of the numerator and denominator degrees.
    pub fn order(&self) -> usize {
        self.numerator.len().max(self.denominator.len()) - 1
    }

    /// Degree of the numerator polynomial.
    pub fn numerator_degree(&self) -> usize {
        self.numerator.len() - 1
    }

    /// Degree of the denominator polynomial.
    pub fn denominator_degree(&self) -> usize {
        self.denominator.len() - 1
    }

    /// `true` when the leading denominator tap is exactly 1.
    pub fn is_normalized(&self) -> bool {
        self.denominator[0] == 1.0
    }

    /// `true` when numerator and denominator have the same number of taps.
    pub fn has_equal_lengths(&self) -> bool {
        self.numerator.len() == self.denominator.len()
    }

    pub(crate) fn require_equal_lengths(&self) -> Result<()> {
        if self.has_equal_lengths() {
            Ok(())
        } else {
            Err(BoundaryFilterError::LengthMismatch {
                numerator: self.numerator.len(),
                denominator: self.denominator.len(),
            })
        }
    }

    /// Complex response `H(e^{jw})` at frequency `freq` (Hz).
    pub fn response(&self, freq: f64, srate: f64) -> Complex64 {
        let omega = 2.0 * PI * freq / srate;
        // e^{-jw}
        let z_inv = Complex64::from_polar(1.0, -omega);
        evaluate(&self.numerator, z_inv) / evaluate(&self.denominator, z_inv)
    }

    /// Magnitude of the response at `freq` (Hz).
    pub fn magnitude(&self, freq: f64, srate: f64) -> f64 {
        self.response(freq, srate).norm()
    }

    /// Magnitude response in dB at `freq` (Hz).
    pub fn log_magnitude(&self, freq: f64, srate: f64) -> f64 {
        let result = self.magnitude(freq, srate);
        if result > 0.0 {
            20.0 * result.log10()
        } else {
            -200.0
        }
    }

    /// Vectorized magnitude response in dB over a frequency grid.
    pub fn np_log_magnitude(&self, freqs: &Array1<f64>, srate: f64) -> Array1<f64> {
        let min_val = 1.0e-10;
        freqs.mapv(|f| 20.0 * self.magnitude(f, srate).max(min_val).log10())
    }
}

/// Horner evaluation of `sum(taps[k] * x^k)`.
fn evaluate(taps: &[f64], x: Complex64) -> Complex64 {
    taps.iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &t| acc * x + t)
}

impl fmt::Display for TransferFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order:{},b:{:?},a:{:?}",
            self.order(),
            self.numerator,
            self.denominator
        )
    }
}
