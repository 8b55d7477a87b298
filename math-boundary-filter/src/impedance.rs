//! Conversion between reflectance and impedance filters.
//!
//! For a reflectance filter `R = N / D` the normalized surface impedance is
//! `Z = (1 + R) / (1 - R) = (D + N) / (D - N)`, and conversely
//! `R = (Z - 1) / (Z + 1)`. Both directions work tap by tap on filters whose
//! numerator and denominator have the same length.

use crate::error::{BoundaryFilterError, Result};
use crate::transfer_function::{DEGENERATE_TOLERANCE, TransferFunction};

/// Impedance filter `(D + N, D - N)` of a reflectance filter `(N, D)`,
/// normalized so the leading denominator tap is 1.
///
/// # Errors
///
/// `LengthMismatch` if the numerator and denominator lengths differ,
/// `InvalidParameter` if `D[0] - N[0]` is zero (a reflectance of exactly 1
/// at high frequencies has no finite impedance).
pub fn reflectance_to_impedance(tf: &TransferFunction) -> Result<TransferFunction> {
    tf.require_equal_lengths()?;
    let (b, a) = (tf.numerator(), tf.denominator());
    let numerator = a.iter().zip(b).map(|(a, b)| a + b).collect();
    let denominator = a.iter().zip(b).map(|(a, b)| a - b).collect();
    normalize(numerator, denominator)
}

/// Reflectance filter `(N' - D', N' + D')` of an impedance filter `(N', D')`,
/// normalized so the leading denominator tap is 1.
///
/// Inverse of [`reflectance_to_impedance`].
pub fn impedance_to_reflectance(tf: &TransferFunction) -> Result<TransferFunction> {
    tf.require_equal_lengths()?;
    let (b, a) = (tf.numerator(), tf.denominator());
    let numerator = b.iter().zip(a).map(|(b, a)| b - a).collect();
    let denominator = b.iter().zip(a).map(|(b, a)| b + a).collect();
    normalize(numerator, denominator)
}

pub(crate) fn normalize(numerator: Vec<f64>, denominator: Vec<f64>) -> Result<TransferFunction> {
    let a0: f64 = denominator[0];
    if a0.abs() <= DEGENERATE_TOLERANCE || !a0.is_finite() {
        return Err(BoundaryFilterError::invalid(
            "denominator[0]",
            a0,
            "transformed filter has a zero leading denominator tap",
        ));
    }
    TransferFunction::normalized_from(numerator, denominator)
}
