//! Series combination of filters by polynomial multiplication.

use crate::error::{BoundaryFilterError, Result};
use crate::transfer_function::TransferFunction;

/// Multiplies two polynomials given in coefficient form.
///
/// The result has `a.len() + b.len() - 1` coefficients. An empty operand
/// yields an empty product.
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut ret = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            ret[i + j] += x * y;
        }
    }
    ret
}

/// Connects `filters` in series, returning the single equivalent filter.
///
/// Numerators and denominators are convolved independently, folding from
/// left to right, so the result's degrees are the sums of the input
/// degrees. A single filter is returned unchanged.
///
/// # Errors
///
/// Returns `InvalidParameter` if `filters` is empty.
pub fn series(filters: &[TransferFunction]) -> Result<TransferFunction> {
    let (first, rest) = filters.split_first().ok_or_else(|| {
        BoundaryFilterError::invalid("filters", 0.0, "need at least one filter to cascade")
    })?;

    let combined = rest.iter().fold(first.clone(), |acc, tf| {
        TransferFunction::from_parts(
            convolve(acc.numerator(), tf.numerator()),
            convolve(acc.denominator(), tf.denominator()),
        )
    });

    log::debug!(
        "cascaded {} sections into order {} filter",
        filters.len(),
        combined.order()
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biquad::synthesize_notch;
    use approx::assert_relative_eq;

    fn tf(b: &[f64], a: &[f64]) -> TransferFunction {
        TransferFunction::new(b.to_vec(), a.to_vec()).unwrap()
    }

    #[test]
    fn test_convolve_known_product() {
        // (1 + 2x)(3 + x) = 3 + 7x + 2x^2
        assert_eq!(convolve(&[1.0, 2.0], &[3.0, 1.0]), vec![3.0, 7.0, 2.0]);
        assert_eq!(convolve(&[2.0], &[1.0, -1.0, 0.5]), vec![2.0, -2.0, 1.0]);
        assert!(convolve(&[], &[1.0]).is_empty());
    }

    #[test]
    fn test_convolve_commutes() {
        let a = [1.0, -0.3, 0.2];
        let b = [0.5, 0.1];
        assert_eq!(convolve(&a, &b), convolve(&b, &a));
    }

    #[test]
    fn test_series_single_is_identity() {
        let a = tf(&[0.9, -1.7, 0.8], &[1.0, -1.7, 0.75]);
        assert_eq!(series(std::slice::from_ref(&a)).unwrap(), a);
    }

    #[test]
    fn test_series_degrees_add() {
        let a = tf(&[0.9, -1.7, 0.8], &[1.0, -1.7, 0.75]);
        let b = tf(&[1.0, 0.5], &[1.0, -0.25, 0.1, 0.05]);
        let c = series(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(
            c.numerator_degree(),
            a.numerator_degree() + b.numerator_degree()
        );
        assert_eq!(
            c.denominator_degree(),
            a.denominator_degree() + b.denominator_degree()
        );
    }

    #[test]
    fn test_series_empty_fails() {
        assert!(series(&[]).unwrap_err().is_parameter_error());
    }

    #[test]
    fn test_series_response_is_product() {
        let sr = 44100.0;
        let a = synthesize_notch(-6.0, 300.0, sr, 1.414).unwrap().to_transfer_function();
        let b = synthesize_notch(-3.0, 2000.0, sr, 1.414).unwrap().to_transfer_function();
        let c = series(&[a.clone(), b.clone()]).unwrap();
        for &f in &[100.0, 300.0, 1000.0, 2000.0, 8000.0] {
            assert_relative_eq!(
                c.magnitude(f, sr),
                a.magnitude(f, sr) * b.magnitude(f, sr),
                epsilon = 1e-9
            );
        }
        assert_eq!(c.denominator()[0], 1.0);
    }
}
