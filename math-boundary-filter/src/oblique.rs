//! Angle dependent reflection filter of a locally reacting boundary.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{BoundaryFilterError, Result};
use crate::impedance::normalize;
use crate::transfer_function::TransferFunction;

/// Direction of an incident wave relative to the surface normal, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncidenceDirection {
    /// Azimuth in `(-pi, pi]`
    pub azimuth: f64,
    /// Elevation in `[-pi/2, pi/2]`
    pub elevation: f64,
}

impl IncidenceDirection {
    /// Normal incidence.
    pub const NORMAL: IncidenceDirection = IncidenceDirection {
        azimuth: 0.0,
        elevation: 0.0,
    };

    /// Creates a direction, checking both angles are in range.
    pub fn new(azimuth: f64, elevation: f64) -> Result<Self> {
        if !(azimuth > -PI && azimuth <= PI) {
            return Err(BoundaryFilterError::invalid(
                "azimuth",
                azimuth,
                "must be within (-pi, pi]",
            ));
        }
        if !(-FRAC_PI_2..=FRAC_PI_2).contains(&elevation) {
            return Err(BoundaryFilterError::invalid(
                "elevation",
                elevation,
                "must be within [-pi/2, pi/2]",
            ));
        }
        Ok(Self { azimuth, elevation })
    }

    /// Creates a direction from angles in degrees.
    pub fn from_degrees(azimuth_deg: f64, elevation_deg: f64) -> Result<Self> {
        Self::new(azimuth_deg.to_radians(), elevation_deg.to_radians())
    }

    /// `cos(azimuth) * cos(elevation)`, the factor applied to the impedance.
    pub fn cosine(&self) -> f64 {
        self.azimuth.cos() * self.elevation.cos()
    }
}

/// Reflection filter of a boundary with impedance filter `(b, a)` for a
/// wave arriving from `(azimuth, elevation)`.
///
/// With `c = cos(azimuth) * cos(elevation)` the taps are
/// `num[k] = b[k] * c - a[k]` and `den[k] = b[k] * c + a[k]`, normalized by
/// `den[0]`. At normal incidence this is the inverse impedance transform.
///
/// # Errors
///
/// `InvalidParameter` when an angle is out of range or `den[0]` is zero,
/// `LengthMismatch` when `b` and `a` differ in length.
pub fn boundary_coefficients(
    impedance: &TransferFunction,
    azimuth: f64,
    elevation: f64,
) -> Result<TransferFunction> {
    boundary_coefficients_for(impedance, IncidenceDirection::new(azimuth, elevation)?)
}

/// [`boundary_coefficients`] for an already validated direction.
pub fn boundary_coefficients_for(
    impedance: &TransferFunction,
    direction: IncidenceDirection,
) -> Result<TransferFunction> {
    impedance.require_equal_lengths()?;
    let ca = direction.azimuth.cos();
    let ce = direction.elevation.cos();
    let (b, a) = (impedance.numerator(), impedance.denominator());

    let numerator = b.iter().zip(a).map(|(b, a)| b * ca * ce - a).collect();
    let denominator = b.iter().zip(a).map(|(b, a)| b * ca * ce + a).collect();

    normalize(numerator, denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impedance::impedance_to_reflectance;
    use std::f64::consts::FRAC_PI_4;

    fn tf(b: &[f64], a: &[f64]) -> TransferFunction {
        TransferFunction::new(b.to_vec(), a.to_vec()).unwrap()
    }

    #[test]
    fn test_direction_range() {
        assert!(IncidenceDirection::new(PI, FRAC_PI_2).is_ok());
        assert!(IncidenceDirection::new(-PI, 0.0).is_err());
        assert!(IncidenceDirection::new(0.0, 1.6).is_err());
        assert!(IncidenceDirection::new(f64::NAN, 0.0).is_err());
        let d = IncidenceDirection::from_degrees(60.0, 0.0).unwrap();
        assert!((d.cosine() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normal_incidence_is_difference_over_sum() {
        let z = tf(&[2.0, 0.5, 0.25], &[1.0, -0.3, 0.1]);
        let r = boundary_coefficients(&z, 0.0, 0.0).unwrap();
        // (b - a, b + a) / (b[0] + a[0])
        let scale = 3.0;
        let expected_num = [1.0 / scale, 0.8 / scale, 0.15 / scale];
        let expected_den = [1.0, 0.2 / scale, 0.35 / scale];
        for k in 0..3 {
            assert!((r.numerator()[k] - expected_num[k]).abs() < 1e-12);
            assert!((r.denominator()[k] - expected_den[k]).abs() < 1e-12);
        }
        assert_eq!(r, impedance_to_reflectance(&z).unwrap());
    }

    #[test]
    fn test_oblique_is_normalized() {
        let z = tf(&[2.0, 0.5, 0.25], &[1.0, -0.3, 0.1]);
        let r = boundary_coefficients(&z, FRAC_PI_4, FRAC_PI_4).unwrap();
        assert_eq!(r.denominator()[0], 1.0);
    }

    #[test]
    fn test_grazing_incidence_is_total_reflection() {
        // cos(pi/2) = 6e-17, so the filter is -a / a
        let z = tf(&[2.0, 0.5], &[1.0, -0.3]);
        let r = boundary_coefficients(&z, 0.0, FRAC_PI_2).unwrap();
        assert!((r.numerator()[0] + 1.0).abs() < 1e-12);
        assert!((r.numerator()[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_leading_tap() {
        // b[0] * c + a[0] = -1 * 1 + 1 = 0
        let z = tf(&[-1.0, 0.5], &[1.0, 0.2]);
        let err = boundary_coefficients(&z, 0.0, 0.0).unwrap_err();
        assert!(err.is_parameter_error());
    }

    #[test]
    fn test_length_mismatch() {
        let z = tf(&[2.0], &[1.0, -0.3]);
        assert!(boundary_coefficients(&z, 0.0, 0.0).unwrap_err().is_length_error());
    }
}
