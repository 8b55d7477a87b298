//! Boundary impedance filters for room acoustics simulation.
//!
//! This crate turns a per-band surface absorption description into the
//! recursive filters a wave based room simulator applies at its boundaries,
//! and verifies that every one of them is stable.
//!
//! # Features
//!
//! - **Peaking biquad synthesis**: one RBJ peaking section per band
//! - **Cascading**: series combination by polynomial multiplication
//! - **Reflectance / impedance transforms** and oblique incidence filters
//! - **Stability verification** by three independent methods that must agree
//! - **JSON** design configuration, material presets and coefficient export
//!
//! # Example
//!
//! ```rust
//! use math_audio_boundary_filter::{FilterDesign, SurfaceDescriptor, synthesize_boundary};
//!
//! let surface = SurfaceDescriptor::uniform(0.9, 8).unwrap();
//! let filter = synthesize_boundary(&surface, 44100.0, &FilterDesign::default()).unwrap();
//! assert_eq!(filter.order(), 6);
//!
//! let oblique = filter.at_incidence(0.3, 0.1).unwrap();
//! assert_eq!(oblique.denominator()[0], 1.0);
//! ```
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod biquad;
mod cascade;
mod compensated;
mod config;
mod error;
mod impedance;
mod oblique;
mod output;
mod pipeline;
mod stability;
mod surface;
mod transfer_function;

pub use error::{BoundaryFilterError, Result};

pub use biquad::{BiquadCoefficients, BiquadDescriptor, bw2q, synthesize_notch};
pub use cascade::{convolve, series};
pub use config::{FilterDesign, PresetLibrary, SurfacePreset};
pub use impedance::{impedance_to_reflectance, reflectance_to_impedance};
pub use oblique::{IncidenceDirection, boundary_coefficients, boundary_coefficients_for};
pub use output::{CoefficientExport, CoefficientSet};
pub use pipeline::{
    BoundaryFilter, synthesize_batch, synthesize_boundary, synthesize_flat_boundary,
};
pub use stability::{
    MethodVerdicts, STABILITY_MARGIN, StabilityMethod, StabilityVerdict, check_stability,
    is_stable_jury, is_stable_recursive, is_stable_roots, jury_table, polynomial_roots,
    verify_stable,
};
pub use surface::{
    SurfaceDescriptor, a2db, absorption_to_energy_reflectance, absorption_to_pressure_reflectance,
    average_wall_impedance_to_pressure_reflectance, db2a,
    pressure_reflectance_to_average_wall_impedance, to_filter_bands, to_filter_bands_with,
    to_filter_descriptors, to_flat_impedance, to_flat_reflectance,
};
pub use transfer_function::{DEGENERATE_TOLERANCE, TransferFunction};

// ============================================================================
// Design constants
// ============================================================================

/// Frequency band edges in Hz (eight bands)
pub const BAND_EDGES_HZ: [f64; 9] = [
    40.0, 175.0, 350.0, 700.0, 1400.0, 2800.0, 5600.0, 11200.0, 20000.0,
];

/// Q of every peaking section, close to bw2q(1.0) (one octave)
pub const DESIGN_Q: f64 = 1.414;

/// Number of peaking sections synthesized per surface
pub const BIQUAD_SECTIONS: usize = 3;

/// Default sample rate in Hz
pub const SRATE: f64 = 44100.0;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_design_q_is_one_octave() {
        assert_relative_eq!(DESIGN_Q, bw2q(1.0), epsilon = 1e-3);
    }

    #[test]
    fn test_band_edges_increase() {
        assert!(BAND_EDGES_HZ.windows(2).all(|w| w[0] < w[1]));
        assert!(BIQUAD_SECTIONS < BAND_EDGES_HZ.len());
    }
}
