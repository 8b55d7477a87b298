//! End to end boundary filter synthesis.
//!
//! surface -> peaking sections -> cascaded reflectance -> impedance, with
//! every recursive filter checked by the stability verifier on the way.
//! Oblique incidence filters are derived on demand from the impedance.

use rayon::prelude::*;

use crate::biquad::BiquadCoefficients;
use crate::cascade::series;
use crate::config::{FilterDesign, SurfacePreset};
use crate::error::{BoundaryFilterError, Result};
use crate::impedance::reflectance_to_impedance;
use crate::oblique::{IncidenceDirection, boundary_coefficients_for};
use crate::stability::{StabilityVerdict, check_stability};
use crate::surface::{
    SurfaceDescriptor, to_filter_bands_with, to_flat_impedance, to_flat_reflectance,
};
use crate::transfer_function::TransferFunction;

/// Filters synthesized for one surface.
#[derive(Debug, Clone)]
pub struct BoundaryFilter {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Peaking sections in band order, empty for a flat boundary
    pub bands: Vec<BiquadCoefficients>,
    /// Cascade of `bands`, the normal incidence pressure reflectance
    pub reflectance: TransferFunction,
    /// Normalized surface impedance derived from `reflectance`
    pub impedance: TransferFunction,
    /// Stability of the impedance denominator.
    ///
    /// The peaking sections have unity gain at DC and Nyquist, so a cascaded
    /// impedance denominator has roots on the unit circle and is reported
    /// unstable. It is only used as an intermediate for [`Self::at_incidence`].
    /// The zero order impedance of a flat boundary is trivially stable.
    pub impedance_verdict: StabilityVerdict,
}

impl BoundaryFilter {
    /// Reflection filter for a wave arriving from `(azimuth, elevation)`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for out of range angles or a degenerate filter,
    /// `UnstableFilter` if the resulting filter is unstable (for instance at
    /// grazing incidence) and `StabilityMismatch` if the verifier disagrees.
    pub fn at_incidence(&self, azimuth: f64, elevation: f64) -> Result<TransferFunction> {
        self.at_direction(IncidenceDirection::new(azimuth, elevation)?)
    }

    /// [`Self::at_incidence`] for an already validated direction.
    pub fn at_direction(&self, direction: IncidenceDirection) -> Result<TransferFunction> {
        let oblique = boundary_coefficients_for(&self.impedance, direction)?;
        require_stable("oblique", &oblique)?;
        Ok(oblique)
    }

    /// Order of the cascaded reflectance filter.
    pub fn order(&self) -> usize {
        self.reflectance.order()
    }
}

/// Synthesizes and verifies the boundary filters of `surface`.
///
/// # Errors
///
/// Any error of the mapper or transforms, `UnstableFilter` when a section
/// or the cascaded reflectance is unstable, and `StabilityMismatch` when
/// the three stability methods disagree on any checked denominator.
pub fn synthesize_boundary(
    surface: &SurfaceDescriptor,
    sample_rate: f64,
    design: &FilterDesign,
) -> Result<BoundaryFilter> {
    let bands = to_filter_bands_with(surface, sample_rate, design)?;
    for bq in &bands {
        log::debug!("{}", bq);
        let section = bq.to_transfer_function();
        require_stable("biquad", &section)?;
    }

    let sections: Vec<TransferFunction> = bands.iter().map(TransferFunction::from).collect();
    let reflectance = series(&sections)?;
    require_stable("reflectance", &reflectance)?;

    let impedance = reflectance_to_impedance(&reflectance)?;
    let impedance_verdict = check_stability(impedance.denominator())?;
    log::debug!(
        "impedance of order {} stable={}",
        impedance.order(),
        impedance_verdict.stable
    );

    Ok(BoundaryFilter {
        sample_rate,
        bands,
        reflectance,
        impedance,
        impedance_verdict,
    })
}

/// Frequency independent boundary built from the first band's specular
/// absorption: zero order reflectance and impedance, no sections.
///
/// # Errors
///
/// `InvalidParameter` for a sample rate that is not positive or a fully
/// reflecting first band, which has no finite impedance.
pub fn synthesize_flat_boundary(
    surface: &SurfaceDescriptor,
    sample_rate: f64,
) -> Result<BoundaryFilter> {
    if !(sample_rate > 0.0 && sample_rate.is_finite()) {
        return Err(BoundaryFilterError::invalid(
            "sample_rate",
            sample_rate,
            "must be positive and finite",
        ));
    }
    let reflectance = to_flat_reflectance(surface);
    let impedance = to_flat_impedance(surface)?;
    let impedance_verdict = check_stability(impedance.denominator())?;
    log::debug!("flat boundary with impedance {:?}", impedance.numerator());

    Ok(BoundaryFilter {
        sample_rate,
        bands: Vec::new(),
        reflectance,
        impedance,
        impedance_verdict,
    })
}

/// Runs [`synthesize_boundary`] for every preset in parallel.
///
/// Results come back in the order of `presets`, each paired with the
/// preset name. One failing surface does not stop the others.
pub fn synthesize_batch(
    presets: &[SurfacePreset],
    sample_rate: f64,
    design: &FilterDesign,
) -> Vec<(String, Result<BoundaryFilter>)> {
    log::info!(
        "synthesizing {} surfaces at {:.1} Hz with {} sections",
        presets.len(),
        sample_rate,
        design.sections
    );

    let results: Vec<(String, Result<BoundaryFilter>)> = presets
        .par_iter()
        .map(|preset| {
            let result = synthesize_boundary(&preset.surface, sample_rate, design);
            if let Err(e) = &result {
                log::warn!("surface '{}' rejected: {}", preset.name, e);
            }
            (preset.name.clone(), result)
        })
        .collect();

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    log::info!("{} of {} surfaces synthesized", presets.len() - failed, presets.len());
    results
}

fn require_stable(stage: &'static str, tf: &TransferFunction) -> Result<StabilityVerdict> {
    let verdict = check_stability(tf.denominator())?;
    if !verdict.stable {
        return Err(BoundaryFilterError::UnstableFilter {
            stage,
            polynomial: tf.denominator().to_vec(),
        });
    }
    Ok(verdict)
}
