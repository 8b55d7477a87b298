//! Surface absorption descriptors and their mapping to peaking sections.

use serde::{Deserialize, Serialize};

use crate::biquad::{BiquadCoefficients, BiquadDescriptor};
use crate::config::FilterDesign;
use crate::error::{BoundaryFilterError, Result};
use crate::impedance::reflectance_to_impedance;
use crate::transfer_function::TransferFunction;

/// Per-band absorption of a surface.
///
/// `specular[i]` and `diffuse[i]` are absorption coefficients in `[0, 1]`
/// for band `i`. Both sequences have one entry per band of the edge table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSurface")]
pub struct SurfaceDescriptor {
    specular: Vec<f64>,
    diffuse: Vec<f64>,
}

#[derive(Deserialize)]
struct RawSurface {
    specular: Vec<f64>,
    diffuse: Vec<f64>,
}

impl TryFrom<RawSurface> for SurfaceDescriptor {
    type Error = BoundaryFilterError;

    fn try_from(raw: RawSurface) -> Result<Self> {
        SurfaceDescriptor::new(raw.specular, raw.diffuse)
    }
}

impl SurfaceDescriptor {
    /// Creates a surface, checking lengths and the `[0, 1]` range.
    ///
    /// # Errors
    ///
    /// `LengthMismatch` when the two sequences differ in length,
    /// `InvalidParameter` when they are empty or hold a value outside `[0, 1]`.
    pub fn new(specular: Vec<f64>, diffuse: Vec<f64>) -> Result<Self> {
        if specular.len() != diffuse.len() {
            return Err(BoundaryFilterError::LengthMismatch {
                numerator: specular.len(),
                denominator: diffuse.len(),
            });
        }
        if specular.is_empty() {
            return Err(BoundaryFilterError::invalid(
                "specular",
                0.0,
                "need at least one band",
            ));
        }
        if let Some(&bad) = specular
            .iter()
            .chain(diffuse.iter())
            .find(|v| !(0.0..=1.0).contains(*v))
        {
            return Err(BoundaryFilterError::invalid(
                "absorption",
                bad,
                "must be within [0, 1]",
            ));
        }
        Ok(Self { specular, diffuse })
    }

    /// A surface with identical specular and diffuse absorption in every band.
    pub fn uniform(absorption: f64, bands: usize) -> Result<Self> {
        Self::new(vec![absorption; bands], vec![absorption; bands])
    }

    /// A surface whose specular and diffuse absorption are the same per band.
    pub fn from_absorption(absorption: &[f64]) -> Result<Self> {
        Self::new(absorption.to_vec(), absorption.to_vec())
    }

    /// Specular absorption per band.
    pub fn specular(&self) -> &[f64] {
        &self.specular
    }

    /// Diffuse absorption per band.
    pub fn diffuse(&self) -> &[f64] {
        &self.diffuse
    }

    /// Number of bands.
    pub fn bands(&self) -> usize {
        self.specular.len()
    }

    /// Mean of specular and diffuse absorption in `band`, `None` past the
    /// last band.
    pub fn mean_absorption(&self, band: usize) -> Option<f64> {
        Some((self.specular.get(band)? + self.diffuse.get(band)?) * 0.5)
    }
}

/// Amplitude ratio to decibels.
pub fn a2db(a: f64) -> f64 {
    20.0 * a.log10()
}

/// Decibels to amplitude ratio.
pub fn db2a(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Fraction of incident energy reflected by a surface with absorption `a`.
pub fn absorption_to_energy_reflectance(a: f64) -> f64 {
    1.0 - a
}

/// Magnitude of the pressure reflection coefficient for absorption `a`.
pub fn absorption_to_pressure_reflectance(a: f64) -> f64 {
    absorption_to_energy_reflectance(a).sqrt()
}

/// Normalized wall impedance for a real pressure reflectance `r`.
pub fn pressure_reflectance_to_average_wall_impedance(r: f64) -> f64 {
    (1.0 + r) / (1.0 - r)
}

/// Pressure reflectance of a locally reacting wall with normalized
/// impedance `z` hit at an angle whose cosine is `cos_angle`.
pub fn average_wall_impedance_to_pressure_reflectance(z: f64, cos_angle: f64) -> f64 {
    let tmp = z * cos_angle;
    (tmp - 1.0) / (tmp + 1.0)
}

/// Peaking section descriptors for `surface`, one per band up to
/// `design.sections`.
///
/// # Errors
///
/// `InvalidParameter` when the design is invalid, the surface has fewer
/// bands than sections, or an absorption coefficient of a band that feeds a
/// section is `<= 0` (its gain in dB would be undefined). Bands past
/// `design.sections` are not inspected.
pub fn to_filter_descriptors(
    surface: &SurfaceDescriptor,
    design: &FilterDesign,
) -> Result<Vec<BiquadDescriptor>> {
    design.validate()?;
    if surface.bands() < design.sections {
        return Err(BoundaryFilterError::invalid(
            "sections",
            design.sections as f64,
            "surface has fewer bands than filter sections",
        ));
    }

    surface
        .specular
        .iter()
        .zip(&surface.diffuse)
        .take(design.sections)
        .enumerate()
        .map(|(band, (&specular, &diffuse))| {
            if let Some(bad) = [specular, diffuse].into_iter().find(|v| *v <= 0.0) {
                return Err(BoundaryFilterError::invalid(
                    "absorption",
                    bad,
                    "must be > 0, clamp to a small positive floor first",
                ));
            }
            Ok(BiquadDescriptor {
                gain_db: a2db((specular + diffuse) * 0.5),
                centre: design.centre(band),
                q: design.q,
            })
        })
        .collect()
}

/// Maps `surface` to one peaking section per band using the default
/// band layout.
pub fn to_filter_bands(
    surface: &SurfaceDescriptor,
    sample_rate: f64,
) -> Result<Vec<BiquadCoefficients>> {
    to_filter_bands_with(surface, sample_rate, &FilterDesign::default())
}

/// Maps `surface` to one peaking section per band of `design`.
pub fn to_filter_bands_with(
    surface: &SurfaceDescriptor,
    sample_rate: f64,
    design: &FilterDesign,
) -> Result<Vec<BiquadCoefficients>> {
    to_filter_descriptors(surface, design)?
        .iter()
        .map(|d| BiquadCoefficients::from_descriptor(d, sample_rate))
        .collect()
}

/// Zero order reflectance filter for a frequency independent boundary,
/// built from the first band's specular absorption.
pub fn to_flat_reflectance(surface: &SurfaceDescriptor) -> TransferFunction {
    let reflectance = absorption_to_pressure_reflectance(surface.specular[0]);
    TransferFunction::from_parts(vec![reflectance], vec![1.0])
}

/// Zero order impedance filter matching [`to_flat_reflectance`].
///
/// # Errors
///
/// `InvalidParameter` when the first band's specular absorption is 0, a
/// fully reflecting wall has no finite impedance.
pub fn to_flat_impedance(surface: &SurfaceDescriptor) -> Result<TransferFunction> {
    reflectance_to_impedance(&to_flat_reflectance(surface))
}
