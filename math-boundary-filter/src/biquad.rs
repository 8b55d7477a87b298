//! Peaking biquad synthesis.
//!
//! Each frequency band of a surface is modelled by one second order peaking
//! section designed with the RBJ audio EQ cookbook equations.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{BoundaryFilterError, Result};
use crate::transfer_function::TransferFunction;

/// Design parameters of one peaking section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadDescriptor {
    /// Gain at the centre frequency in dB (negative values attenuate)
    pub gain_db: f64,
    /// Centre frequency in Hz
    pub centre: f64,
    /// Q factor
    pub q: f64,
}

impl fmt::Display for BiquadDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Freq:{:.1},Q:{:.3},Gain:{:.2}",
            self.centre, self.q, self.gain_db
        )
    }
}

/// Normalized second order section: numerator `(b0, b1, b2)` and
/// denominator `(1, a1, a2)`.
///
/// Only the descriptor and sample rate are serialized; deserializing
/// synthesizes the section again, so the taps always match the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BiquadDesign", into = "BiquadDesign")]
pub struct BiquadCoefficients {
    descriptor: BiquadDescriptor,
    srate: f64,
    b: [f64; 3],
    a: [f64; 3],
    /// Pre-computed coefficients for fast magnitude response
    r_up0: f64,
    r_up1: f64,
    r_up2: f64,
    r_dw0: f64,
    r_dw1: f64,
    r_dw2: f64,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BiquadDesign {
    descriptor: BiquadDescriptor,
    srate: f64,
}

impl TryFrom<BiquadDesign> for BiquadCoefficients {
    type Error = BoundaryFilterError;

    fn try_from(design: BiquadDesign) -> Result<Self> {
        BiquadCoefficients::from_descriptor(&design.descriptor, design.srate)
    }
}

impl From<BiquadCoefficients> for BiquadDesign {
    fn from(bq: BiquadCoefficients) -> Self {
        BiquadDesign {
            descriptor: bq.descriptor,
            srate: bq.srate,
        }
    }
}

/// Synthesizes a peaking section with `gain_db` at `center_freq`.
///
/// # Errors
///
/// Returns `InvalidParameter` if the sample rate is not a positive finite
/// number, `center_freq` is outside `(0, sample_rate / 2)`, `q <= 0`, or any
/// input is non-finite.
///
/// # Example
///
/// ```rust
/// use math_audio_boundary_filter::synthesize_notch;
///
/// let bq = synthesize_notch(-6.0, 1000.0, 44100.0, 1.414).unwrap();
/// assert_eq!(bq.denominator()[0], 1.0);
/// assert!((bq.log_result(1000.0) + 6.0).abs() < 1e-6);
/// ```
pub fn synthesize_notch(
    gain_db: f64,
    center_freq: f64,
    sample_rate: f64,
    q: f64,
) -> Result<BiquadCoefficients> {
    if sample_rate <= 0.0 || !sample_rate.is_finite() {
        return Err(BoundaryFilterError::invalid(
            "sample_rate",
            sample_rate,
            "must be > 0 and finite",
        ));
    }
    let nyquist = sample_rate / 2.0;
    if center_freq <= 0.0 || center_freq >= nyquist || !center_freq.is_finite() {
        return Err(BoundaryFilterError::invalid(
            "center_freq",
            center_freq,
            "must be > 0 and below the Nyquist frequency",
        ));
    }
    if q <= 0.0 || !q.is_finite() {
        return Err(BoundaryFilterError::invalid("q", q, "must be > 0 and finite"));
    }
    if !gain_db.is_finite() {
        return Err(BoundaryFilterError::invalid(
            "gain_db",
            gain_db,
            "must be finite",
        ));
    }

    Ok(BiquadCoefficients::compute(
        BiquadDescriptor {
            gain_db,
            centre: center_freq,
            q,
        },
        sample_rate,
    ))
}

impl BiquadCoefficients {
    /// Synthesizes the section described by `descriptor`.
    pub fn from_descriptor(descriptor: &BiquadDescriptor, sample_rate: f64) -> Result<Self> {
        synthesize_notch(
            descriptor.gain_db,
            descriptor.centre,
            sample_rate,
            descriptor.q,
        )
    }

    fn compute(descriptor: BiquadDescriptor, srate: f64) -> Self {
        // Intermediate variables
        let a = 10.0_f64.powf(descriptor.gain_db / 40.0);
        let omega = 2.0 * PI * descriptor.centre / srate;
        let sn = omega.sin();
        let cs = omega.cos();
        let alpha = sn / (2.0 * descriptor.q);

        // Raw coefficients
        let b0 = 1.0 + (alpha * a);
        let b1 = -2.0 * cs;
        let b2 = 1.0 - (alpha * a);
        let a0 = 1.0 + (alpha / a);
        let a1 = -2.0 * cs;
        let a2 = 1.0 - (alpha / a);

        let num = [b0 / a0, b1 / a0, b2 / a0];
        let den = [a0 / a0, a1 / a0, a2 / a0];

        Self {
            descriptor,
            srate,
            b: num,
            a: den,
            r_up0: (num[0] + num[1] + num[2]).powi(2),
            r_up1: -4.0 * (num[0] * num[1] + 4.0 * num[0] * num[2] + num[1] * num[2]),
            r_up2: 16.0 * num[0] * num[2],
            r_dw0: (1.0 + den[1] + den[2]).powi(2),
            r_dw1: -4.0 * (den[1] + 4.0 * den[2] + den[1] * den[2]),
            r_dw2: 16.0 * den[2],
        }
    }

    /// Descriptor the section was designed from.
    pub fn descriptor(&self) -> &BiquadDescriptor {
        &self.descriptor
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.srate
    }

    /// Numerator taps `(b0, b1, b2)`.
    pub fn numerator(&self) -> &[f64; 3] {
        &self.b
    }

    /// Denominator taps `(1, a1, a2)`.
    pub fn denominator(&self) -> &[f64; 3] {
        &self.a
    }

    /// Calculates the section's magnitude response at frequency `f` (Hz).
    pub fn result(&self, f: f64) -> f64 {
        let phi = (PI * f / self.srate).sin().powi(2);
        let phi2 = phi * phi;

        let numerator = self.r_up0 + self.r_up1 * phi + self.r_up2 * phi2;
        let denominator = self.r_dw0 + self.r_dw1 * phi + self.r_dw2 * phi2;

        (numerator / denominator).max(0.0).sqrt()
    }

    /// Calculates the section's response in dB at frequency `f` (Hz).
    pub fn log_result(&self, f: f64) -> f64 {
        let result = self.result(f);
        if result > 0.0 {
            20.0 * result.log10()
        } else {
            -200.0
        }
    }

    /// The section as a general transfer function.
    pub fn to_transfer_function(&self) -> TransferFunction {
        TransferFunction::from(self)
    }
}

impl From<&BiquadCoefficients> for TransferFunction {
    fn from(bq: &BiquadCoefficients) -> Self {
        TransferFunction::from_parts(bq.b.to_vec(), bq.a.to_vec())
    }
}

impl From<BiquadCoefficients> for TransferFunction {
    fn from(bq: BiquadCoefficients) -> Self {
        TransferFunction::from(&bq)
    }
}

impl fmt::Display for BiquadCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type:PK,{},Rate:{:.1}", self.descriptor, self.srate)
    }
}

/// Converts bandwidth in octaves to a Q factor.
pub fn bw2q(bw: f64) -> f64 {
    let two_pow_bw = 2.0_f64.powf(bw);
    two_pow_bw.sqrt() / (two_pow_bw - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_one_octave_q() {
        assert_relative_eq!(bw2q(1.0), std::f64::consts::SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_leading_denominator_is_exactly_one() {
        for &gain in &[-60.0, -12.0, -0.5, 0.0, 3.0, 24.0] {
            for &freq in &[20.0, 107.5, 1050.0, 8400.0, 21000.0] {
                for &q in &[0.1, 0.707, 1.414, 10.0] {
                    let bq = synthesize_notch(gain, freq, 44100.0, q).unwrap();
                    assert_eq!(bq.denominator()[0], 1.0, "gain={gain} freq={freq} q={q}");
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let a = synthesize_notch(-3.0, 500.0, 48000.0, 1.414).unwrap();
        let b = synthesize_notch(-3.0, 500.0, 48000.0, 1.414).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gain_at_centre() {
        for &gain in &[-20.0, -6.0, 6.0] {
            let bq = synthesize_notch(gain, 1000.0, 48000.0, 2.0).unwrap();
            assert!(
                approx_eq(bq.log_result(1000.0), gain, 1e-6),
                "peak at centre should be {} dB, got {}",
                gain,
                bq.log_result(1000.0)
            );
            // unity away from the band
            assert!(bq.log_result(20.0).abs() < 0.5);
        }
    }

    #[test]
    fn test_zero_gain_is_transparent() {
        let bq = synthesize_notch(0.0, 1000.0, 48000.0, 1.414).unwrap();
        assert_eq!(bq.numerator(), bq.denominator());
    }

    #[test]
    fn test_result_matches_transfer_function() {
        let bq = synthesize_notch(-9.0, 700.0, 44100.0, 1.414).unwrap();
        let tf = bq.to_transfer_function();
        for &f in &[50.0, 700.0, 5000.0, 15000.0] {
            assert_relative_eq!(bq.result(f), tf.magnitude(f, 44100.0), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_frequency() {
        let err = synthesize_notch(-3.0, 0.0, 48000.0, 1.0).unwrap_err();
        assert!(err.is_parameter_error());
        assert!(synthesize_notch(-3.0, 24000.0, 48000.0, 1.0).is_err());
        assert!(synthesize_notch(-3.0, -100.0, 48000.0, 1.0).is_err());
    }

    #[test]
    fn test_invalid_q_and_rate() {
        assert!(synthesize_notch(-3.0, 1000.0, 48000.0, 0.0).is_err());
        assert!(synthesize_notch(-3.0, 1000.0, 48000.0, -1.0).is_err());
        assert!(synthesize_notch(-3.0, 1000.0, 0.0, 1.0).is_err());
        assert!(synthesize_notch(f64::NAN, 1000.0, 48000.0, 1.0).is_err());
    }

    #[test]
    fn test_json_resynthesizes() {
        let bq = synthesize_notch(-6.0, 1000.0, 48000.0, 2.0).unwrap();
        let json = serde_json::to_string(&bq).unwrap();
        assert!(!json.contains("r_up0"));
        let back: BiquadCoefficients = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bq);
        assert_eq!(back.sample_rate(), 48000.0);
        assert_eq!(back.descriptor().centre, 1000.0);
    }

    #[test]
    fn test_json_rejects_taps_and_bad_design() {
        // taps are derived from the design and cannot be supplied
        let tampered = r#"{"descriptor":{"gain_db":-6.0,"centre":1000.0,"q":2.0},
            "srate":48000.0,"a":[2.0,0.5,0.1]}"#;
        assert!(serde_json::from_str::<BiquadCoefficients>(tampered).is_err());
        let above_nyquist = r#"{"descriptor":{"gain_db":-6.0,"centre":30000.0,"q":2.0},
            "srate":48000.0}"#;
        assert!(serde_json::from_str::<BiquadCoefficients>(above_nyquist).is_err());
    }

    #[test]
    fn test_display() {
        let bq = synthesize_notch(-6.0, 1000.0, 48000.0, 2.0).unwrap();
        let display = format!("{}", bq);
        assert!(display.contains("PK"));
        assert!(display.contains("1000"));
        assert!(display.contains("48000"));
        assert!(display.contains("-6.00"));
    }
}
