//! Stability verification of IIR denominators by consensus.
//!
//! A recursive filter is stable when every root of its denominator lies
//! strictly inside the unit circle. Three independent tests are run on the
//! same polynomial and must agree:
//!
//! 1. **Roots**: all roots are located numerically (Aberth iteration) and
//!    their moduli compared against 1.
//! 2. **Recursive**: the Schur-Cohn recursion strips one reflection
//!    coefficient per step and fails as soon as one has magnitude `>= 1`.
//! 3. **Jury**: the Jury table is built down to a single element and every
//!    even row must start with a strictly positive element.
//!
//! # Tolerance
//!
//! Round-off can leave a root exactly on the unit circle, where the three
//! tests would otherwise be decided by noise. Before testing, the
//! polynomial is normalized to a leading tap of 1 and radially scaled,
//! `a[k] / rho^k` with `rho = 1 - STABILITY_MARGIN`, which maps roots `z` to
//! `z / rho`. All three tests then check the strict unit circle on the
//! scaled polynomial, so each one decides "every root has modulus
//! `< 1 - STABILITY_MARGIN`".
//!
//! Cascades of many peaking sections put most of their poles in a tight
//! cluster near `z = 1`. In plain `f64` the expanded polynomial cannot
//! resolve those roots, so root evaluation and both recursions run in
//! double-double arithmetic.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::compensated::{DoubleF64, horner};
use crate::error::{BoundaryFilterError, Result};
use crate::transfer_function::DEGENERATE_TOLERANCE;

/// Roots must lie at least this far inside the unit circle.
pub const STABILITY_MARGIN: f64 = 1.0e-6;

const MAX_ROOT_ITERATIONS: usize = 200;
const ROOT_STEP_TOLERANCE: f64 = 1.0e-14;

/// One of the three stability tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StabilityMethod {
    /// Root moduli
    Roots,
    /// Schur-Cohn reflection coefficient recursion
    Recursive,
    /// Jury table
    Jury,
}

impl StabilityMethod {
    /// All methods, in the order they are run.
    pub const ALL: [StabilityMethod; 3] = [
        StabilityMethod::Roots,
        StabilityMethod::Recursive,
        StabilityMethod::Jury,
    ];

    /// Lower case name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            StabilityMethod::Roots => "roots",
            StabilityMethod::Recursive => "recursive",
            StabilityMethod::Jury => "jury",
        }
    }
}

/// Individual verdicts of the three methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodVerdicts {
    /// Root modulus test
    pub roots: bool,
    /// Schur-Cohn recursion
    pub recursive: bool,
    /// Jury table
    pub jury: bool,
}

impl MethodVerdicts {
    /// Verdict of one method.
    pub fn get(&self, method: StabilityMethod) -> bool {
        match method {
            StabilityMethod::Roots => self.roots,
            StabilityMethod::Recursive => self.recursive,
            StabilityMethod::Jury => self.jury,
        }
    }

    /// The shared verdict, or `None` when the methods disagree.
    pub fn consensus(&self) -> Option<bool> {
        if self.roots == self.recursive && self.recursive == self.jury {
            Some(self.roots)
        } else {
            None
        }
    }
}

impl fmt::Display for MethodVerdicts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "roots={}, recursive={}, jury={}",
            self.roots, self.recursive, self.jury
        )
    }
}

/// Agreed stability of a denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityVerdict {
    /// `true` when every root is inside the unit circle
    pub stable: bool,
    /// What each method concluded (always unanimous here)
    pub verdicts: MethodVerdicts,
}

impl StabilityVerdict {
    /// Methods that took part in the verdict.
    pub fn methods(&self) -> &'static [StabilityMethod] {
        &StabilityMethod::ALL
    }
}

/// Returns `true` when `denominator` describes a stable filter.
///
/// # Errors
///
/// `InvalidParameter` for an empty polynomial, a non-finite tap or a zero
/// leading tap; `StabilityMismatch` when the three methods disagree.
pub fn verify_stable(denominator: &[f64]) -> Result<bool> {
    check_stability(denominator).map(|v| v.stable)
}

/// Runs all three tests on `denominator` and returns their agreed verdict.
///
/// See [`verify_stable`] for the error conditions.
pub fn check_stability(denominator: &[f64]) -> Result<StabilityVerdict> {
    let normalized = normalize(denominator)?;
    let scaled = contract(&normalized);

    let verdicts = MethodVerdicts {
        roots: is_stable_roots(&scaled),
        recursive: is_stable_recursive(&scaled),
        jury: is_stable_jury(&scaled),
    };

    match verdicts.consensus() {
        Some(stable) => {
            log::trace!("order {} denominator stable={}", normalized.len() - 1, stable);
            Ok(StabilityVerdict { stable, verdicts })
        }
        None => {
            log::error!(
                "stability methods disagree ({}) on {:?}",
                verdicts,
                normalized
            );
            Err(BoundaryFilterError::StabilityMismatch {
                polynomial: normalized,
                verdicts,
            })
        }
    }
}

fn normalize(polynomial: &[f64]) -> Result<Vec<f64>> {
    let Some(&a0) = polynomial.first() else {
        return Err(BoundaryFilterError::invalid(
            "denominator",
            0.0,
            "must hold at least one tap",
        ));
    };
    if let Some(&bad) = polynomial.iter().find(|v| !v.is_finite()) {
        return Err(BoundaryFilterError::invalid(
            "denominator",
            bad,
            "taps must be finite",
        ));
    }
    if a0.abs() <= DEGENERATE_TOLERANCE {
        return Err(BoundaryFilterError::invalid(
            "denominator[0]",
            a0,
            "leading denominator tap must be non-zero",
        ));
    }
    Ok(polynomial.iter().map(|v| v / a0).collect())
}

/// `a[k] / rho^k`: moves every root outward by `1 / rho`.
fn contract(polynomial: &[f64]) -> Vec<f64> {
    let inv_rho = 1.0 / (1.0 - STABILITY_MARGIN);
    let mut scale = 1.0;
    polynomial
        .iter()
        .map(|&v| {
            let scaled = v * scale;
            scale *= inv_rho;
            scaled
        })
        .collect()
}

/// Stable when every root of `polynomial` has modulus strictly below 1.
pub fn is_stable_roots(polynomial: &[f64]) -> bool {
    polynomial_roots(polynomial).iter().all(|r| r.norm() < 1.0)
}

/// Schur-Cohn test: stable when every reflection coefficient has
/// magnitude strictly below 1.
///
/// Runs in place over a shrinking scratch buffer instead of recursing, in
/// double-double arithmetic.
pub fn is_stable_recursive(polynomial: &[f64]) -> bool {
    if polynomial.len() <= 1 {
        return true;
    }
    let a0 = DoubleF64::from(polynomial[0]);
    let mut current: Vec<DoubleF64> = polynomial
        .iter()
        .map(|&v| DoubleF64::from(v) / a0)
        .collect();
    let mut next = vec![DoubleF64::default(); current.len()];
    let mut len = current.len();

    while len > 1 {
        let rci = current[len - 1];
        if !(rci.abs() < DoubleF64::ONE) {
            return false;
        }
        let next_size = len - 1;
        let denom = DoubleF64::ONE - rci * rci;
        for i in 0..next_size {
            next[i] = (current[i] - rci * current[next_size - i]) / denom;
        }
        std::mem::swap(&mut current, &mut next);
        len = next_size;
    }
    true
}

/// Builds the Jury table of `polynomial`.
///
/// Rows alternate between a polynomial and its reversal. Each reduced row
/// is `row[j] - (row[last] / row[0]) * reversed[j]` without its last
/// (zero) element, down to a single element. Construction stops early if
/// a row starts with zero, since the next ratio is undefined.
///
/// The table is computed in double-double and rounded for display.
pub fn jury_table(polynomial: &[f64]) -> Vec<Vec<f64>> {
    jury_rows(polynomial)
        .into_iter()
        .map(|row| row.into_iter().map(DoubleF64::to_f64).collect())
        .collect()
}

fn jury_rows(polynomial: &[f64]) -> Vec<Vec<DoubleF64>> {
    let mut table = Vec::with_capacity(2 * polynomial.len());
    let mut row: Vec<DoubleF64> = polynomial.iter().map(|&v| DoubleF64::from(v)).collect();

    loop {
        let reversed: Vec<DoubleF64> = row.iter().rev().copied().collect();
        let done = row.len() <= 1 || row[0].hi() == 0.0;
        if done {
            table.push(row);
            table.push(reversed);
            return table;
        }
        let mult = row[row.len() - 1] / row[0];
        let reduced: Vec<DoubleF64> = (0..row.len() - 1)
            .map(|j| row[j] - reversed[j] * mult)
            .collect();
        table.push(row);
        table.push(reversed);
        row = reduced;
    }
}

/// Jury criterion: stable when the first element of every even row of the
/// table is strictly positive.
pub fn is_stable_jury(polynomial: &[f64]) -> bool {
    if polynomial.is_empty() {
        return true;
    }
    // the criterion assumes a positive leading tap
    let sign = polynomial[0].signum();
    let positive: Vec<f64> = polynomial.iter().map(|v| v * sign).collect();
    jury_rows(&positive)
        .iter()
        .step_by(2)
        .all(|row| row[0].hi() > 0.0)
}

/// All complex roots of `polynomial` (highest power first).
///
/// Uses Aberth-Ehrlich simultaneous iteration with the polynomial and its
/// derivative evaluated in double-double, so clustered roots close to the
/// unit circle are located to far better than `f64` Horner accuracy.
/// Leading zeros are not allowed; a constant polynomial has no roots.
pub fn polynomial_roots(polynomial: &[f64]) -> Vec<Complex64> {
    let n = polynomial.len().saturating_sub(1);
    if n == 0 || polynomial[0] == 0.0 {
        return Vec::new();
    }

    let lead = polynomial[0];
    let p: Vec<f64> = polynomial.iter().map(|c| c / lead).collect();
    let dp: Vec<f64> = (0..n).map(|k| p[k] * (n - k) as f64).collect();

    if n == 1 {
        return vec![Complex64::new(-p[1], 0.0)];
    }

    // start on a circle sized from the coefficients, angles offset to break symmetry
    let radius = (1..=n)
        .map(|k| p[k].abs().powf(1.0 / k as f64))
        .fold(0.0_f64, f64::max)
        .max(1.0e-3);
    let mut roots: Vec<Complex64> = (0..n)
        .map(|k| Complex64::from_polar(radius, 2.0 * PI * k as f64 / n as f64 + 0.4))
        .collect();

    for iteration in 0..MAX_ROOT_ITERATIONS {
        let mut max_step = 0.0_f64;
        for i in 0..n {
            let zi = roots[i];
            let pv = horner(&p, zi);
            if pv.norm() == 0.0 {
                continue;
            }
            let dv = horner(&dp, zi);
            let ratio = if dv.norm() == 0.0 {
                Complex64::new(1.0e-300, 0.0)
            } else {
                pv / dv
            };
            let repulsion: Complex64 = roots
                .iter()
                .enumerate()
                .filter(|&(j, zj)| j != i && *zj != zi)
                .map(|(_, zj)| (zi - zj).inv())
                .sum();
            let step = ratio / (Complex64::new(1.0, 0.0) - ratio * repulsion);
            if !step.is_finite() {
                continue;
            }
            roots[i] = zi - step;
            max_step = max_step.max(step.norm() / roots[i].norm().max(1.0));
        }
        if max_step <= ROOT_STEP_TOLERANCE {
            log::trace!("{} roots after {} iterations", n, iteration + 1);
            return roots;
        }
    }
    log::warn!(
        "root iteration stopped after {} steps without converging on {:?}",
        MAX_ROOT_ITERATIONS,
        polynomial
    );
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::convolve;
    use approx::assert_relative_eq;

    /// Real polynomial with the given real roots and complex conjugate pairs.
    fn from_roots(real: &[f64], pairs: &[(f64, f64)]) -> Vec<f64> {
        let mut poly = vec![1.0];
        for &r in real {
            poly = convolve(&poly, &[1.0, -r]);
        }
        for &(radius, angle) in pairs {
            poly = convolve(&poly, &[1.0, -2.0 * radius * angle.cos(), radius * radius]);
        }
        poly
    }

    #[test]
    fn test_constant_is_stable() {
        assert!(verify_stable(&[1.0]).unwrap());
        assert!(verify_stable(&[-3.0]).unwrap());
    }

    #[test]
    fn test_first_order() {
        assert!(verify_stable(&[1.0, -0.5]).unwrap());
        assert!(!verify_stable(&[1.0, -1.5]).unwrap());
        assert!(!verify_stable(&[1.0, 2.0]).unwrap());
    }

    #[test]
    fn test_leading_tap_is_normalized() {
        // 2 - z^-1 has its root at 0.5
        assert!(verify_stable(&[2.0, -1.0]).unwrap());
        assert!(verify_stable(&[-2.0, 1.0]).unwrap());
    }

    #[test]
    fn test_invalid_polynomials() {
        assert!(verify_stable(&[]).unwrap_err().is_parameter_error());
        assert!(verify_stable(&[0.0, 1.0]).unwrap_err().is_parameter_error());
        assert!(verify_stable(&[1.0, f64::NAN]).unwrap_err().is_parameter_error());
    }

    #[test]
    fn test_known_stable_and_unstable() {
        let stable = from_roots(&[0.5, -0.3], &[(0.95, 0.3), (0.7, 2.0)]);
        let unstable = from_roots(&[0.5, -1.2], &[(0.95, 0.3)]);
        let marginal = from_roots(&[1.0], &[(0.9, 1.0)]);

        let verdict = check_stability(&stable).unwrap();
        assert!(verdict.stable);
        assert_eq!(verdict.verdicts.consensus(), Some(true));
        assert_eq!(verdict.methods().len(), 3);

        assert!(!verify_stable(&unstable).unwrap());
        // a root on the unit circle is not strictly inside
        assert!(!verify_stable(&marginal).unwrap());
    }

    #[test]
    fn test_root_inside_margin_is_unstable() {
        let just_inside = from_roots(&[1.0 - 0.1 * STABILITY_MARGIN], &[]);
        assert!(!verify_stable(&just_inside).unwrap());
        let clear = from_roots(&[1.0 - 10.0 * STABILITY_MARGIN], &[]);
        assert!(verify_stable(&clear).unwrap());
    }

    #[test]
    fn test_trailing_zero_taps() {
        // roots at 0 are stable
        assert!(verify_stable(&[1.0, -0.5, 0.0, 0.0]).unwrap());
    }

    #[test]
    fn test_polynomial_roots_quadratic() {
        // z^2 - 3z + 2 = (z - 1)(z - 2)
        let mut roots: Vec<f64> = polynomial_roots(&[1.0, -3.0, 2.0]).iter().map(|r| r.re).collect();
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(roots[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(roots[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_polynomial_roots_complex_pair() {
        let poly = from_roots(&[], &[(0.8, 1.2), (0.5, 2.5)]);
        let roots = polynomial_roots(&poly);
        assert_eq!(roots.len(), 4);
        let mut moduli: Vec<f64> = roots.iter().map(|r| r.norm()).collect();
        moduli.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(moduli[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(moduli[3], 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_jury_table_shape() {
        let table = jury_table(&[1.0, -0.5, 0.2, 0.1]);
        // 4, 3, 2 and 1 element rows, each followed by its reversal
        assert_eq!(table.len(), 8);
        assert_eq!(table[0], vec![1.0, -0.5, 0.2, 0.1]);
        assert_eq!(table[1], vec![0.1, 0.2, -0.5, 1.0]);
        assert_eq!(table[2].len(), 3);
        assert_eq!(table[6].len(), 1);
        // first reduced row starts with a0 (1 - k^2)
        assert_relative_eq!(table[2][0], 1.0 - 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_individual_methods_agree() {
        let cases = [
            from_roots(&[0.2], &[(0.99, 0.05), (0.98, 0.1), (0.9, 1.5)]),
            from_roots(&[-0.999], &[(0.5, 0.5)]),
            from_roots(&[0.3], &[(1.05, 0.2)]),
            from_roots(&[1.5, -1.5], &[]),
        ];
        for poly in &cases {
            let r = is_stable_roots(poly);
            assert_eq!(r, is_stable_recursive(poly), "{:?}", poly);
            assert_eq!(r, is_stable_jury(poly), "{:?}", poly);
        }
    }

    // denominators of six section cascades at oblique incidence; their
    // poles cluster just inside and just outside the unit circle
    const CLUSTERED_STABLE: [f64; 13] = [
        1.0,
        -8.88390251510105,
        34.7172544697431,
        -77.05594493482391,
        102.46137895927313,
        -72.0013196695057,
        -2.4652438273627544,
        61.64618801677797,
        -68.38915527240839,
        41.081337707355495,
        -14.930997193897879,
        3.107218630162429,
        -0.2868143702123765,
    ];
    const CLUSTERED_UNSTABLE: [f64; 13] = [
        1.0,
        -9.214799550425766,
        37.71875270616444,
        -89.19094604121373,
        131.1340166701068,
        -115.5065632899232,
        41.13893157302662,
        33.47075685403948,
        -58.08419923249304,
        40.30644799615645,
        -15.97616740768413,
        3.550006081294477,
        -0.3462363590484038,
    ];

    #[test]
    fn test_clustered_poles_agree() {
        let stable = check_stability(&CLUSTERED_STABLE).unwrap();
        assert!(stable.stable, "{}", stable.verdicts);

        let unstable = check_stability(&CLUSTERED_UNSTABLE).unwrap();
        assert!(!unstable.stable, "{}", unstable.verdicts);
    }

    #[test]
    fn test_clustered_root_moduli() {
        // largest root modulus is 0.998993125 to twelve digits
        let roots = polynomial_roots(&CLUSTERED_STABLE);
        assert_eq!(roots.len(), 12);
        let largest = roots.iter().map(|r| r.norm()).fold(0.0, f64::max);
        assert_relative_eq!(largest, 0.998993125, epsilon = 1e-6);
        for r in &roots {
            assert!(horner(&CLUSTERED_STABLE, *r).norm() < 1e-12, "{r}");
        }
    }

    #[test]
    fn test_consensus() {
        let all = MethodVerdicts {
            roots: true,
            recursive: true,
            jury: true,
        };
        let split = MethodVerdicts {
            roots: true,
            recursive: false,
            jury: true,
        };
        assert_eq!(all.consensus(), Some(true));
        assert_eq!(split.consensus(), None);
        assert!(!split.get(StabilityMethod::Recursive));
        assert_eq!(split.to_string(), "roots=true, recursive=false, jury=true");
        assert_eq!(StabilityMethod::Jury.name(), "jury");
    }
}
