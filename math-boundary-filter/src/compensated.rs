//! Double-double arithmetic for the stability tests.
//!
//! A value is the unevaluated sum `hi + lo` of two `f64` with
//! `|lo| <= ulp(hi) / 2`, giving about 106 bits of significand. High order
//! denominators whose poles cluster near `z = 1` lose most of their digits
//! in plain `f64` Horner evaluation and Schur-Cohn reduction; carrying the
//! rounding error of every operation keeps the verdicts reliable.

use num_complex::Complex64;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// `s + e == a + b` exactly.
#[inline(always)]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// [`two_sum`] for `|a| >= |b|`.
#[inline(always)]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

/// `p + e == a * b` exactly.
#[inline(always)]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let e = a.mul_add(b, -p);
    (p, e)
}

/// Ordered by `hi` then `lo`, which is numeric order for normalized values.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub(crate) struct DoubleF64 {
    hi: f64,
    lo: f64,
}

impl DoubleF64 {
    pub(crate) const ONE: DoubleF64 = DoubleF64 { hi: 1.0, lo: 0.0 };

    /// Leading part; carries the sign and magnitude of the value.
    pub(crate) fn hi(self) -> f64 {
        self.hi
    }

    /// Nearest `f64`.
    pub(crate) fn to_f64(self) -> f64 {
        self.hi + self.lo
    }

    pub(crate) fn abs(self) -> Self {
        if self.hi < 0.0 { -self } else { self }
    }
}

impl From<f64> for DoubleF64 {
    fn from(v: f64) -> Self {
        DoubleF64 { hi: v, lo: 0.0 }
    }
}

impl Neg for DoubleF64 {
    type Output = Self;

    fn neg(self) -> Self {
        DoubleF64 {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

impl Add for DoubleF64 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let (s, e) = two_sum(self.hi, rhs.hi);
        let (t, f) = two_sum(self.lo, rhs.lo);
        let (s, e) = quick_two_sum(s, e + t);
        let (hi, lo) = quick_two_sum(s, e + f);
        DoubleF64 { hi, lo }
    }
}

impl Add<f64> for DoubleF64 {
    type Output = Self;

    fn add(self, rhs: f64) -> Self {
        let (s, e) = two_sum(self.hi, rhs);
        let (hi, lo) = quick_two_sum(s, e + self.lo);
        DoubleF64 { hi, lo }
    }
}

impl Sub for DoubleF64 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for DoubleF64 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let (p, e) = two_prod(self.hi, rhs.hi);
        let e = e + (self.hi * rhs.lo + self.lo * rhs.hi);
        let (hi, lo) = quick_two_sum(p, e);
        DoubleF64 { hi, lo }
    }
}

impl Mul<f64> for DoubleF64 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        let (p, e) = two_prod(self.hi, rhs);
        let (hi, lo) = quick_two_sum(p, e + self.lo * rhs);
        DoubleF64 { hi, lo }
    }
}

impl Div for DoubleF64 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        // three rounds of long division on the leading parts
        let q1 = self.hi / rhs.hi;
        let r = self - rhs * q1;
        let q2 = r.hi / rhs.hi;
        let r = r - rhs * q2;
        let q3 = r.hi / rhs.hi;
        let (hi, lo) = quick_two_sum(q1, q2);
        DoubleF64 { hi, lo } + q3
    }
}

/// Horner evaluation of a real polynomial (highest power first) at a
/// complex point, accumulated in double-double.
pub(crate) fn horner(taps: &[f64], z: Complex64) -> Complex64 {
    let mut re = DoubleF64::default();
    let mut im = DoubleF64::default();
    for &t in taps {
        let next_re = re * z.re - im * z.im + t;
        let next_im = re * z.im + im * z.re;
        re = next_re;
        im = next_im;
    }
    Complex64::new(re.to_f64(), im.to_f64())
}
