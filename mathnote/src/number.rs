//! Numeric literals: exact rationals with a floating-point fallback.
//!
//! Integer and decimal literals become exact rationals (`2.5` is `5/2`).
//! Arithmetic stays exact until an operation overflows `i128` or produces an
//! irrational result, at which point it degrades to `f64`.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Normalized `numerator / denominator`; the denominator is positive and
    /// the fraction is in lowest terms.
    Rational(i128, i128),
    Real(f64),
}

fn gcd(a: i128, b: i128) -> u128 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Number {
    pub const ZERO: Number = Number::Rational(0, 1);
    pub const ONE: Number = Number::Rational(1, 1);
    pub const MINUS_ONE: Number = Number::Rational(-1, 1);

    pub fn integer(n: i128) -> Self {
        Number::Rational(n, 1)
    }

    /// Builds a normalized rational, or `None` when the denominator is zero
    /// or the normalized fraction does not fit in `i128`.
    pub fn rational(num: i128, den: i128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = i128::try_from(gcd(num, den)).ok()?.max(1);
        let (mut n, mut d) = (num / g, den / g);
        if d < 0 {
            n = n.checked_neg()?;
            d = d.checked_neg()?;
        }
        Some(Number::Rational(n, d))
    }

    /// Parses a literal matching `[0-9]+(\.[0-9]*)?|\.[0-9]+`.
    pub fn from_literal(literal: &str) -> Option<Self> {
        let (int_part, frac_part) = match literal.split_once('.') {
            Some((i, f)) => (i, f),
            None => (literal, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let exact = (|| {
            let den = 10i128.checked_pow(u32::try_from(frac_part.len()).ok()?)?;
            let digits = format!("{int_part}{frac_part}");
            let num: i128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };
            Number::rational(num, den)
        })();
        exact.or_else(|| literal.parse::<f64>().ok().map(Number::Real))
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Rational(n, d) => n as f64 / d as f64,
            Number::Real(x) => x,
        }
    }

    /// The integer value, if this is an exact integer.
    pub fn as_integer(self) -> Option<i128> {
        match self {
            Number::Rational(n, 1) => Some(n),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        match self {
            Number::Rational(_, d) => d == 1,
            Number::Real(x) => x.fract() == 0.0,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Rational(n, _) => n == 0,
            Number::Real(x) => x == 0.0,
        }
    }

    pub fn is_one(self) -> bool {
        matches!(self, Number::Rational(1, 1)) || matches!(self, Number::Real(x) if x == 1.0)
    }

    pub fn is_negative(self) -> bool {
        match self {
            Number::Rational(n, _) => n < 0,
            Number::Real(x) => x < 0.0,
        }
    }

    pub fn neg(self) -> Self {
        match self {
            Number::Rational(n, d) => match n.checked_neg() {
                Some(n) => Number::Rational(n, d),
                None => Number::Real(-(n as f64) / d as f64),
            },
            Number::Real(x) => Number::Real(-x),
        }
    }

    pub fn abs(self) -> Self {
        if self.is_negative() { self.neg() } else { self }
    }

    pub fn add(self, other: Self) -> Self {
        if let (Number::Rational(a, b), Number::Rational(c, d)) = (self, other) {
            let exact = (|| {
                let num = a.checked_mul(d)?.checked_add(c.checked_mul(b)?)?;
                Number::rational(num, b.checked_mul(d)?)
            })();
            if let Some(n) = exact {
                return n;
            }
        }
        Number::Real(self.to_f64() + other.to_f64())
    }

    pub fn sub(self, other: Self) -> Self {
        self.add(other.neg())
    }

    pub fn mul(self, other: Self) -> Self {
        if let (Number::Rational(a, b), Number::Rational(c, d)) = (self, other) {
            let exact = (|| Number::rational(a.checked_mul(c)?, b.checked_mul(d)?))();
            if let Some(n) = exact {
                return n;
            }
        }
        Number::Real(self.to_f64() * other.to_f64())
    }

    /// Exact division; `None` on division by zero.
    pub fn div(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        if let (Number::Rational(a, b), Number::Rational(c, d)) = (self, other) {
            let exact = (|| Number::rational(a.checked_mul(d)?, b.checked_mul(c)?))();
            if let Some(n) = exact {
                return Some(n);
            }
        }
        Some(Number::Real(self.to_f64() / other.to_f64()))
    }

    /// Remainder with the sign of the divisor; `None` on division by zero.
    pub fn rem(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        if let (Number::Rational(a, b), Number::Rational(c, d)) = (self, other) {
            // a/b mod c/d == (a*d mod c*b) / (b*d)
            let exact = (|| {
                let x = a.checked_mul(d)?;
                let y = c.checked_mul(b)?;
                let mut r = x.checked_rem(y)?;
                if r != 0 && (r < 0) != (y < 0) {
                    r = r.checked_add(y)?;
                }
                Number::rational(r, b.checked_mul(d)?)
            })();
            if let Some(n) = exact {
                return Some(n);
            }
        }
        let (x, y) = (self.to_f64(), other.to_f64());
        let mut r = x % y;
        if r != 0.0 && (r < 0.0) != (y < 0.0) {
            r += y;
        }
        Some(Number::Real(r))
    }

    /// Raises to a power. Exact for rational bases with integer exponents
    /// when the result fits; `None` when the result is undefined (zero to a
    /// negative power) or not real.
    pub fn pow(self, exponent: Self) -> Option<Self> {
        if let (Number::Rational(n, d), Some(e)) = (self, exponent.as_integer()) {
            if n == 0 && e < 0 {
                return None;
            }
            let exact = (|| {
                let k = u32::try_from(e.unsigned_abs()).ok()?;
                let (pn, pd) = (n.checked_pow(k)?, d.checked_pow(k)?);
                if e < 0 { Number::rational(pd, pn) } else { Number::rational(pn, pd) }
            })();
            if let Some(v) = exact {
                return Some(v);
            }
        }
        let (b, e) = (self.to_f64(), exponent.to_f64());
        if b == 0.0 && e < 0.0 {
            return None;
        }
        let r = b.powf(e);
        (!r.is_nan()).then_some(Number::Real(r))
    }

    /// `n!` for non-negative integers: exact while it fits in `i128`, then
    /// floating point while it fits in `f64`.
    pub fn factorial(self) -> Option<Self> {
        let n = match self {
            Number::Rational(n, 1) if n >= 0 => n,
            Number::Real(x) if x >= 0.0 && x.fract() == 0.0 && x <= 170.0 => x as i128,
            _ => return None,
        };
        if n > 170 {
            return None;
        }
        let mut exact: Option<i128> = Some(1);
        let mut approx = 1.0f64;
        for k in 2..=n {
            exact = exact.and_then(|acc| acc.checked_mul(k));
            approx *= k as f64;
        }
        Some(match exact {
            Some(v) if matches!(self, Number::Rational(..)) => Number::integer(v),
            _ => Number::Real(approx),
        })
    }

    pub fn compare(self, other: Self) -> Option<Ordering> {
        if let (Number::Rational(a, b), Number::Rational(c, d)) = (self, other) {
            if let (Some(x), Some(y)) = (a.checked_mul(d), c.checked_mul(b)) {
                return Some(x.cmp(&y));
            }
        }
        self.to_f64().partial_cmp(&other.to_f64())
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Rational(a, b), Number::Rational(c, d)) => a == c && b == d,
            (Number::Real(x), Number::Real(y)) => x == y,
            _ => false,
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::integer(n as i128)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Rational(n, 1) => write!(f, "{n}"),
            Number::Rational(n, d) => write!(f, "{n}/{d}"),
            Number::Real(x) => write!(f, "{x}"),
        }
    }
}
