//! Arbitrary precision decimals using dashu
//!
//! Uses dashu-float (DBig) so measurement magnitudes survive any chain
//! of unit conversions without compounding rounding error.

use dashu_float::DBig;
use dashu_int::IBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("invalid number format: {0}")]
    Parse(String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Working precision for calculations (decimal digits)
const WORK_PRECISION: usize = 50;

/// Arbitrary precision decimal number
///
/// Thin wrapper around dashu-float's DBig. All operations return
/// Results or new Numbers - never panic.
#[derive(Debug, Clone)]
pub struct Number {
    inner: DBig,
}

impl Number {
    // ========== Construction ==========

    /// Ensure a DBig has adequate precision for calculations
    fn with_work_precision(val: DBig) -> DBig {
        val.with_precision(WORK_PRECISION).value()
    }

    /// Create from string representation
    ///
    /// Supports plain decimals ("123", "3.14", "-0.5") and scientific
    /// notation ("1.5e10").
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();
        let inner: DBig = s.parse().map_err(|_| NumberError::Parse(s.to_string()))?;
        Ok(Self {
            inner: Self::with_work_precision(inner),
        })
    }

    /// Create from i64
    pub fn from_i64(n: i64) -> Self {
        Self {
            inner: Self::with_work_precision(DBig::from(n)),
        }
    }

    /// Exact decimal literal: mantissa * 10^exponent
    ///
    /// `Number::scaled(3048, -4)` is exactly 0.3048.
    pub fn scaled(mantissa: i64, exponent: isize) -> Self {
        let inner = DBig::from_parts(IBig::from(mantissa), exponent);
        Self {
            inner: Self::with_work_precision(inner),
        }
    }

    /// Create from ratio, rounded to working precision
    pub fn from_ratio(num: i64, den: i64) -> Result<Self, NumberError> {
        Self::from_i64(num).checked_div(&Self::from_i64(den))
    }

    /// Additive identity
    pub fn zero() -> Self {
        Self::from_i64(0)
    }

    /// Multiplicative identity
    pub fn one() -> Self {
        Self::from_i64(1)
    }

    // ========== Predicates ==========

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.inner == DBig::ZERO
    }

    /// Check if negative
    pub fn is_negative(&self) -> bool {
        self.inner < DBig::ZERO
    }

    // ========== Basic Arithmetic ==========

    /// Addition
    pub fn add(&self, other: &Self) -> Self {
        Self {
            inner: &self.inner + &other.inner,
        }
    }

    /// Subtraction
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            inner: &self.inner - &other.inner,
        }
    }

    /// Multiplication
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            inner: &self.inner * &other.inner,
        }
    }

    /// Safe division (returns Result, never panics)
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            Err(NumberError::DivisionByZero)
        } else {
            Ok(Self {
                inner: &self.inner / &other.inner,
            })
        }
    }

    /// Absolute value
    pub fn abs(&self) -> Self {
        if self.is_negative() {
            Self {
                inner: -self.inner.clone(),
            }
        } else {
            self.clone()
        }
    }
}

// ========== Trait Implementations ==========

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner
            .partial_cmp(&other.inner)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_decimal() {
        let n = Number::from_str("3.14").unwrap();
        assert_eq!(n, Number::scaled(314, -2));
    }

    #[test]
    fn test_from_str_scientific() {
        let n = Number::from_str("1.5e2").unwrap();
        assert_eq!(n, Number::from_i64(150));
    }

    #[test]
    fn test_from_str_garbage() {
        assert!(Number::from_str("four").is_err());
    }

    #[test]
    fn test_scaled() {
        let n = Number::scaled(3048, -4);
        assert_eq!(n, Number::from_str("0.3048").unwrap());
    }

    #[test]
    fn test_arithmetic() {
        let a = Number::from_i64(6);
        let b = Number::from_i64(7);
        assert_eq!(a.mul(&b), Number::from_i64(42));
        assert_eq!(a.add(&b), Number::from_i64(13));
        assert_eq!(b.sub(&a), Number::one());
    }

    #[test]
    fn test_div_by_zero() {
        let a = Number::from_i64(42);
        assert_eq!(a.checked_div(&Number::zero()), Err(NumberError::DivisionByZero));
    }

    #[test]
    fn test_checked_div() {
        let a = Number::from_i64(84);
        let b = Number::from_i64(2);
        assert_eq!(a.checked_div(&b).unwrap(), Number::from_i64(42));
    }

    #[test]
    fn test_abs() {
        assert_eq!(Number::from_i64(-42).abs(), Number::from_i64(42));
        assert_eq!(Number::from_i64(42).abs(), Number::from_i64(42));
    }

    #[test]
    fn test_ordering() {
        assert!(Number::from_str("0.1").unwrap() < Number::from_str("0.2").unwrap());
        assert!(Number::from_i64(-1).is_negative());
    }

    #[test]
    fn test_serde_round_trip() {
        let n = Number::scaled(254, -4);
        let json = serde_json::to_string(&n).unwrap();
        let back: Number = serde_json::from_str(&json).unwrap();
        assert_eq!(n, back);
    }
}
