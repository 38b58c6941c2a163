//! Unit enumeration with conversion factors
//!
//! A fixed set of units, each tied to one quantity kind. Factors map a
//! unit to its kind's base unit: `base = value * factor + offset`. The
//! offset is only non-zero for temperature scales.

use crate::QuantityKind;
use herbarium_core::Number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A member of the fixed unit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    // Length (base: meters)
    Millimeters,
    Centimeters,
    Meters,
    Inches,
    Feet,
    // Mass (base: kilograms)
    Grams,
    Kilograms,
    Ounces,
    Pounds,
    // Temperature (base: kelvin)
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl Unit {
    /// The quantity kind this unit belongs to
    pub fn kind(&self) -> QuantityKind {
        match self {
            Unit::Millimeters | Unit::Centimeters | Unit::Meters | Unit::Inches | Unit::Feet => {
                QuantityKind::Length
            }
            Unit::Grams | Unit::Kilograms | Unit::Ounces | Unit::Pounds => QuantityKind::Mass,
            Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin => QuantityKind::Temperature,
        }
    }

    /// The base unit of this unit's kind
    pub fn base(&self) -> Unit {
        match self.kind() {
            QuantityKind::Length => Unit::Meters,
            QuantityKind::Mass => Unit::Kilograms,
            QuantityKind::Temperature => Unit::Kelvin,
        }
    }

    /// Unit symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Millimeters => "mm",
            Unit::Centimeters => "cm",
            Unit::Meters => "m",
            Unit::Inches => "in",
            Unit::Feet => "ft",
            Unit::Grams => "g",
            Unit::Kilograms => "kg",
            Unit::Ounces => "oz",
            Unit::Pounds => "lb",
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Kelvin => "K",
        }
    }

    /// Factor to the kind's base unit
    ///
    /// Factors are exact where the definition is exact (international
    /// yard and pound); the Fahrenheit factor 5/9 is rounded at working
    /// precision.
    pub fn factor(&self) -> Number {
        match self {
            Unit::Millimeters => Number::scaled(1, -3),
            Unit::Centimeters => Number::scaled(1, -2),
            Unit::Meters => Number::one(),
            Unit::Inches => Number::scaled(254, -4),
            Unit::Feet => Number::scaled(3048, -4),
            Unit::Grams => Number::scaled(1, -3),
            Unit::Kilograms => Number::one(),
            Unit::Ounces => Number::scaled(28_349_523_125, -12),
            Unit::Pounds => Number::scaled(45_359_237, -8),
            Unit::Celsius | Unit::Kelvin => Number::one(),
            Unit::Fahrenheit => five_ninths(),
        }
    }

    /// Offset to the kind's base unit
    pub fn offset(&self) -> Number {
        match self {
            Unit::Celsius => Number::scaled(27_315, -2),
            // 273.15 - 32 * 5/9
            Unit::Fahrenheit => {
                Number::scaled(27_315, -2).sub(&Number::from_i64(32).mul(&five_ninths()))
            }
            _ => Number::zero(),
        }
    }

    /// Convert a magnitude from this unit to the kind's base unit
    pub fn to_base(&self, value: &Number) -> Number {
        value.mul(&self.factor()).add(&self.offset())
    }

    /// Look up a unit by the symbols and aliases used in source field
    /// tables
    pub fn parse(symbol: &str) -> Option<Unit> {
        let unit = match symbol.trim() {
            "mm" | "millimeter" | "millimeters" => Unit::Millimeters,
            "cm" | "centimeter" | "centimeters" => Unit::Centimeters,
            "m" | "meter" | "meters" => Unit::Meters,
            "in" | "inch" | "inches" => Unit::Inches,
            "ft" | "foot" | "feet" => Unit::Feet,
            "g" | "gram" | "grams" => Unit::Grams,
            "kg" | "kilogram" | "kilograms" => Unit::Kilograms,
            "oz" | "ounce" | "ounces" => Unit::Ounces,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pounds,
            "°C" | "C" | "celsius" => Unit::Celsius,
            "°F" | "F" | "fahrenheit" => Unit::Fahrenheit,
            "K" | "kelvin" => Unit::Kelvin,
            _ => return None,
        };
        Some(unit)
    }

    /// All defined units, in declaration order
    pub fn all() -> &'static [Unit] {
        &[
            Unit::Millimeters,
            Unit::Centimeters,
            Unit::Meters,
            Unit::Inches,
            Unit::Feet,
            Unit::Grams,
            Unit::Kilograms,
            Unit::Ounces,
            Unit::Pounds,
            Unit::Celsius,
            Unit::Fahrenheit,
            Unit::Kelvin,
        ]
    }
}

// 5/9 is non-terminating; rounded once at working precision. The
// divisor is a non-zero constant, so the division cannot fail.
fn five_ninths() -> Number {
    Number::from_ratio(5, 9).unwrap_or_else(|_| Number::one())
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_unit_has_one_kind() {
        for unit in Unit::all() {
            assert_eq!(unit.base().kind(), unit.kind());
        }
    }

    #[test]
    fn test_base_units_are_identity() {
        for unit in [Unit::Meters, Unit::Kilograms, Unit::Kelvin] {
            assert_eq!(unit.factor(), Number::one());
            assert_eq!(unit.offset(), Number::zero());
        }
    }

    #[test]
    fn test_to_base_length() {
        let one_foot = Unit::Feet.to_base(&Number::one());
        assert_eq!(one_foot, Number::scaled(3048, -4));
    }

    #[test]
    fn test_to_base_celsius() {
        let freezing = Unit::Celsius.to_base(&Number::zero());
        assert_eq!(freezing, Number::scaled(27_315, -2));
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(Unit::parse("ft"), Some(Unit::Feet));
        assert_eq!(Unit::parse("°C"), Some(Unit::Celsius));
        assert_eq!(Unit::parse(" kg "), Some(Unit::Kilograms));
        assert_eq!(Unit::parse("furlong"), None);
    }
}
