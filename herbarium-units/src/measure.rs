//! Measurement - a magnitude with an associated unit

use crate::{convert, ConversionError, QuantityKind, Unit};
use herbarium_core::Number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A magnitude paired with a member of the fixed unit set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Number,
    pub unit: Unit,
}

impl Measurement {
    pub fn new(value: Number, unit: Unit) -> Self {
        Measurement { value, unit }
    }

    /// The quantity kind of this measurement
    pub fn kind(&self) -> QuantityKind {
        self.unit.kind()
    }

    /// Express this measurement in another unit of the same kind
    pub fn convert_to(&self, unit: Unit) -> Result<Measurement, ConversionError> {
        let value = convert(&self.value, self.unit, unit)?;
        Ok(Measurement { value, unit })
    }

    /// Express this measurement in its kind's base unit
    pub fn to_base(&self) -> Result<Measurement, ConversionError> {
        self.convert_to(self.unit.base())
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
