//! Unit conversion
//!
//! Conversions go through the kind's base unit: to-base with the source
//! factor/offset, then from-base with the target's. Magnitudes stay
//! arbitrary precision through the whole chain.

use crate::{QuantityKind, Unit};
use herbarium_core::{Number, NumberError};
use thiserror::Error;

/// Errors that can occur during unit conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {from} ({from_kind}) to {to} ({to_kind}): incompatible kinds")]
    IncompatibleUnits {
        from: Unit,
        to: Unit,
        from_kind: QuantityKind,
        to_kind: QuantityKind,
    },

    #[error("unknown unit symbol: {0}")]
    UnknownUnit(String),

    #[error(transparent)]
    Number(#[from] NumberError),
}

/// Convert a magnitude between two units of the same quantity kind
///
/// Identity conversions return the input magnitude unchanged.
pub fn convert(value: &Number, from: Unit, to: Unit) -> Result<Number, ConversionError> {
    if from == to {
        return Ok(value.clone());
    }
    if from.kind() != to.kind() {
        return Err(ConversionError::IncompatibleUnits {
            from,
            to,
            from_kind: from.kind(),
            to_kind: to.kind(),
        });
    }

    let base = from.to_base(value);
    let shifted = base.sub(&to.offset());
    Ok(shifted.checked_div(&to.factor())?)
}
