//! Herbarium Units - Measurement model and unit conversion
//!
//! A fixed set of units scoped to quantity kinds (length, mass,
//! temperature), with conversions carried through arbitrary precision
//! decimals. Cross-kind conversions are rejected, identity conversions
//! are exact.

mod convert;
mod kind;
mod measure;
mod unit;

pub use convert::{convert, ConversionError};
pub use kind::QuantityKind;
pub use measure::Measurement;
pub use unit::Unit;
