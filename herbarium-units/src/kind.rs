//! Quantity kinds - the physical dimension of a measurement

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical dimension of a measurement
///
/// Every unit belongs to exactly one kind; conversions across kinds
/// are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityKind {
    Length,
    Mass,
    Temperature,
}

impl fmt::Display for QuantityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuantityKind::Length => "length",
            QuantityKind::Mass => "mass",
            QuantityKind::Temperature => "temperature",
        };
        write!(f, "{name}")
    }
}
