//! Plant records
//!
//! The canonical record shape every source variant produces. Records
//! are ephemeral: built per call, never persisted as such.

use crate::SourceError;
use herbarium_core::Lazy;
use herbarium_units::Measurement;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One characteristic value
///
/// A value that cannot be parsed to a [`Measurement`] degrades to
/// `Text` rather than failing the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trait {
    Measure(Measurement),
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

/// A plant record keyed by canonical scientific name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub scientific_name: String,
    pub common_names: BTreeSet<String>,
    pub characteristics: BTreeMap<String, Trait>,
}

impl PlantRecord {
    pub fn new(scientific_name: impl Into<String>) -> Self {
        PlantRecord {
            scientific_name: scientific_name.into(),
            common_names: BTreeSet::new(),
            characteristics: BTreeMap::new(),
        }
    }

    pub fn with_common_name(mut self, name: impl Into<String>) -> Self {
        self.common_names.insert(name.into());
        self
    }

    pub fn with_characteristic(mut self, attribute: impl Into<String>, value: Trait) -> Self {
        self.characteristics.insert(attribute.into(), value);
        self
    }
}

/// Lazy stream of records out of `Database::iterate`
pub type Records = Lazy<Result<PlantRecord, SourceError>>;
