//! Error taxonomy for sources and the registry

use herbarium_cache::FetchError;
use herbarium_units::ConversionError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by sources, the registry and the run context
#[derive(Debug, Error)]
pub enum SourceError {
    /// Missing registry id or plant record
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate registration
    #[error("already registered: {0}")]
    Conflict(String),

    /// Cache or transport failure, propagated unchanged
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Malformed source payload
    #[error("malformed payload from {source_id}: {fragment}")]
    Parse { source_id: String, fragment: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn parse(source_id: impl Into<String>, fragment: impl Into<String>) -> Self {
        SourceError::Parse {
            source_id: source_id.into(),
            fragment: fragment.into(),
        }
    }
}
