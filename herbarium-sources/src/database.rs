//! Database abstraction
//!
//! Every source variant exposes exactly two capabilities: a lazy,
//! restartable pass over the full catalog, and an exact-match lookup
//! by scientific name.

use crate::{PlantRecord, Records, SourceError};

/// A plant data source
pub trait Database: Send + Sync {
    /// Stable identifier of this source
    fn id(&self) -> &str;

    /// Lazy pass over the whole catalog
    ///
    /// A fresh call always restarts from the beginning. Dropping the
    /// sequence early must not fetch remaining pages. Malformed
    /// single records are reported and skipped inside the variant;
    /// an `Err` item means a page fetch failed and ends the
    /// sequence, so a failure on the very first page aborts the
    /// whole pass.
    fn iterate(&self) -> Records;

    /// Exact-match lookup by scientific name (case-insensitive)
    ///
    /// The default implementation scans `iterate()`; variants with an
    /// index override it.
    fn lookup(&self, scientific_name: &str) -> Result<PlantRecord, SourceError> {
        let wanted = scientific_name.trim().to_lowercase();
        for record in self.iterate() {
            let record = record?;
            if record.scientific_name.to_lowercase() == wanted {
                return Ok(record);
            }
        }
        Err(SourceError::NotFound(scientific_name.to_string()))
    }
}
