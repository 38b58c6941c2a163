//! Bulk source
//!
//! Wraps one pre-fetched CSV file. Construction only checks the file
//! exists; the file is read and indexed on first use, then both
//! `iterate` and `lookup` run against the in-memory index.

use crate::{Converter, Database, PlantRecord, Records, SourceError};
use herbarium_core::Lazy;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const NAME_COLUMN: &str = "scientific name";
const COMMON_NAMES_COLUMN: &str = "common names";

/// Records in file order plus an exact-name probe
struct BulkIndex {
    records: Vec<PlantRecord>,
    by_name: HashMap<String, usize>,
}

/// Database backed by one local structured file
pub struct BulkSource {
    id: String,
    path: PathBuf,
    converter: Converter,
    index: OnceCell<Arc<BulkIndex>>,
}

impl BulkSource {
    /// Wrap the file at `path`; fails if it does not exist
    pub fn new(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        converter: Converter,
    ) -> Result<Self, SourceError> {
        let path = path.into();
        if !path.is_file() {
            return Err(SourceError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                path,
            });
        }
        Ok(BulkSource {
            id: id.into(),
            path,
            converter,
            index: OnceCell::new(),
        })
    }

    fn index(&self) -> Result<&Arc<BulkIndex>, SourceError> {
        self.index.get_or_try_init(|| {
            debug!(source = %self.id, path = %self.path.display(), "loading bulk file");
            self.load().map(Arc::new)
        })
    }

    /// Read and index the whole file, skipping malformed rows
    fn load(&self) -> Result<BulkIndex, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|err| self.io_err(err))?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| self.io_err(err))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        let mut by_name = HashMap::new();
        for row in reader.records() {
            let row = row.map_err(|err| self.io_err(err))?;
            match self.parse_row(&headers, &row) {
                Ok(record) => {
                    if by_name.contains_key(&record.scientific_name) {
                        warn!(source = %self.id, name = %record.scientific_name, "duplicate row dropped");
                        continue;
                    }
                    by_name.insert(record.scientific_name.clone(), records.len());
                    records.push(record);
                }
                Err(err) => warn!(source = %self.id, %err, "skipping malformed row"),
            }
        }
        Ok(BulkIndex { records, by_name })
    }

    fn parse_row(
        &self,
        headers: &[String],
        row: &csv::StringRecord,
    ) -> Result<PlantRecord, SourceError> {
        if row.len() != headers.len() {
            return Err(SourceError::parse(
                &self.id,
                format!("row with {} cells, expected {}", row.len(), headers.len()),
            ));
        }
        let fields: Vec<(&str, &str)> = headers
            .iter()
            .map(String::as_str)
            .zip(row.iter())
            .collect();

        let scientific_name = fields
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(NAME_COLUMN))
            .map(|(_, v)| v.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                SourceError::parse(&self.id, format!("row without {NAME_COLUMN:?}"))
            })?;

        let mut record = PlantRecord::new(scientific_name);
        if let Some((_, names)) = fields
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(COMMON_NAMES_COLUMN))
        {
            for name in names.split(';').map(str::trim).filter(|n| !n.is_empty()) {
                record.common_names.insert(name.to_lowercase());
            }
        }
        record.characteristics = self.converter.convert(fields.iter().filter(|(h, _)| {
            !h.eq_ignore_ascii_case(NAME_COLUMN) && !h.eq_ignore_ascii_case(COMMON_NAMES_COLUMN)
        }).copied());
        Ok(record)
    }

    fn io_err(&self, err: csv::Error) -> SourceError {
        SourceError::Io {
            path: self.path.clone(),
            source: std::io::Error::other(err),
        }
    }
}

impl Database for BulkSource {
    fn id(&self) -> &str {
        &self.id
    }

    /// Replays the index in file order
    fn iterate(&self) -> Records {
        let index = match self.index() {
            Ok(index) => Arc::clone(index),
            Err(err) => return Lazy::once(Err(err)),
        };
        let mut position = 0usize;
        Lazy::from_fn(move || {
            let record = index.records.get(position)?;
            position += 1;
            Some(Ok(record.clone()))
        })
    }

    /// Exact-match probe against the index
    fn lookup(&self, scientific_name: &str) -> Result<PlantRecord, SourceError> {
        let index = self.index()?;
        let key = scientific_name.trim().to_lowercase();
        index
            .by_name
            .get(&key)
            .map(|&at| index.records[at].clone())
            .ok_or(SourceError::NotFound(key))
    }
}
