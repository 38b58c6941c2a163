//! Scraped source
//!
//! Walks a paginated HTML listing through the cache. Pages are
//! fetched one at a time, each only once the previous page's rows
//! have been consumed, so an early-terminating consumer never costs
//! a fetch it did not ask for.

use crate::{Converter, Database, PlantRecord, Records, SourceError};
use herbarium_cache::{CacheRequest, HttpCache};
use herbarium_core::Lazy;
use once_cell::sync::Lazy as StaticLazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

static ROW: StaticLazy<Selector> = StaticLazy::new(|| Selector::parse("tr").expect("row selector"));
static HEADER: StaticLazy<Selector> =
    StaticLazy::new(|| Selector::parse("th").expect("header selector"));
static CELL: StaticLazy<Selector> =
    StaticLazy::new(|| Selector::parse("td").expect("cell selector"));

/// Database backed by a paginated HTML table listing
#[derive(Clone)]
pub struct ScrapedSource {
    id: String,
    cache: Arc<HttpCache>,
    list_url: String,
    offset_param: String,
    name_field: String,
    common_name_field: String,
    converter: Converter,
}

impl ScrapedSource {
    pub fn new(
        id: impl Into<String>,
        cache: Arc<HttpCache>,
        list_url: impl Into<String>,
        converter: Converter,
    ) -> Self {
        ScrapedSource {
            id: id.into(),
            cache,
            list_url: list_url.into(),
            offset_param: "start".to_string(),
            name_field: "Latin name".to_string(),
            common_name_field: "Common name".to_string(),
            converter,
        }
    }

    /// Override the query parameter carrying the page offset
    pub fn with_offset_param(mut self, param: impl Into<String>) -> Self {
        self.offset_param = param.into();
        self
    }

    /// Override the raw fields naming the plant
    pub fn with_name_fields(
        mut self,
        name_field: impl Into<String>,
        common_name_field: impl Into<String>,
    ) -> Self {
        self.name_field = name_field.into();
        self.common_name_field = common_name_field.into();
        self
    }

    /// Fetch and parse the listing page at the given row offset
    fn fetch_page(&self, offset: usize) -> Result<Vec<Result<PlantRecord, SourceError>>, SourceError> {
        let request = CacheRequest::get(&self.list_url)
            .with_param(&self.offset_param, offset.to_string());
        let payload = self.cache.fetch(&request)?;
        let html = String::from_utf8_lossy(&payload.payload);
        Ok(self.parse_listing(&html))
    }

    /// Extract one record per data row of the first table
    fn parse_listing(&self, html: &str) -> Vec<Result<PlantRecord, SourceError>> {
        let document = Html::parse_document(html);
        let mut rows = document.select(&ROW);

        let headers: Vec<String> = match rows.next() {
            Some(first) => first
                .select(&HEADER)
                .map(|th| cell_text(&th))
                .collect(),
            None => return Vec::new(),
        };
        if headers.is_empty() {
            return Vec::new();
        }

        rows.map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(|td| cell_text(&td)).collect();
            self.parse_row(&headers, &cells)
        })
        .collect()
    }

    fn parse_row(&self, headers: &[String], cells: &[String]) -> Result<PlantRecord, SourceError> {
        if cells.len() != headers.len() {
            return Err(SourceError::parse(
                &self.id,
                format!("row with {} cells, expected {}", cells.len(), headers.len()),
            ));
        }
        let fields: Vec<(&str, &str)> = headers
            .iter()
            .zip(cells)
            .map(|(h, c)| (h.as_str(), c.as_str()))
            .collect();

        let scientific_name = fields
            .iter()
            .find(|(h, _)| *h == self.name_field)
            .map(|(_, v)| v.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                SourceError::parse(&self.id, format!("row without {:?}", self.name_field))
            })?;

        let mut record = PlantRecord::new(scientific_name);
        if let Some((_, names)) = fields.iter().find(|(h, _)| *h == self.common_name_field) {
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                record.common_names.insert(name.to_lowercase());
            }
        }
        record.characteristics = self.converter.convert(
            fields
                .iter()
                .filter(|(h, _)| *h != self.name_field && *h != self.common_name_field)
                .copied(),
        );
        Ok(record)
    }
}

impl Database for ScrapedSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn iterate(&self) -> Records {
        let source = self.clone();
        let mut buffer: VecDeque<Result<PlantRecord, SourceError>> = VecDeque::new();
        let mut offset = 0usize;
        let mut done = false;

        Lazy::from_fn(move || loop {
            // Malformed rows are reported and skipped; only fetch
            // failures surface as stream items.
            match buffer.pop_front() {
                Some(Ok(record)) => return Some(Ok(record)),
                Some(Err(err)) => {
                    warn!(source = %source.id, %err, "skipping malformed row");
                    continue;
                }
                None => {}
            }
            if done {
                return None;
            }
            match source.fetch_page(offset) {
                Ok(rows) if rows.is_empty() => {
                    debug!(source = %source.id, offset, "listing exhausted");
                    done = true;
                    return None;
                }
                Ok(rows) => {
                    offset += rows.len();
                    buffer.extend(rows);
                }
                Err(err) => {
                    done = true;
                    return Some(Err(err));
                }
            }
        })
    }
}

fn cell_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
