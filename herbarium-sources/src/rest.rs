//! REST source
//!
//! Walks a cursor-paginated JSON API through the cache. Each page
//! carries its items plus an opaque cursor for the next page; a null
//! cursor ends the walk. Items are decoded one by one so a single
//! malformed item costs one record, not the page.

use crate::{Converter, Database, PlantRecord, Records, SourceError};
use herbarium_cache::{CacheRequest, HttpCache};
use herbarium_core::Lazy;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Item {
    scientific_name: String,
    #[serde(default)]
    common_names: Vec<String>,
    #[serde(default, flatten)]
    fields: serde_json::Map<String, Value>,
}

/// Database backed by a cursor-paginated JSON API
#[derive(Clone)]
pub struct RestSource {
    id: String,
    cache: Arc<HttpCache>,
    endpoint: String,
    cursor_param: String,
    converter: Converter,
}

impl RestSource {
    pub fn new(
        id: impl Into<String>,
        cache: Arc<HttpCache>,
        endpoint: impl Into<String>,
        converter: Converter,
    ) -> Self {
        RestSource {
            id: id.into(),
            cache,
            endpoint: endpoint.into(),
            cursor_param: "cursor".to_string(),
            converter,
        }
    }

    /// Override the query parameter carrying the page cursor
    pub fn with_cursor_param(mut self, param: impl Into<String>) -> Self {
        self.cursor_param = param.into();
        self
    }

    fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, SourceError> {
        let mut request = CacheRequest::get(&self.endpoint);
        if let Some(cursor) = cursor {
            request = request.with_param(&self.cursor_param, cursor);
        }
        let payload = self.cache.fetch(&request)?;
        serde_json::from_slice(&payload.payload).map_err(|err| {
            SourceError::parse(&self.id, format!("page decode: {err}"))
        })
    }

    fn parse_item(&self, raw: Value) -> Result<PlantRecord, SourceError> {
        let item: Item = serde_json::from_value(raw.clone())
            .map_err(|_| SourceError::parse(&self.id, raw.to_string()))?;
        let name = item.scientific_name.trim().to_lowercase();
        if name.is_empty() {
            return Err(SourceError::parse(&self.id, raw.to_string()));
        }

        let mut record = PlantRecord::new(name);
        for common in &item.common_names {
            let common = common.trim();
            if !common.is_empty() {
                record.common_names.insert(common.to_lowercase());
            }
        }
        record.characteristics = self.converter.convert(
            item.fields
                .iter()
                .filter_map(|(key, value)| field_text(value).map(|text| (key.as_str(), text))),
        );
        Ok(record)
    }
}

/// Scalar JSON values become field text; structured values are skipped
fn field_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

impl Database for RestSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn iterate(&self) -> Records {
        let source = self.clone();
        let mut buffer: VecDeque<Result<PlantRecord, SourceError>> = VecDeque::new();
        let mut cursor: Option<String> = None;
        let mut started = false;
        let mut done = false;

        Lazy::from_fn(move || loop {
            // Malformed items are reported and skipped; only
            // page-level failures surface as stream items.
            match buffer.pop_front() {
                Some(Ok(record)) => return Some(Ok(record)),
                Some(Err(err)) => {
                    warn!(source = %source.id, %err, "skipping malformed item");
                    continue;
                }
                None => {}
            }
            if done || (started && cursor.is_none()) {
                return None;
            }
            match source.fetch_page(cursor.as_deref()) {
                Ok(page) => {
                    started = true;
                    cursor = page.next_cursor;
                    buffer.extend(page.items.into_iter().map(|raw| source.parse_item(raw)));
                    if buffer.is_empty() && cursor.is_none() {
                        return None;
                    }
                }
                Err(err) => {
                    done = true;
                    return Some(Err(err));
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldRule;
    use herbarium_cache::testing::{ScriptedResponse, ScriptedTransport};
    use herbarium_cache::MemoryStorage;
    use herbarium_units::Unit;
    use serde_json::json;
    use std::time::Duration;

    fn source(transport: Arc<ScriptedTransport>) -> RestSource {
        let cache = Arc::new(HttpCache::new(
            transport,
            Box::new(MemoryStorage::new()),
            Duration::from_secs(5),
        ));
        let converter = Converter::new(
            "rest",
            [("height", "height", FieldRule::Measure(Unit::Centimeters))],
        );
        RestSource::new("rest", cache, "http://api.example/plants", converter)
    }

    fn script_page(transport: &ScriptedTransport, cursor: Option<&str>, body: Value) {
        let mut request = CacheRequest::get("http://api.example/plants");
        if let Some(cursor) = cursor {
            request = request.with_param("cursor", cursor);
        }
        transport.respond(
            &request,
            ScriptedResponse::ok(body.to_string().as_bytes())
                .with_content_type("application/json"),
        );
    }

    #[test]
    fn test_iterate_follows_cursors() {
        let transport = Arc::new(ScriptedTransport::new());
        script_page(
            &transport,
            None,
            json!({
                "items": [{"scientific_name": "Malus domestica", "common_names": ["Apple"]}],
                "next_cursor": "p2"
            }),
        );
        script_page(
            &transport,
            Some("p2"),
            json!({
                "items": [{"scientific_name": "Salix alba", "common_names": ["Willow"]}],
                "next_cursor": null
            }),
        );

        let names: Vec<String> = source(Arc::clone(&transport))
            .iterate()
            .filter_map(|r| r.ok())
            .map(|r| r.scientific_name)
            .collect();
        assert_eq!(names, vec!["malus domestica", "salix alba"]);
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn test_second_page_waits_for_demand() {
        let transport = Arc::new(ScriptedTransport::new());
        script_page(
            &transport,
            None,
            json!({
                "items": [{"scientific_name": "Malus domestica"}],
                "next_cursor": "p2"
            }),
        );

        let mut records = source(Arc::clone(&transport)).iterate();
        assert!(records.pull().is_some());
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_fields_are_converted() {
        let transport = Arc::new(ScriptedTransport::new());
        script_page(
            &transport,
            None,
            json!({
                "items": [{"scientific_name": "Salix alba", "height": "30"}],
                "next_cursor": null
            }),
        );

        let record = source(Arc::clone(&transport))
            .iterate()
            .next()
            .and_then(|r| r.ok())
            .expect("one record");
        assert!(record.characteristics.contains_key("height"));
    }

    #[test]
    fn test_malformed_item_is_skipped() {
        let transport = Arc::new(ScriptedTransport::new());
        script_page(
            &transport,
            None,
            json!({
                "items": [
                    {"common_names": ["Mystery"]},
                    {"scientific_name": "Salix alba"}
                ],
                "next_cursor": null
            }),
        );

        let names: Vec<String> = source(Arc::clone(&transport))
            .iterate()
            .map(|r| r.expect("only well-formed items surface"))
            .map(|r| r.scientific_name)
            .collect();
        assert_eq!(names, vec!["salix alba"]);
    }

    #[test]
    fn test_lookup_survives_malformed_item() {
        let transport = Arc::new(ScriptedTransport::new());
        script_page(
            &transport,
            None,
            json!({
                "items": [
                    {"common_names": ["Mystery"]},
                    {"scientific_name": "Salix alba"}
                ],
                "next_cursor": null
            }),
        );

        let record = source(Arc::clone(&transport))
            .lookup("salix alba")
            .expect("record past bad item");
        assert_eq!(record.scientific_name, "salix alba");
    }

    #[test]
    fn test_page_decode_failure_ends_iteration() {
        let transport = Arc::new(ScriptedTransport::new());
        let request = CacheRequest::get("http://api.example/plants");
        transport.respond(&request, ScriptedResponse::ok(b"not json"));

        let mut records = source(Arc::clone(&transport)).iterate();
        assert!(matches!(records.pull(), Some(Err(SourceError::Parse { .. }))));
        assert!(records.pull().is_none());
    }
}
