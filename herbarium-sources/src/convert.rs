//! Field conversion
//!
//! Translates raw per-source field/value pairs into canonical
//! attributes. Each source variant carries a field table naming the
//! canonical attribute and parse rule for every raw field it knows;
//! values that fail their rule degrade to raw text instead of sinking
//! the record, and the event is reported.

use crate::{SourceError, Trait};
use herbarium_core::Number;
use herbarium_units::{Measurement, Unit};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::collections::HashMap;
use tracing::{debug, warn};

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([+-]?\d+(?:\.\d*)?)").expect("float regex")
});

/// Parse rule for one raw field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Single magnitude in the given source unit, normalized to the
    /// kind's base unit
    Measure(Unit),
    /// One or two magnitudes, exposed as `<attribute>/min` and
    /// `<attribute>/max`
    Range(Unit),
    Flag,
    List,
    Text,
    Ignore,
}

/// Field table of one source
#[derive(Clone)]
pub struct Converter {
    source_id: String,
    fields: HashMap<String, (String, FieldRule)>,
}

impl Converter {
    pub fn new<'a>(
        source_id: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, &'a str, FieldRule)>,
    ) -> Self {
        Converter {
            source_id: source_id.into(),
            fields: fields
                .into_iter()
                .map(|(raw, canonical, rule)| {
                    (raw.to_string(), (canonical.to_string(), rule))
                })
                .collect(),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Convert raw field/value pairs into canonical characteristics
    pub fn convert<'a>(
        &self,
        raw: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> BTreeMap<String, Trait> {
        let mut characteristics = BTreeMap::new();
        for (key, value) in raw {
            let Some((canonical, rule)) = self.fields.get(key.trim()) else {
                debug!(source = %self.source_id, field = key, "unmapped field");
                continue;
            };
            for (attribute, converted) in self.convert_field(canonical, *rule, value) {
                characteristics.insert(attribute, converted);
            }
        }
        characteristics
    }

    fn convert_field(&self, canonical: &str, rule: FieldRule, value: &str) -> Vec<(String, Trait)> {
        let trimmed = value.trim();
        match rule {
            FieldRule::Ignore => Vec::new(),
            FieldRule::Text => {
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![(canonical.to_string(), Trait::Text(trimmed.to_lowercase()))]
                }
            }
            FieldRule::Flag => match trimmed.to_lowercase().as_str() {
                "y" | "yes" | "true" | "1" => {
                    vec![(canonical.to_string(), Trait::Flag(true))]
                }
                "n" | "no" | "false" | "0" => {
                    vec![(canonical.to_string(), Trait::Flag(false))]
                }
                "" => Vec::new(),
                _ => self.degrade(canonical, trimmed),
            },
            FieldRule::List => {
                if trimmed.is_empty() {
                    return Vec::new();
                }
                let items = trimmed
                    .split(',')
                    .map(|item| item.trim().to_lowercase())
                    .filter(|item| !item.is_empty())
                    .collect();
                vec![(canonical.to_string(), Trait::List(items))]
            }
            FieldRule::Measure(unit) => {
                if trimmed.is_empty() {
                    return Vec::new();
                }
                match self.parse_measurement(trimmed, unit) {
                    Some(measurement) => {
                        vec![(canonical.to_string(), Trait::Measure(measurement))]
                    }
                    None => self.degrade(canonical, trimmed),
                }
            }
            FieldRule::Range(unit) => {
                let normalized = trimmed.replace(',', ".");
                let magnitudes: Vec<Measurement> = FLOAT_RE
                    .find_iter(&normalized)
                    .take(2)
                    .filter_map(|m| self.parse_measurement(m.as_str(), unit))
                    .collect();
                match magnitudes.as_slice() {
                    [] if trimmed.is_empty() => Vec::new(),
                    [] => self.degrade(canonical, trimmed),
                    [single] => vec![
                        (format!("{canonical}/min"), Trait::Measure(single.clone())),
                        (format!("{canonical}/max"), Trait::Measure(single.clone())),
                    ],
                    [min, max, ..] => vec![
                        (format!("{canonical}/min"), Trait::Measure(min.clone())),
                        (format!("{canonical}/max"), Trait::Measure(max.clone())),
                    ],
                }
            }
        }
    }

    /// Extract the leading magnitude and normalize it to the kind's
    /// base unit
    fn parse_measurement(&self, value: &str, unit: Unit) -> Option<Measurement> {
        let magnitude = FLOAT_RE.find(value)?;
        let number = Number::from_str(magnitude.as_str()).ok()?;
        Measurement::new(number, unit).to_base().ok()
    }

    /// Report the malformed field and keep the raw text
    fn degrade(&self, canonical: &str, value: &str) -> Vec<(String, Trait)> {
        let err = SourceError::parse(&self.source_id, format!("{canonical}: {value:?}"));
        warn!(%err, "field degraded to raw text");
        vec![(canonical.to_string(), Trait::Text(value.to_string()))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herbarium_units::Unit;

    fn converter() -> Converter {
        Converter::new(
            "test",
            [
                ("Height", "height", FieldRule::Measure(Unit::Feet)),
                ("Spread", "spread", FieldRule::Range(Unit::Inches)),
                ("Evergreen", "evergreen", FieldRule::Flag),
                ("Uses", "uses", FieldRule::List),
                ("Notes", "notes", FieldRule::Text),
                ("Internal", "internal", FieldRule::Ignore),
            ],
        )
    }

    #[test]
    fn test_measure_is_normalized_to_base_unit() {
        let converted = converter().convert([("Height", "10 ft")]);
        let Trait::Measure(m) = &converted["height"] else {
            panic!("expected a measurement");
        };
        assert_eq!(m.unit, Unit::Meters);
        assert_eq!(m.value, Number::scaled(3048, -3));
    }

    #[test]
    fn test_range_yields_min_and_max() {
        let converted = converter().convert([("Spread", "12-24")]);
        assert!(matches!(converted["spread/min"], Trait::Measure(_)));
        assert!(matches!(converted["spread/max"], Trait::Measure(_)));
    }

    #[test]
    fn test_single_value_range_collapses() {
        let converted = converter().convert([("Spread", "18")]);
        assert_eq!(converted["spread/min"], converted["spread/max"]);
    }

    #[test]
    fn test_flag_parsing() {
        let converted = converter().convert([("Evergreen", "Yes")]);
        assert_eq!(converted["evergreen"], Trait::Flag(true));
    }

    #[test]
    fn test_list_parsing() {
        let converted = converter().convert([("Uses", "Hedge, Mulch")]);
        assert_eq!(
            converted["uses"],
            Trait::List(vec!["hedge".to_string(), "mulch".to_string()])
        );
    }

    #[test]
    fn test_malformed_measure_degrades_to_text() {
        let converted = converter().convert([("Height", "tall-ish")]);
        assert_eq!(converted["height"], Trait::Text("tall-ish".to_string()));
    }

    #[test]
    fn test_unmapped_and_ignored_fields_are_dropped() {
        let converted = converter().convert([("Internal", "x"), ("Mystery", "y")]);
        assert!(converted.is_empty());
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let converted = converter().convert([("Height", ""), ("Evergreen", "")]);
        assert!(converted.is_empty());
    }
}
