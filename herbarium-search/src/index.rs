//! Common-name search index
//!
//! Maps normalized common-name tokens to scientific names. A query
//! matches a common name whose token set covers every query token;
//! a common name equal to the whole normalized query wins outright.

use crate::tokenizer::{normalize, tokenize};
use herbarium_sources::{Database, SourceError};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

struct IndexedName {
    scientific_name: String,
    normalized: String,
    tokens: BTreeSet<String>,
}

/// Token index over the common names of one or more databases
#[derive(Default)]
pub struct SearchIndex {
    names: Vec<IndexedName>,
    postings: HashMap<String, BTreeSet<usize>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        SearchIndex::default()
    }

    /// Index one common name under a scientific name
    pub fn insert(&mut self, scientific_name: &str, common_name: &str) {
        let normalized = normalize(common_name);
        let tokens: BTreeSet<String> = tokenize(common_name).into_iter().collect();
        if tokens.is_empty() {
            return;
        }
        let at = self.names.len();
        for token in &tokens {
            self.postings.entry(token.clone()).or_default().insert(at);
        }
        self.names.push(IndexedName {
            scientific_name: scientific_name.trim().to_lowercase(),
            normalized,
            tokens,
        });
    }

    /// Index every common name of every record in `database`
    ///
    /// Sources skip malformed records themselves, so a stream error
    /// here is a failed fetch and aborts indexing with its error.
    pub fn index_database(&mut self, database: &dyn Database) -> Result<(), SourceError> {
        let mut indexed = 0usize;
        for record in database.iterate() {
            let record = record?;
            for common_name in &record.common_names {
                self.insert(&record.scientific_name, common_name);
            }
            indexed += 1;
        }
        debug!(source = database.id(), records = indexed, "indexed");
        Ok(())
    }

    /// Scientific names whose common names match every query token
    ///
    /// A common name equal to the full normalized query short-circuits
    /// the token match and returns only such names. Otherwise matches
    /// are ordered by the matched name's token count, then by
    /// scientific name.
    pub fn search(&self, query: &str) -> Vec<String> {
        let query_tokens: BTreeSet<String> = tokenize(query).into_iter().collect();
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let normalized_query = normalize(query);

        let candidates = match self.candidates(&query_tokens) {
            Some(candidates) => candidates,
            None => return Vec::new(),
        };

        let exact: BTreeSet<&str> = candidates
            .iter()
            .map(|&at| &self.names[at])
            .filter(|name| name.normalized == normalized_query)
            .map(|name| name.scientific_name.as_str())
            .collect();
        if !exact.is_empty() {
            return exact.into_iter().map(str::to_string).collect();
        }

        // Per scientific name, the smallest covering common name.
        let mut best: HashMap<&str, usize> = HashMap::new();
        for &at in &candidates {
            let name = &self.names[at];
            if !name.tokens.is_superset(&query_tokens) {
                continue;
            }
            best.entry(name.scientific_name.as_str())
                .and_modify(|count| *count = (*count).min(name.tokens.len()))
                .or_insert(name.tokens.len());
        }

        let mut matches: Vec<(&str, usize)> = best.into_iter().collect();
        matches.sort_by(|(a_name, a_count), (b_name, b_count)| {
            a_count.cmp(b_count).then_with(|| a_name.cmp(b_name))
        });
        matches.into_iter().map(|(name, _)| name.to_string()).collect()
    }

    /// Names holding every query token, by postings intersection
    fn candidates(&self, query_tokens: &BTreeSet<String>) -> Option<Vec<usize>> {
        let mut sets = query_tokens
            .iter()
            .map(|token| self.postings.get(token))
            .collect::<Option<Vec<_>>>()?;
        sets.sort_by_key(|set| set.len());
        let (first, rest) = sets.split_first()?;
        Some(
            first
                .iter()
                .copied()
                .filter(|at| rest.iter().all(|set| set.contains(at)))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herbarium_core::Lazy;
    use herbarium_sources::{PlantRecord, Records};

    fn comfrey_index() -> SearchIndex {
        let mut index = SearchIndex::new();
        index.insert("symphytum officinale", "comfrey");
        index.insert("symphytum officinale", "consoude");
        index.insert("symphytum x uplandicum", "consoude russe");
        index.insert("symphytum x uplandicum", "rusian comfrey");
        index
    }

    #[test]
    fn test_exact_name_wins_over_broader_matches() {
        assert_eq!(
            comfrey_index().search("Consoude"),
            vec!["symphytum officinale"]
        );
    }

    #[test]
    fn test_multi_token_and_match() {
        assert_eq!(
            comfrey_index().search("consoude russe"),
            vec!["symphytum x uplandicum"]
        );
    }

    #[test]
    fn test_accent_folding() {
        let mut index = SearchIndex::new();
        index.insert("acer saccharum", "érable à sucre");
        assert_eq!(index.search("Erable a sucre"), vec!["acer saccharum"]);
    }

    #[test]
    fn test_token_order_does_not_matter() {
        assert_eq!(
            comfrey_index().search("russe consoude"),
            vec!["symphytum x uplandicum"]
        );
    }

    #[test]
    fn test_partial_token_match_orders_by_name_size() {
        let mut index = SearchIndex::new();
        index.insert("salix alba", "white willow tree");
        index.insert("salix babylonica", "weeping willow");
        assert_eq!(
            index.search("willow"),
            vec!["salix babylonica", "salix alba"]
        );
    }

    #[test]
    fn test_lexical_tie_break() {
        let mut index = SearchIndex::new();
        index.insert("salix fragilis", "crack willow");
        index.insert("salix alba", "white willow");
        assert_eq!(index.search("willow"), vec!["salix alba", "salix fragilis"]);
    }

    #[test]
    fn test_unmatched_and_empty_queries() {
        assert!(comfrey_index().search("oak").is_empty());
        assert!(comfrey_index().search("").is_empty());
        assert!(comfrey_index().search("consoude oak").is_empty());
    }

    #[test]
    fn test_index_database_propagates_failure() {
        struct Failing;
        impl Database for Failing {
            fn id(&self) -> &str {
                "failing"
            }
            fn iterate(&self) -> Records {
                Lazy::from_vec(vec![
                    Ok(PlantRecord::new("salix alba").with_common_name("willow")),
                    Err(SourceError::NotFound("page".to_string())),
                ])
            }
        }
        let mut index = SearchIndex::new();
        assert!(index.index_database(&Failing).is_err());
    }

    #[test]
    fn test_index_database_collects_common_names() {
        struct One;
        impl Database for One {
            fn id(&self) -> &str {
                "one"
            }
            fn iterate(&self) -> Records {
                Lazy::once(Ok(PlantRecord::new("symphytum officinale")
                    .with_common_name("Comfrey")
                    .with_common_name("Consoude")))
            }
        }
        let mut index = SearchIndex::new();
        index.index_database(&One).unwrap();
        assert_eq!(index.search("comfrey"), vec!["symphytum officinale"]);
    }
}
