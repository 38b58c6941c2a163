//! Herbarium - plant characteristics from heterogeneous sources
//!
//! One [`Herbarium`] per run: register sources against its context,
//! then look plants up by scientific name or search them by common
//! name. All network traffic goes through a shared revalidating
//! cache.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

pub use herbarium_cache::{
    CacheRequest, CachedPayload, FetchError, HttpCache, Method, Storage, Transport,
};
pub use herbarium_core::{Lazy, LazyState, Number, NumberError};
pub use herbarium_search::{normalize, tokenize, SearchIndex};
pub use herbarium_sources::{
    BulkSource, Config, Context, Converter, Database, FieldRule, PlantRecord, Records, Registry,
    RestSource, ScrapedSource, SourceConfig, SourceError, Trait,
};
pub use herbarium_units::{convert, ConversionError, Measurement, QuantityKind, Unit};

/// Aggregation engine over every registered source
pub struct Herbarium {
    context: Context,
    index: OnceCell<SearchIndex>,
}

impl Herbarium {
    /// Build an engine with a real transport
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        Ok(Herbarium {
            context: Context::new(config)?,
            index: OnceCell::new(),
        })
    }

    /// Build an engine around a caller-supplied transport
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, SourceError> {
        Ok(Herbarium {
            context: Context::with_transport(config, transport)?,
            index: OnceCell::new(),
        })
    }

    /// Register a source factory under `id`
    pub fn register(
        &self,
        id: &str,
        factory: impl Fn(&SourceConfig) -> Result<Box<dyn Database>, SourceError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), SourceError> {
        self.context.register(id, factory)
    }

    /// Registered source ids in registration order
    pub fn sources(&self) -> Vec<String> {
        self.context.list()
    }

    /// The memoized database for `id`
    pub fn database(&self, id: &str) -> Result<Arc<dyn Database>, SourceError> {
        self.context.get(id)
    }

    /// Exact lookup across sources, first match wins
    pub fn lookup(&self, scientific_name: &str) -> Result<PlantRecord, SourceError> {
        for database in self.context.databases()? {
            match database.lookup(scientific_name) {
                Ok(record) => return Ok(record),
                Err(SourceError::NotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(SourceError::NotFound(scientific_name.to_string()))
    }

    /// Common-name search over all sources
    ///
    /// The index is built on first call and reused afterwards.
    pub fn search(&self, query: &str) -> Result<Vec<String>, SourceError> {
        let index = self.index.get_or_try_init(|| {
            let mut index = SearchIndex::new();
            for database in self.context.databases()? {
                index.index_database(database.as_ref())?;
            }
            info!("search index built");
            Ok::<_, SourceError>(index)
        })?;
        Ok(index.search(query))
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn cache(&self) -> Arc<HttpCache> {
        self.context.cache()
    }
}
