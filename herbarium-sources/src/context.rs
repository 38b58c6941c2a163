//! Run context
//!
//! One context per run: it owns the shared cache, the registry of
//! sources, and the settings every factory constructs from.

use crate::{Database, Registry, SourceError};
use herbarium_cache::{
    FileStorage, HttpCache, MemoryStorage, ReqwestTransport, Storage, Transport,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Run settings, deserializable from a config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache directory; in-memory cache when absent
    pub cache_dir: Option<PathBuf>,
    /// Network timeout in seconds
    pub timeout_secs: Option<u64>,
    /// When set, only the source with this id is registered
    pub source: Option<String>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Shared capabilities handed to every source factory
pub struct SourceConfig {
    cache: Arc<HttpCache>,
    cache_dir: Option<PathBuf>,
    timeout: Duration,
}

impl SourceConfig {
    pub fn new(cache: Arc<HttpCache>, cache_dir: Option<PathBuf>, timeout: Duration) -> Self {
        SourceConfig {
            cache,
            cache_dir,
            timeout,
        }
    }

    /// A config with an unscripted transport and in-memory storage,
    /// for tests and offline sources
    pub fn in_memory() -> Self {
        let transport = Arc::new(herbarium_cache::testing::ScriptedTransport::new());
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        SourceConfig {
            cache: Arc::new(HttpCache::new(
                transport,
                Box::new(MemoryStorage::new()),
                timeout,
            )),
            cache_dir: None,
            timeout,
        }
    }

    pub fn cache(&self) -> Arc<HttpCache> {
        Arc::clone(&self.cache)
    }

    pub fn cache_dir(&self) -> Option<&PathBuf> {
        self.cache_dir.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Owns the registry and the shared cache for one run
pub struct Context {
    registry: Registry,
    config: SourceConfig,
    source_filter: Option<String>,
}

impl Context {
    /// Build a context with a real transport and the configured storage
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
        Context::with_transport(config, transport)
    }

    /// Build a context around a caller-supplied transport
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, SourceError> {
        let storage: Box<dyn Storage> = match &config.cache_dir {
            Some(dir) => Box::new(FileStorage::new(dir).map_err(|err| SourceError::Io {
                path: dir.clone(),
                source: err,
            })?),
            None => Box::new(MemoryStorage::new()),
        };
        let cache = Arc::new(HttpCache::new(transport, storage, config.timeout()));
        info!(
            cache_dir = ?config.cache_dir,
            timeout_secs = config.timeout().as_secs(),
            "context ready"
        );
        Ok(Context {
            registry: Registry::new(),
            config: SourceConfig::new(cache, config.cache_dir.clone(), config.timeout()),
            source_filter: config.source.clone(),
        })
    }

    /// Register a factory unless the run is filtered to another source
    pub fn register(
        &self,
        id: &str,
        factory: impl Fn(&SourceConfig) -> Result<Box<dyn Database>, SourceError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), SourceError> {
        if let Some(only) = &self.source_filter {
            if only != id {
                debug!(source = id, only = %only, "skipped by source filter");
                return Ok(());
            }
        }
        self.registry.register(id, factory)
    }

    /// The memoized database for `id`
    pub fn get(&self, id: &str) -> Result<Arc<dyn Database>, SourceError> {
        self.registry.get(id, &self.config)
    }

    /// Registered ids in registration order
    pub fn list(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Every registered database, in registration order
    pub fn databases(&self) -> Result<Vec<Arc<dyn Database>>, SourceError> {
        self.list().iter().map(|id| self.get(id)).collect()
    }

    pub fn cache(&self) -> Arc<HttpCache> {
        self.config.cache()
    }

    pub fn source_config(&self) -> &SourceConfig {
        &self.config
    }

    /// Tear the context down: registered instances and the shared
    /// cache handle are dropped together
    pub fn close(self) {
        debug!("context closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlantRecord, Records};
    use herbarium_cache::testing::ScriptedTransport;
    use herbarium_core::Lazy;

    struct Stub(String);

    impl Database for Stub {
        fn id(&self) -> &str {
            &self.0
        }
        fn iterate(&self) -> Records {
            Lazy::once(Ok(PlantRecord::new("salix alba")))
        }
    }

    fn context(config: &Config) -> Context {
        Context::with_transport(config, Arc::new(ScriptedTransport::new())).expect("context")
    }

    #[test]
    fn test_get_is_a_singleton_per_context() {
        let ctx = context(&Config::default());
        ctx.register("stub", |_| Ok(Box::new(Stub("stub".to_string()))))
            .unwrap();
        let first = ctx.get("stub").unwrap();
        let second = ctx.get("stub").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_source_filter_skips_other_ids() {
        let config = Config {
            source: Some("kept".to_string()),
            ..Config::default()
        };
        let ctx = context(&config);
        ctx.register("kept", |_| Ok(Box::new(Stub("kept".to_string()))))
            .unwrap();
        ctx.register("dropped", |_| Ok(Box::new(Stub("dropped".to_string()))))
            .unwrap();
        assert_eq!(ctx.list(), vec!["kept"]);
    }

    #[test]
    fn test_file_cache_dir_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config {
            cache_dir: Some(dir.path().join("cache")),
            ..Config::default()
        };
        let ctx = context(&config);
        assert!(ctx.cache().is_empty());
        assert!(dir.path().join("cache").is_dir());
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_json::from_str("{}").expect("config");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.cache_dir.is_none());
        assert!(config.source.is_none());
    }
}
