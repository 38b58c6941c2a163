//! Source registry
//!
//! Maps source ids to factories and memoizes the constructed
//! instance per id. Registration order is preserved and duplicate
//! ids are rejected.

use crate::{Database, SourceConfig, SourceError};
use once_cell::sync::OnceCell;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Factory = Box<dyn Fn(&SourceConfig) -> Result<Box<dyn Database>, SourceError> + Send + Sync>;

struct RegistryEntry {
    id: String,
    factory: Factory,
    instance: OnceCell<Arc<dyn Database>>,
}

/// Ordered registry of database factories
#[derive(Default)]
pub struct Registry {
    entries: RwLock<Vec<RegistryEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register a factory under `id`; duplicate ids are a conflict
    pub fn register(
        &self,
        id: impl Into<String>,
        factory: impl Fn(&SourceConfig) -> Result<Box<dyn Database>, SourceError> + Send + Sync + 'static,
    ) -> Result<(), SourceError> {
        let id = id.into();
        let mut entries = write_lock(&self.entries);
        if entries.iter().any(|entry| entry.id == id) {
            return Err(SourceError::Conflict(id));
        }
        debug!(source = %id, "registered");
        entries.push(RegistryEntry {
            id,
            factory: Box::new(factory),
            instance: OnceCell::new(),
        });
        Ok(())
    }

    /// The memoized instance for `id`, constructing it on first call
    pub fn get(&self, id: &str, config: &SourceConfig) -> Result<Arc<dyn Database>, SourceError> {
        let entries = read_lock(&self.entries);
        let entry = entries
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))?;
        let instance = entry
            .instance
            .get_or_try_init(|| (entry.factory)(config).map(Arc::from))?;
        Ok(Arc::clone(instance))
    }

    /// Registered ids in registration order
    pub fn list(&self) -> Vec<String> {
        read_lock(&self.entries)
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.entries).is_empty()
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
