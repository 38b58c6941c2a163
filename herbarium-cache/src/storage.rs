//! Storage providers
//!
//! Key-value byte stores backing the response cache. Keys are request
//! fingerprints, already filesystem safe.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Byte store for cache entries
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()>;
    fn remove(&mut self, key: &str);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Drop every entry. The only eviction this layer offers.
    fn clear(&mut self);
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// File storage: one file per key under a base directory
#[derive(Debug)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.key_to_path(key);
        match fs::read(&path) {
            Ok(payload) => {
                debug!(path = %path.display(), "read cache file");
                Some(payload)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path.display(), %err, "unreadable cache file");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> io::Result<()> {
        let path = self.key_to_path(key);
        debug!(path = %path.display(), "writing cache file");
        fs::write(path, value)
    }

    fn remove(&mut self, key: &str) {
        let path = self.key_to_path(key);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), %err, "cannot remove cache file");
            }
        }
    }

    fn len(&self) -> usize {
        fs::read_dir(&self.base_dir)
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }

    fn clear(&mut self) {
        if let Ok(entries) = fs::read_dir(&self.base_dir) {
            for entry in entries.filter_map(Result::ok) {
                if let Err(err) = fs::remove_file(entry.path()) {
                    warn!(path = %entry.path().display(), %err, "cannot remove cache file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert!(storage.is_empty());
        storage.set("a", b"one").unwrap();
        assert_eq!(storage.get("a"), Some(b"one".to_vec()));
        assert_eq!(storage.len(), 1);
        storage.remove("a");
        assert_eq!(storage.get("a"), None);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();
        storage.set("deadbeef", b"payload").unwrap();
        assert_eq!(storage.get("deadbeef"), Some(b"payload".to_vec()));
        assert_eq!(storage.len(), 1);
        storage.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert_eq!(storage.get("unknown"), None);
    }
}
