//! Remembered parameter values, keyed by (document path, parameter name).
//!
//! The last value entered for a parameter pre-fills the next prompt for the
//! same document. Values are written as soon as they are collected.

use crate::error::Result;
use crate::io;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

type ValueMap = BTreeMap<String, BTreeMap<String, String>>;

pub trait DefaultsStore {
    fn get(&self, document: &Path, name: &str) -> Option<String>;
    fn set(&mut self, document: &Path, name: &str, value: &str) -> Result<()>;
}

fn doc_key(document: &Path) -> String {
    document.to_string_lossy().into_owned()
}

// ─── MemoryDefaults ───────────────────────────────────────────────────────

/// Process-local store; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryDefaults {
    values: ValueMap,
}

impl MemoryDefaults {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DefaultsStore for MemoryDefaults {
    fn get(&self, document: &Path, name: &str) -> Option<String> {
        self.values.get(&doc_key(document))?.get(name).cloned()
    }

    fn set(&mut self, document: &Path, name: &str, value: &str) -> Result<()> {
        self.values
            .entry(doc_key(document))
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

// ─── FileDefaults ─────────────────────────────────────────────────────────

/// YAML-backed store.
///
/// ```yaml
/// /home/me/ops/deploy.md:
///   ENV: staging
///   REGION: eu-west-1
/// ```
///
/// The file is created lazily on the first `set` and rewritten atomically on
/// every `set`.
#[derive(Debug)]
pub struct FileDefaults {
    path: PathBuf,
    values: ValueMap,
}

impl FileDefaults {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                ValueMap::new()
            } else {
                serde_yaml::from_str(&content)?
            }
        } else {
            ValueMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every remembered value for `document`, sorted by name.
    pub fn values_for(&self, document: &Path) -> Vec<(String, String)> {
        self.values
            .get(&doc_key(document))
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Forget everything remembered for `document`. Returns how many values
    /// were removed.
    pub fn clear(&mut self, document: &Path) -> Result<usize> {
        let removed = self
            .values
            .remove(&doc_key(document))
            .map(|m| m.len())
            .unwrap_or(0);
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    fn save(&self) -> Result<()> {
        let content = serde_yaml::to_string(&self.values)?;
        io::atomic_write(&self.path, content.as_bytes())
    }
}

impl DefaultsStore for FileDefaults {
    fn get(&self, document: &Path, name: &str) -> Option<String> {
        self.values.get(&doc_key(document))?.get(name).cloned()
    }

    fn set(&mut self, document: &Path, name: &str, value: &str) -> Result<()> {
        self.values
            .entry(doc_key(document))
            .or_default()
            .insert(name.to_string(), value.to_string());
        self.save()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (FileDefaults, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileDefaults::open(dir.path().join("defaults.yaml")).unwrap();
        (store, dir)
    }

    #[test]
    fn get_returns_none_when_empty() {
        let (store, _dir) = store();
        assert_eq!(store.get(Path::new("/doc.md"), "ENV"), None);
    }

    #[test]
    fn set_persists_immediately() {
        let (mut store, dir) = store();
        store.set(Path::new("/doc.md"), "ENV", "prod").unwrap();

        let reopened = FileDefaults::open(dir.path().join("defaults.yaml")).unwrap();
        assert_eq!(reopened.get(Path::new("/doc.md"), "ENV"), Some("prod".into()));
    }

    #[test]
    fn values_are_scoped_per_document() {
        let (mut store, _dir) = store();
        store.set(Path::new("/a.md"), "ENV", "dev").unwrap();
        store.set(Path::new("/b.md"), "ENV", "prod").unwrap();
        assert_eq!(store.get(Path::new("/a.md"), "ENV"), Some("dev".into()));
        assert_eq!(store.get(Path::new("/b.md"), "ENV"), Some("prod".into()));
    }

    #[test]
    fn later_set_overwrites() {
        let (mut store, _dir) = store();
        store.set(Path::new("/a.md"), "ENV", "dev").unwrap();
        store.set(Path::new("/a.md"), "ENV", "qa").unwrap();
        assert_eq!(store.values_for(Path::new("/a.md")), [("ENV".to_string(), "qa".to_string())]);
    }

    #[test]
    fn clear_removes_document_values() {
        let (mut store, dir) = store();
        store.set(Path::new("/a.md"), "X", "1").unwrap();
        store.set(Path::new("/a.md"), "Y", "2").unwrap();
        assert_eq!(store.clear(Path::new("/a.md")).unwrap(), 2);
        assert_eq!(store.clear(Path::new("/a.md")).unwrap(), 0);

        let reopened = FileDefaults::open(dir.path().join("defaults.yaml")).unwrap();
        assert!(reopened.values_for(Path::new("/a.md")).is_empty());
    }

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryDefaults::new();
        store.set(Path::new("/a.md"), "K", "v").unwrap();
        assert_eq!(store.get(Path::new("/a.md"), "K"), Some("v".into()));
        assert_eq!(store.get(Path::new("/b.md"), "K"), None);
    }
}
