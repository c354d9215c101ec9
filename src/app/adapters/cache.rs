//! Fragment caching.
//!
//! Builders skip re-deriving a combined fragment when a cached copy exists.
//! The cache is an explicit port passed into each builder rather than ambient
//! filesystem state, so tests run against [`MemoryCache`] and `--force`
//! rebuilds run against [`NoCache`].

use crate::app::models::frame::Frame;
use crate::app::services::tsv::{self, KeySpec};
use crate::constants::CACHE_FILENAME;
use crate::error::{HarmonizerError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use walkdir::WalkDir;

/// Persistence port for combined fragments.
///
/// `load` takes the fragment's key layout because the persisted TSV carries
/// no dtype metadata.
pub trait FragmentCache {
    fn exists(&self, key: &str) -> bool;
    fn load(&self, key: &str, keys: &KeySpec) -> Result<Frame>;
    fn store(&self, key: &str, frame: &Frame) -> Result<()>;
}

/// On-disk cache: `<root>/<key>/df.tsv`
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key).join(CACHE_FILENAME)
    }

    /// Dataset keys currently cached, in sorted order
    pub fn cached_entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = WalkDir::new(&self.root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() == CACHE_FILENAME)
            .filter_map(|entry| {
                entry
                    .path()
                    .parent()
                    .and_then(|dir| dir.strip_prefix(&self.root).ok())
                    .map(|rel| rel.to_string_lossy().to_string())
            })
            .collect();
        entries.sort();
        entries
    }
}

impl FragmentCache for DiskCache {
    fn exists(&self, key: &str) -> bool {
        self.entry_path(key).is_file()
    }

    fn load(&self, key: &str, keys: &KeySpec) -> Result<Frame> {
        let path = self.entry_path(key);
        if !path.is_file() {
            return Err(HarmonizerError::CacheMiss {
                key: key.to_string(),
            });
        }
        debug!("cache hit for '{}' at {}", key, path.display());
        tsv::read_frame_from_path(&path, keys)
    }

    fn store(&self, key: &str, frame: &Frame) -> Result<()> {
        let path = self.entry_path(key);
        tsv::write_frame_to_path(frame, &path)?;
        debug!(
            "stored {} rows for '{}' at {}",
            frame.n_rows(),
            key,
            path.display()
        );
        Ok(())
    }
}

/// In-memory cache for deterministic tests
#[derive(Debug, Default)]
pub struct MemoryCache {
    inner: Mutex<HashMap<String, Frame>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FragmentCache for MemoryCache {
    fn exists(&self, key: &str) -> bool {
        self.inner.lock().expect("cache lock").contains_key(key)
    }

    fn load(&self, key: &str, _keys: &KeySpec) -> Result<Frame> {
        self.inner
            .lock()
            .expect("cache lock")
            .get(key)
            .cloned()
            .ok_or_else(|| HarmonizerError::CacheMiss {
                key: key.to_string(),
            })
    }

    fn store(&self, key: &str, frame: &Frame) -> Result<()> {
        self.inner
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), frame.clone());
        Ok(())
    }
}

/// A cache that never hits and never keeps, for forced rebuilds
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl FragmentCache for NoCache {
    fn exists(&self, _key: &str) -> bool {
        false
    }

    fn load(&self, key: &str, _keys: &KeySpec) -> Result<Frame> {
        Err(HarmonizerError::CacheMiss {
            key: key.to_string(),
        })
    }

    fn store(&self, _key: &str, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::value::Value;

    fn sample_frame() -> Frame {
        let mut frame = Frame::new(vec!["Municipality code".into(), "Year".into()]);
        frame.add_column("Population", Vec::new()).unwrap();
        frame
            .push_row(vec![
                Value::text("01001"),
                Value::Int(2021),
                Value::Number(210.0),
            ])
            .unwrap();
        frame
    }

    fn sample_keys() -> KeySpec {
        KeySpec::new(&["Municipality code", "Year"], &["Municipality code"])
    }

    #[test]
    fn test_disk_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let frame = sample_frame();

        assert!(!cache.exists("population-annual-census"));
        cache.store("population-annual-census", &frame).unwrap();
        assert!(cache.exists("population-annual-census"));

        let back = cache
            .load("population-annual-census", &sample_keys())
            .unwrap();
        assert!(frame.equivalent(&back));
        assert_eq!(cache.cached_entries(), vec!["population-annual-census"]);
    }

    #[test]
    fn test_disk_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        assert!(matches!(
            cache.load("absent", &sample_keys()),
            Err(HarmonizerError::CacheMiss { .. })
        ));
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::new();
        let frame = sample_frame();
        cache.store("x", &frame).unwrap();
        assert!(cache.exists("x"));
        assert_eq!(cache.load("x", &sample_keys()).unwrap(), frame);
    }

    #[test]
    fn test_no_cache_never_hits() {
        let cache = NoCache;
        cache.store("x", &sample_frame()).unwrap();
        assert!(!cache.exists("x"));
    }
}
