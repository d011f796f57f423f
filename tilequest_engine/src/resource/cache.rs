//! Reference-counted asset cache.
//!
//! Entries are held as [`Weak`] handles: the cache never keeps an asset alive
//! by itself. While any caller holds the `Rc` returned by [`AssetCache::get`],
//! every request for the same key returns that same instance. Once the last
//! `Rc` drops, the entry is dead and the next request loads from disk again.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use log::{debug, warn};

use super::{Resource, ResourceError};

/// Knows how to turn a cache key into a freshly loaded asset.
pub trait AssetLoader {
    type Key: Clone + Debug + Eq + Hash;
    type Asset;

    /// Load the asset for `key` from the directory `dir`.
    ///
    /// # Errors
    /// - any I/O, format, or argument problem; the cache reports it and yields the sentinel
    fn load(&mut self, dir: &Path, key: &Self::Key) -> Result<Self::Asset, ResourceError>;
}

/// Counters describing how a cache has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from a live entry.
    pub hits: usize,
    /// Successful loads from the backing store.
    pub loads: usize,
    /// Failed loads (each produced the sentinel).
    pub failures: usize,
}

/// A single sub-manager: one directory, one loader, one cache.
#[derive(Debug)]
pub struct AssetCache<L: AssetLoader> {
    dir: PathBuf,
    loader: L,
    entries: HashMap<L::Key, Weak<L::Asset>>,
    stats: CacheStats,
}

impl<L: AssetLoader> AssetCache<L> {
    pub fn new(dir: impl Into<PathBuf>, loader: L) -> Self {
        Self {
            dir: dir.into(),
            loader,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// The directory this cache loads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the live instance for `key`, loading it on a miss.
    ///
    /// Failures are logged and yield [`Resource::Missing`]; they are never cached.
    pub fn get(&mut self, key: &L::Key) -> Resource<L::Asset> {
        if let Some(asset) = self.entries.get(key).and_then(Weak::upgrade) {
            self.stats.hits += 1;
            return Resource::Loaded(asset);
        }

        match self.loader.load(&self.dir, key) {
            Ok(asset) => {
                let asset = Rc::new(asset);
                self.entries.insert(key.clone(), Rc::downgrade(&asset));
                self.stats.loads += 1;
                debug!("loaded {key:?} from '{}'", self.dir.display());
                Resource::Loaded(asset)
            },
            Err(err) => {
                self.entries.remove(key);
                self.stats.failures += 1;
                warn!("error loading {key:?}: {err}");
                Resource::Missing
            },
        }
    }

    /// True when `key` currently maps to a live instance.
    pub fn is_live(&self, key: &L::Key) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.strong_count() > 0)
    }

    /// Number of entries whose asset is still referenced somewhere.
    pub fn live_entries(&self) -> usize {
        self.entries.values().filter(|entry| entry.strong_count() > 0).count()
    }

    /// Drop bookkeeping for entries whose asset has been freed.
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.strong_count() > 0);
        before - self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts loads and fails for keys starting with "bad".
    #[derive(Debug, Default)]
    struct EchoLoader {
        calls: usize,
    }

    impl AssetLoader for EchoLoader {
        type Key = String;
        type Asset = String;

        fn load(&mut self, _dir: &Path, key: &String) -> Result<String, ResourceError> {
            self.calls += 1;
            if key.starts_with("bad") {
                return Err(ResourceError::Empty { path: PathBuf::from(key) });
            }
            Ok(format!("asset:{key}"))
        }
    }

    #[test]
    fn live_entry_is_shared() {
        let mut cache = AssetCache::new("x", EchoLoader::default());
        let first = cache.get(&"a".to_string());
        let second = cache.get(&"a".to_string());
        assert!(first.ptr_eq(&second));
        assert_eq!(cache.loader.calls, 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, loads: 1, failures: 0 });
    }

    #[test]
    fn dropped_entry_reloads() {
        let mut cache = AssetCache::new("x", EchoLoader::default());
        let first = cache.get(&"a".to_string());
        assert!(cache.is_live(&"a".to_string()));
        drop(first);
        assert!(!cache.is_live(&"a".to_string()));
        let again = cache.get(&"a".to_string());
        assert_eq!(again.get().map(String::as_str), Some("asset:a"));
        assert_eq!(cache.loader.calls, 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = AssetCache::new("x", EchoLoader::default());
        assert!(cache.get(&"bad".to_string()).is_missing());
        assert!(cache.get(&"bad".to_string()).is_missing());
        assert_eq!(cache.loader.calls, 2);
        assert_eq!(cache.stats().failures, 2);
    }

    #[test]
    fn purge_removes_dead_entries() {
        let mut cache = AssetCache::new("x", EchoLoader::default());
        let keep = cache.get(&"a".to_string());
        drop(cache.get(&"b".to_string()));
        assert_eq!(cache.live_entries(), 1);
        assert_eq!(cache.purge(), 1);
        assert!(keep.is_loaded());
    }
}
