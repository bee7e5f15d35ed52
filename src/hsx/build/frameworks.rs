//! Framework memoization
//!
//! Frameworks are loaded once per name. The first `include framework` for a
//! name decides the version; later includes of the same name are no-ops, even
//! when they ask for another version. Names compare case-insensitively.
//!
//! The default cache is process-wide, so two build runs in the same process
//! share it. Tests and embedders that need isolation create their own.
//!
//! A load starts with [`FrameworkCache::claim`], which checks and inserts
//! under one lock, so concurrent runs never load the same name twice. A failed
//! load hands its claim back with [`FrameworkCache::release`].

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL_FRAMEWORKS: Lazy<Arc<FrameworkCache>> = Lazy::new(|| Arc::new(FrameworkCache::new()));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFramework {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Default)]
pub struct FrameworkCache {
    loaded: Mutex<HashMap<String, LoadedFramework>>,
}

impl FrameworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Arc<FrameworkCache> {
        GLOBAL_FRAMEWORKS.clone()
    }

    pub fn get(&self, name: &str) -> Option<LoadedFramework> {
        self.loaded.lock().get(&key(name)).cloned()
    }

    /// Claim `name` for loading at `version`.
    ///
    /// Returns `None` when the caller now owns the load, or the entry that
    /// already holds the name.
    pub fn claim(&self, name: &str, version: &str) -> Option<LoadedFramework> {
        match self.loaded.lock().entry(key(name)) {
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(LoadedFramework {
                    name: name.to_string(),
                    version: version.to_string(),
                });
                None
            }
        }
    }

    /// Give up a claim whose load failed.
    pub fn release(&self, name: &str) {
        self.loaded.lock().remove(&key(name));
    }

    pub fn len(&self) -> usize {
        self.loaded.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.lock().is_empty()
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}
