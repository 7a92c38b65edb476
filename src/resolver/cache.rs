//! Memoization cache for expansion results.
//!
//! The cache is caller-owned and explicitly scoped: create one per run and
//! drop it when dependency declarations may have changed. There is no
//! automatic invalidation - entries stay valid only because declarations
//! are immutable within a single run.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::dependency::Dependency;

/// A lock-protected map of completed expansion results.
///
/// Keys combine a caller-supplied cache key with the identity of the
/// package being expanded (fully qualified name plus kind). Entries are
/// always fully merged results; partial expansions are never stored, so
/// concurrent readers can only ever observe complete plans. Concurrent
/// misses on the same key may compute the same result redundantly - the
/// later insert simply overwrites with an identical value.
#[derive(Debug, Default)]
pub struct ExpansionCache {
    entries: Mutex<HashMap<(String, String), Vec<Dependency>>>,
}

impl ExpansionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached expansion for `(cache_key, identity)`.
    ///
    /// Returns a defensive copy; mutating the returned plan never affects
    /// the cached entry.
    pub fn get(&self, cache_key: &str, identity: &str) -> Option<Vec<Dependency>> {
        self.lock().get(&(cache_key.to_string(), identity.to_string())).cloned()
    }

    /// Store a completed expansion for `(cache_key, identity)`.
    pub fn insert(&self, cache_key: &str, identity: &str, deps: Vec<Dependency>) {
        self.lock().insert((cache_key.to_string(), identity.to_string()), deps);
    }

    /// Number of cached expansions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Vec<Dependency>>> {
        // A poisoned lock can only mean a panic mid-insert of a complete
        // value; the map itself is still well-formed.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
