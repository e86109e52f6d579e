//! Content-addressed cache of transpiled modules.
//!
//! Editing one file of a project and rebundling should only recompile that
//! file. Modules are keyed by a Blake3 hash of their path and source, so a
//! cache hit is always a byte-identical input and never needs invalidation.
//!
//! # Examples
//!
//! ```
//! use uigen_bundler::TranspileCache;
//! use uigen_vfs::VfsPath;
//!
//! let cache = TranspileCache::new(16);
//! let path = VfsPath::new("/App.jsx").unwrap();
//!
//! cache.get_or_transpile(&path, "export default 1;").unwrap();
//! cache.get_or_transpile(&path, "export default 1;").unwrap();
//!
//! let stats = cache.stats();
//! assert_eq!((stats.hits, stats.misses), (1, 1));
//! ```

use crate::transpiler::{TranspiledModule, transpile};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uigen_core::Result;
use uigen_vfs::VfsPath;

/// Cache key derived from a file's path and content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes `path` and `source` into a key.
    ///
    /// The path takes part in the hash because error positions and
    /// extension-dependent passes make the output path-specific.
    #[must_use]
    pub fn for_source(path: &VfsPath, source: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(path.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(source.as_bytes());
        Self(format!("module_{}", hasher.finalize().to_hex()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hit and miss counters of a [`TranspileCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that ran the transpiler
    pub misses: u64,
    /// Modules currently cached
    pub entries: usize,
}

/// Thread-safe LRU cache of [`TranspiledModule`]s.
///
/// Failed compilations are not cached: the error is returned and the next
/// lookup tries again.
pub struct TranspileCache {
    cache: Mutex<LruCache<CacheKey, Arc<TranspiledModule>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TranspileCache {
    /// Creates a cache holding at most `capacity` modules (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the compiled module for `source`, compiling it on a miss.
    ///
    /// The lock is not held while compiling, so two threads missing on the
    /// same key may both compile it; the results are identical.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`transpile`].
    pub fn get_or_transpile(&self, path: &VfsPath, source: &str) -> Result<Arc<TranspiledModule>> {
        let key = CacheKey::for_source(path, source);
        if let Some(module) = self.lock().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(path = %path, key = %key, "transpile cache hit");
            return Ok(module);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let module = Arc::new(transpile(path, source)?);
        let mut cache = self.lock();
        cache.put(key, Arc::clone(&module));
        tracing::debug!(path = %path, cache_size = cache.len(), "cached transpiled module");
        Ok(module)
    }

    /// Returns `true` if the exact `source` at `path` is cached.
    #[must_use]
    pub fn contains(&self, path: &VfsPath, source: &str) -> bool {
        self.lock().contains(&CacheKey::for_source(path, source))
    }

    /// Drops every cached module and resets the counters.
    pub fn clear(&self) {
        self.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of cached modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of cached modules.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    // A panic while holding the lock cannot leave the LRU half-updated in a
    // way that matters here, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Arc<TranspiledModule>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TranspileCache {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for TranspileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("TranspileCache")
            .field("len", &stats.entries)
            .field("capacity", &self.capacity())
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .finish()
    }
}
