//! Bounded caches that keep repeated pack reads cheap.
//!
//! Two caches, each a fixed-size array evicted by recency, following the
//! pack cache design in `got`'s `lib/pack.c`: a small [`PackCache`] of open
//! `(index, pack)` pairs so a repository doesn't re-mmap the same files on
//! every lookup, and a per-pack [`DeltaCache`] of inflated delta payloads so
//! walking a chain more than once doesn't re-run zlib.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;

use crate::pack::PackFile;
use crate::{PackError, DELTA_CACHE_CAPACITY, PACK_CACHE_CAPACITY};

/// A small LRU of open `(pack, index)` pairs, keyed by `.pack` path.
///
/// Capacity defaults to [`PACK_CACHE_CAPACITY`]; evicting an entry drops
/// the `Arc<PackFile>`, closing its mmap once no other reader holds it.
pub struct PackCache {
    capacity: usize,
    entries: Vec<(PathBuf, Arc<PackFile>)>,
}

impl PackCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "PackCache capacity must be positive");
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Fetch the pack at `path`, opening and inserting it if not resident.
    /// On hit, the entry moves to the front (most recently used).
    pub fn get_or_open(&mut self, path: impl AsRef<Path>) -> Result<Arc<PackFile>, PackError> {
        let path = path.as_ref();
        if let Some(pos) = self.entries.iter().position(|(p, _)| p == path) {
            let entry = self.entries.remove(pos);
            let pack = entry.1.clone();
            self.entries.insert(0, entry);
            return Ok(pack);
        }

        let pack = Arc::new(PackFile::open(path)?);
        if self.entries.len() >= self.capacity {
            self.entries.pop(); // evict least-recently-used (tail)
        }
        self.entries.insert(0, (path.to_path_buf(), pack.clone()));
        Ok(pack)
    }

    /// Number of packs currently resident.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over resident packs, most-recently-used first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PackFile>> {
        self.entries.iter().map(|(_, pack)| pack)
    }
}

impl Default for PackCache {
    fn default() -> Self {
        Self::new(PACK_CACHE_CAPACITY)
    }
}

/// Per-pack LRU of inflated delta payloads, keyed by byte offset.
///
/// Each pack gets its own bucket capped at [`DELTA_CACHE_CAPACITY`] entries;
/// a cache miss costs one zlib inflate, a hit costs nothing.
pub struct DeltaCache {
    capacity: usize,
    buckets: HashMap<PathBuf, LruCache<u64, Arc<Vec<u8>>>>,
}

impl DeltaCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "DeltaCache capacity must be positive");
        Self {
            capacity,
            buckets: HashMap::new(),
        }
    }

    /// Look up a cached inflated payload for `(pack_path, offset)`.
    pub fn get(&mut self, pack_path: &Path, offset: u64) -> Option<Arc<Vec<u8>>> {
        self.buckets
            .get_mut(pack_path)
            .and_then(|bucket| bucket.get(&offset).cloned())
    }

    /// Insert a freshly inflated payload, creating the pack's bucket on
    /// first use.
    pub fn insert(&mut self, pack_path: &Path, offset: u64, data: Arc<Vec<u8>>) {
        let cap = NonZeroUsize::new(self.capacity).expect("capacity checked positive in new()");
        let bucket = self
            .buckets
            .entry(pack_path.to_path_buf())
            .or_insert_with(|| LruCache::new(cap));
        bucket.put(offset, data);
    }

    /// Drop the cached entries for a pack entirely (e.g. once it's evicted
    /// from the [`PackCache`]).
    pub fn clear_pack(&mut self, pack_path: &Path) {
        self.buckets.remove(pack_path);
    }
}

impl Default for DeltaCache {
    fn default() -> Self {
        Self::new(DELTA_CACHE_CAPACITY)
    }
}
