use std::collections::{HashMap, VecDeque};

use crate::render::surface::Raster;

/// Default number of rasters retained by [`RasterCache::default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Stable identity of a cacheable raster source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Decoded rasters keyed by source identity, evicting the least recently used entry once
/// more than `capacity` are held. A capacity of 0 disables retention.
#[derive(Clone, Debug)]
pub struct RasterCache {
    capacity: usize,
    entries: HashMap<CacheKey, Raster>,
    // Front is least recently used.
    order: VecDeque<CacheKey>,
    stats: CacheStats,
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl RasterCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn contains(&self, key: CacheKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Look up `key`, marking it most recently used. Rasters share pixel storage, so the
    /// returned clone is cheap.
    pub fn get(&mut self, key: CacheKey) -> Option<Raster> {
        match self.entries.get(&key) {
            Some(r) => {
                self.stats.hits += 1;
                let r = r.clone();
                self.touch(key);
                Some(r)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, raster: Raster) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, raster).is_some() {
            self.touch(key);
        } else {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            let Some(old) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&old);
            self.stats.evictions += 1;
            tracing::debug!(key = old.0, "evicted cached raster");
        }
    }

    pub fn remove(&mut self, key: CacheKey) -> Option<Raster> {
        let r = self.entries.remove(&key)?;
        self.order.retain(|k| *k != key);
        Some(r)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
