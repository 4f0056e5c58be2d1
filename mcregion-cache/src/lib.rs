//! Bounded in-memory cache of whole region files.
//!
//! A coordinate sweep visits the same region file thousands of times, so
//! each file is read once and then served from memory. The cache holds at
//! most `capacity` files; what happens when it is full is decided by the
//! [`EvictionPolicy`].

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use lru::LruCache;
use mcregion_anvil::{RegionFile, Result};
use mcregion_metrics::ScanMetrics;

pub mod source;

pub use source::DirectorySource;

/// A bounded scan rarely touches more than a few region files at once.
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(4).unwrap();

/// Where region file bytes come from.
pub trait RegionSource: Send + Sync {
    /// Read the entire named region file.
    fn read_region(&self, name: &str) -> Result<Vec<u8>>;
}

/// What to do with a freshly read file when the cache is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Keep the first `capacity` files forever; later files are read on
    /// every lookup and never cached.
    #[default]
    Bypass,
    /// Drop the least recently used file to make room.
    Lru,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bypass" | "none" | "never" => Ok(EvictionPolicy::Bypass),
            "lru" => Ok(EvictionPolicy::Lru),
            other => Err(format!("unknown eviction policy '{}' (expected bypass or lru)", other)),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Bypass => write!(f, "bypass"),
            EvictionPolicy::Lru => write!(f, "lru"),
        }
    }
}

/// Region file cache keyed by filename.
///
/// Safe to share between sweep threads: lookups and inserts happen under one
/// mutex, file reads happen outside it, and a filename is never cached twice.
pub struct RegionCache {
    source: Arc<dyn RegionSource>,
    policy: EvictionPolicy,
    entries: Mutex<LruCache<String, Arc<RegionFile>>>,
    metrics: Option<Arc<ScanMetrics>>,
}

impl RegionCache {
    pub fn new(
        source: Arc<dyn RegionSource>,
        capacity: usize,
        policy: EvictionPolicy,
        metrics: Option<Arc<ScanMetrics>>,
    ) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            log::warn!("Region cache capacity 0 is invalid, using {}", DEFAULT_CAPACITY);
            DEFAULT_CAPACITY
        });

        Self {
            source,
            policy,
            entries: Mutex::new(LruCache::new(cap)),
            metrics,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Number of files currently cached.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries().contains(name)
    }

    /// Return the named region file, reading it from the source on a miss.
    ///
    /// Read failures are returned to the caller and nothing is cached.
    pub fn get(&self, name: &str) -> Result<Arc<RegionFile>> {
        if let Some(region) = self.lookup(name) {
            if let Some(m) = &self.metrics { m.record_cache_hit(); }
            return Ok(region);
        }
        if let Some(m) = &self.metrics { m.record_cache_miss(); }

        let start = Instant::now();
        let bytes = self.source.read_region(name)?;
        if let Some(m) = &self.metrics {
            m.record_region_read(start.elapsed(), bytes.len());
        }

        let region = Arc::new(RegionFile::from_bytes(name, bytes)?);
        log::debug!("Loaded {} ({} bytes) in {:?}", name, region.len(), start.elapsed());

        Ok(self.insert(name, region))
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Arc<RegionFile>>> {
        // Cached buffers are immutable, so a poisoned lock still guards valid data.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, name: &str) -> Option<Arc<RegionFile>> {
        let mut entries = self.entries();
        match self.policy {
            EvictionPolicy::Bypass => entries.peek(name).cloned(),
            EvictionPolicy::Lru => entries.get(name).cloned(),
        }
    }

    fn insert(&self, name: &str, region: Arc<RegionFile>) -> Arc<RegionFile> {
        let mut entries = self.entries();

        // Another thread may have loaded the same file while we were reading.
        if let Some(existing) = entries.peek(name) {
            return existing.clone();
        }

        match self.policy {
            EvictionPolicy::Bypass => {
                if entries.len() < entries.cap().get() {
                    entries.put(name.to_string(), region.clone());
                } else {
                    log::warn!(
                        "Region cache full ({} files), {} is not cached; consider a larger cache or --eviction lru",
                        entries.cap(),
                        name
                    );
                    if let Some(m) = &self.metrics { m.record_cache_bypass(); }
                }
            }
            EvictionPolicy::Lru => {
                if let Some((evicted, _)) = entries.push(name.to_string(), region.clone()) {
                    log::debug!("Evicted {} from region cache for {}", evicted, name);
                    if let Some(m) = &self.metrics { m.record_cache_eviction(); }
                }
            }
        }

        region
    }
}
