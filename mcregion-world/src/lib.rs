//! Resolve world block coordinates to decompressed chunk data.
//!
//! World coordinate -> region filename -> cached region file -> location
//! table slot -> chunk payload -> decompressed NBT bytes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mcregion_anvil::coords;
use mcregion_anvil::{ChunkSlot, RegionPos, Result, WorldPos};
use mcregion_cache::{DirectorySource, EvictionPolicy, RegionCache};
use mcregion_metrics::ScanMetrics;

/// Settings for building a [`BlockResolver`] over a world directory.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Directory containing the `r.<x>.<z>.mca` files.
    pub world_dir: PathBuf,
    pub cache_capacity: usize,
    pub eviction: EvictionPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            world_dir: PathBuf::from("."),
            cache_capacity: mcregion_cache::DEFAULT_CAPACITY.get(),
            eviction: EvictionPolicy::Bypass,
        }
    }
}

/// A chunk that exists in its region file, already decompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedChunk {
    pub region: RegionPos,
    pub slot: ChunkSlot,
    /// Compression type byte the payload was stored with.
    pub compression: u8,
    /// Uncompressed NBT byte stream.
    pub nbt: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkLookup {
    Present(DecodedChunk),
    /// The region file exists but this chunk was never generated.
    Absent { region: RegionPos, slot: ChunkSlot },
}

impl ChunkLookup {
    pub fn is_absent(&self) -> bool {
        matches!(self, ChunkLookup::Absent { .. })
    }

    pub fn nbt(&self) -> Option<&[u8]> {
        match self {
            ChunkLookup::Present(chunk) => Some(&chunk.nbt),
            ChunkLookup::Absent { .. } => None,
        }
    }

    pub fn region(&self) -> RegionPos {
        match self {
            ChunkLookup::Present(chunk) => chunk.region,
            ChunkLookup::Absent { region, .. } => *region,
        }
    }
}

/// Chunk lookup for one block, carrying the block position (including y)
/// for the NBT stage that consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLookup {
    pub pos: WorldPos,
    pub chunk: ChunkLookup,
}

/// Answers "which chunk data covers world coordinate (x, y, z)".
pub struct BlockResolver {
    cache: RegionCache,
    metrics: Option<Arc<ScanMetrics>>,
}

impl BlockResolver {
    pub fn new(cache: RegionCache, metrics: Option<Arc<ScanMetrics>>) -> Self {
        Self { cache, metrics }
    }

    /// Resolver reading region files from `config.world_dir`.
    pub fn from_config(config: &ResolverConfig, metrics: Option<Arc<ScanMetrics>>) -> Self {
        let source = Arc::new(DirectorySource::new(config.world_dir.clone()));
        log::debug!("Reading region files from {:?}", source.root());
        let cache = RegionCache::new(source, config.cache_capacity, config.eviction, metrics.clone());
        Self::new(cache, metrics)
    }

    pub fn cache(&self) -> &RegionCache {
        &self.cache
    }

    /// Decompressed chunk data for the chunk holding world block (x, z).
    pub fn resolve_chunk(&self, x: i64, z: i64) -> Result<ChunkLookup> {
        let result = self.load_chunk(x, z);
        if let Some(m) = &self.metrics {
            match &result {
                Ok(ChunkLookup::Present(_)) => m.record_chunk_present(),
                Ok(ChunkLookup::Absent { .. }) => m.record_chunk_absent(),
                Err(_) => m.record_error(),
            }
        }
        result
    }

    pub fn resolve_block(&self, pos: WorldPos) -> Result<BlockLookup> {
        let chunk = self.resolve_chunk(pos.x, pos.z)?;
        log::trace!("Block {} -> {:?}", pos, chunk.nbt().map(<[u8]>::len));
        Ok(BlockLookup { pos, chunk })
    }

    fn load_chunk(&self, x: i64, z: i64) -> Result<ChunkLookup> {
        let region_pos = coords::region_coordinate_of(x, z);
        let slot = coords::chunk_slot_index(x, z);
        let region = self.cache.get(&region_pos.filename())?;

        let Some(payload) = region.chunk(slot)? else {
            return Ok(ChunkLookup::Absent { region: region_pos, slot });
        };

        let start = Instant::now();
        let nbt = payload.decompress()?;
        if let Some(m) = &self.metrics {
            m.record_decompression(start.elapsed(), nbt.len());
        }

        Ok(ChunkLookup::Present(DecodedChunk {
            region: region_pos,
            slot,
            compression: payload.compression,
            nbt,
        }))
    }
}
