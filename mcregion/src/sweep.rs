//! Walks every block in the scan volume and resolves its chunk.

use std::ops::Add;

use anyhow::{Context, Result};
use mcregion_anvil::{RegionError, WorldPos};
use mcregion_world::{BlockResolver, ChunkLookup};
use rayon::prelude::*;

use crate::bounds::ScanBounds;

/// Outcome counts for a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub blocks: u64,
    pub present: u64,
    pub absent: u64,
    pub errors: u64,
}

impl Add for SweepSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            blocks: self.blocks + other.blocks,
            present: self.present + other.present,
            absent: self.absent + other.absent,
            errors: self.errors + other.errors,
        }
    }
}

/// Resolve every block in `bounds`, y outermost, z innermost.
///
/// Failures are logged per block and the sweep continues. With more than one
/// thread, y layers are spread over a rayon pool sharing the resolver's cache.
pub fn sweep(resolver: &BlockResolver, bounds: &ScanBounds, threads: usize) -> Result<SweepSummary> {
    let layers = bounds.min.y..=bounds.max.y;

    if threads <= 1 {
        return Ok(layers
            .map(|y| sweep_layer(resolver, bounds, y))
            .fold(SweepSummary::default(), Add::add));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build sweep thread pool")?;

    Ok(pool.install(|| {
        layers
            .into_par_iter()
            .map(|y| sweep_layer(resolver, bounds, y))
            .reduce(SweepSummary::default, Add::add)
    }))
}

fn sweep_layer(resolver: &BlockResolver, bounds: &ScanBounds, y: i64) -> SweepSummary {
    let mut summary = SweepSummary::default();
    for x in bounds.min.x..=bounds.max.x {
        for z in bounds.min.z..=bounds.max.z {
            summary = summary + visit(resolver, WorldPos::new(x, y, z));
        }
    }
    summary
}

fn visit(resolver: &BlockResolver, pos: WorldPos) -> SweepSummary {
    let mut summary = SweepSummary { blocks: 1, ..Default::default() };

    match resolver.resolve_block(pos) {
        Ok(lookup) => match lookup.chunk {
            ChunkLookup::Present(chunk) => {
                log::trace!(
                    "Block {} in {} chunk {}: {} NBT bytes",
                    pos,
                    chunk.region.filename(),
                    chunk.slot,
                    chunk.nbt.len()
                );
                summary.present = 1;
            }
            ChunkLookup::Absent { region, slot } => {
                log::warn!(
                    "Chunk {} could not be found in {} for x={},z={}",
                    slot,
                    region.filename(),
                    pos.x,
                    pos.z
                );
                summary.absent = 1;
            }
        },
        Err(RegionError::RegionFileNotFound { path, .. }) => {
            log::warn!("{} not found for block {}", path.display(), pos);
            summary.errors = 1;
        }
        Err(e) => {
            log::error!(
                "Block {} ({} chunk {}): {} [{}]",
                pos,
                pos.region().filename(),
                pos.slot(),
                e,
                e.kind()
            );
            summary.errors = 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcregion_world::ResolverConfig;
    use std::path::Path;

    fn write_region(dir: &Path, name: &str, slot_x: u8, slot_z: u8) {
        let mut file = vec![0u8; 4096 * 3];
        let at = (slot_z as usize * 32 + slot_x as usize) * 4;
        file[at..at + 4].copy_from_slice(&[0, 0, 2, 1]);
        file[8192..8196].copy_from_slice(&4u32.to_be_bytes());
        file[8196] = mcregion_anvil::compression::NONE;
        file[8197..8200].copy_from_slice(b"nbt");
        std::fs::write(dir.join(name), file).unwrap();
    }

    fn resolver_for(dir: &Path) -> BlockResolver {
        let config = ResolverConfig {
            world_dir: dir.to_path_buf(),
            ..ResolverConfig::default()
        };
        BlockResolver::from_config(&config, None)
    }

    #[test]
    fn test_sweep_counts_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        // Chunk (0,0) present, chunk (1,0) absent, region r.-1.0 missing.
        write_region(dir.path(), "r.0.0.mca", 0, 0);

        let resolver = resolver_for(dir.path());
        let bounds = ScanBounds::new(WorldPos::new(-2, 0, 0), WorldPos::new(17, 1, 0));
        let summary = sweep(&resolver, &bounds, 1).unwrap();

        assert_eq!(summary.blocks, 40);
        assert_eq!(summary.present, 32); // x 0..=15, two layers
        assert_eq!(summary.absent, 4); // x 16, 17
        assert_eq!(summary.errors, 4); // x -2, -1
    }

    #[test]
    fn test_parallel_sweep_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        write_region(dir.path(), "r.0.0.mca", 0, 0);
        write_region(dir.path(), "r.-1.0.mca", 31, 0);

        let bounds = ScanBounds::new(WorldPos::new(-20, -4, 0), WorldPos::new(20, 4, 3));
        let sequential = sweep(&resolver_for(dir.path()), &bounds, 1).unwrap();
        let resolver = resolver_for(dir.path());
        let parallel = sweep(&resolver, &bounds, 4).unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(parallel.errors, 0);
        assert_eq!(resolver.cache().len(), 2);
    }
}
