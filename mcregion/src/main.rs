//! mcregion: resolve a volume of world blocks to their chunk data in Anvil region files.

mod bounds;
mod sweep;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use mcregion_cache::EvictionPolicy;
use mcregion_metrics::ScanMetrics;
use mcregion_world::{BlockResolver, ResolverConfig};

use crate::bounds::{ScanBounds, Viewer};

#[derive(Parser)]
#[command(
    name = "mcregion",
    about = "Extract chunk data for a block volume from Minecraft region files",
    after_help = "Example:\n  mcregion 1,1,1 9,9,9 5,5,5,0"
)]
pub struct Args {
    /// Comma-separated X,Y,Z coordinates of where to start extracting world data
    #[arg(value_parser = bounds::parse_xyz, allow_hyphen_values = true)]
    pub start: mcregion_anvil::WorldPos,

    /// Comma-separated X,Y,Z coordinates of where to finish extracting world data
    #[arg(value_parser = bounds::parse_xyz, allow_hyphen_values = true)]
    pub end: mcregion_anvil::WorldPos,

    /// Comma-separated X,Y,Z viewer coordinates plus direction (0-360 degrees)
    #[arg(value_parser = bounds::parse_viewer, allow_hyphen_values = true)]
    pub viewer: Viewer,

    /// Directory containing r.<x>.<z>.mca files
    #[arg(short, long, env = "MCREGION_WORLD_DIR", default_value = ".")]
    pub world_dir: PathBuf,

    /// Maximum number of region files held in memory
    #[arg(long, env = "MCREGION_CACHE_SIZE", default_value = "4")]
    pub cache_size: usize,

    /// What to do when the cache is full: "bypass" (stop caching) or "lru"
    #[arg(long, env = "MCREGION_EVICTION", default_value = "bypass")]
    pub eviction: EvictionPolicy,

    /// Worker threads for the sweep (1 = sequential)
    #[arg(short, long, env = "MCREGION_THREADS", default_value = "1")]
    pub threads: usize,

    /// Print a scan report when finished
    #[arg(long)]
    pub report: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let bounds = ScanBounds::new(args.start, args.end);
    log::debug!("Viewer at {} facing {} degrees", args.viewer.pos, args.viewer.direction);
    if !bounds.contains(args.viewer.pos) {
        log::warn!(
            "Viewer {} is not within the bounding cube {} - {}",
            args.viewer.pos,
            bounds.min,
            bounds.max
        );
    }

    let config = ResolverConfig {
        world_dir: args.world_dir,
        cache_capacity: args.cache_size,
        eviction: args.eviction,
    };
    let metrics = Arc::new(ScanMetrics::new());
    let resolver = BlockResolver::from_config(&config, Some(metrics.clone()));

    log::info!(
        "Scanning {} blocks from {} to {} in {:?} (cache {} files, {} eviction, {} threads)",
        bounds.volume(),
        bounds.min,
        bounds.max,
        config.world_dir,
        resolver.cache().capacity(),
        resolver.cache().policy(),
        args.threads.max(1)
    );

    let summary = sweep::sweep(&resolver, &bounds, args.threads)?;

    log::info!(
        "Scanned {} blocks: {} present, {} absent, {} errors",
        summary.blocks,
        summary.present,
        summary.absent,
        summary.errors
    );

    if args.report {
        println!("{}", metrics.generate_report());
    }

    Ok(())
}
