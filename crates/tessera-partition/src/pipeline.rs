use std::time::{Duration, Instant};

use serde::Deserialize;
use tessera_region::{ExploreOptions, Exploration, RegionExplorer, SeedSource};
use tessera_tiles::{TilePos, TileStore};

use crate::partitioner::{ChunkPartitioner, PartitionOptions, PartitionStats};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub explore: ExploreOptions,
    pub partition: PartitionOptions,
}

/// A store together with everything derived from it by one build pass.
#[derive(Debug)]
pub struct OrganizedWorld {
    pub store: TileStore,
    pub exploration: Exploration,
    pub partitioner: ChunkPartitioner,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildReport {
    pub tiles: usize,
    pub regions: usize,
    pub reachable_tiles: usize,
    pub isolated_tiles: usize,
    pub seed_source: SeedSource,
    pub partition: PartitionStats,
    pub min: Option<TilePos>,
    pub max: Option<TilePos>,
    pub elapsed_ms: f64,
}

impl OrganizedWorld {
    pub fn report(&self) -> BuildReport {
        BuildReport {
            tiles: self.store.len(),
            regions: self.exploration.regions().len(),
            reachable_tiles: self.exploration.reachable_count(),
            isolated_tiles: self.exploration.isolated_count(),
            seed_source: self.exploration.seeds().source,
            partition: self.partitioner.stats(),
            min: self.partitioner.min_coords(),
            max: self.partitioner.max_coords(),
            elapsed_ms: self.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// Runs one build pass over `store`: region discovery, then chunk placement
/// in traversal order. Placement failures are counted, never fatal.
pub fn organize(store: TileStore, options: &BuildOptions) -> OrganizedWorld {
    let t0 = Instant::now();
    let exploration = RegionExplorer::new(&store, options.explore).explore();
    let t_explore = t0.elapsed();
    let partitioner = ChunkPartitioner::from_exploration(&store, &exploration, options.partition);
    let elapsed = t0.elapsed();

    let world = OrganizedWorld {
        store,
        exploration,
        partitioner,
        elapsed,
    };
    let r = world.report();
    log::info!(
        target: "partition",
        "organized {} tiles: {} regions ({} reachable, {} isolated, seeds={:?}), {} chunks ({} populated), placed={} failed={} in {:.2}ms (explore {:.2}ms)",
        r.tiles,
        r.regions,
        r.reachable_tiles,
        r.isolated_tiles,
        r.seed_source,
        r.partition.chunks_created,
        r.partition.populated_chunks,
        r.partition.placed,
        r.partition.failed,
        r.elapsed_ms,
        t_explore.as_secs_f64() * 1000.0
    );
    if let (Some(lo), Some(hi)) = (r.min, r.max) {
        log::debug!(target: "partition", "tile bounds {} .. {}", lo, hi);
    }
    if !r.partition.is_clean() {
        log::warn!(
            target: "partition",
            "{} tiles dropped during placement",
            r.partition.failed
        );
    }
    world
}
