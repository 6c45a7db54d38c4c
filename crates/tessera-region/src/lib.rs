//! Region discovery: breadth-first walks over the tile graph from spawn
//! markers, followed by a sweep that picks up every tile the walk missed.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use hashbrown::HashSet;
use serde::Deserialize;
use tessera_tiles::{HintKind, TileKey, TilePos, TileStore};

/// How spawn seeds map onto reachable regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedGrouping {
    /// One BFS per seed not already reached; disconnected spawn areas get
    /// their own regions.
    #[default]
    PerSeed,
    /// All seeds share one queue and produce a single region.
    Merged,
}

/// How tiles missed by the reachable pass are grouped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolatedGrouping {
    /// Every leftover tile goes into one region, in ascending key order.
    #[default]
    Flat,
    /// Leftover tiles are split into 6-connected components.
    Components,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExploreOptions {
    pub seed_grouping: SeedGrouping,
    pub isolated_grouping: IsolatedGrouping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionKind {
    Reachable,
    Isolated,
}

#[derive(Clone, Debug)]
pub struct Region {
    pub id: usize,
    pub kind: RegionKind,
    /// Tiles in discovery order.
    pub tiles: Vec<TilePos>,
}

impl Region {
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedSource {
    SpawnHints,
    /// No spawn hints; the first empty-geometry tile stood in.
    EmptyTileFallback,
    None,
}

#[derive(Clone, Debug)]
pub struct Seeds {
    pub positions: Vec<TilePos>,
    pub source: SeedSource,
}

/// Ordered regions, reachable first and isolated last. Together they cover
/// every tile in the store exactly once.
#[derive(Clone, Debug)]
pub struct Exploration {
    regions: Vec<Region>,
    seeds: Seeds,
}

impl Exploration {
    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[inline]
    pub fn seeds(&self) -> &Seeds {
        &self.seeds
    }

    /// Every visited tile, region by region.
    pub fn traversal(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.regions.iter().flat_map(|r| r.tiles.iter().copied())
    }

    pub fn visited_count(&self) -> usize {
        self.regions.iter().map(Region::len).sum()
    }

    pub fn reachable_count(&self) -> usize {
        self.count_kind(RegionKind::Reachable)
    }

    pub fn isolated_count(&self) -> usize {
        self.count_kind(RegionKind::Isolated)
    }

    fn count_kind(&self, kind: RegionKind) -> usize {
        self.regions
            .iter()
            .filter(|r| r.kind == kind)
            .map(Region::len)
            .sum()
    }
}

pub struct RegionExplorer<'a> {
    store: &'a TileStore,
    options: ExploreOptions,
}

impl<'a> RegionExplorer<'a> {
    pub fn new(store: &'a TileStore, options: ExploreOptions) -> Self {
        Self { store, options }
    }

    /// Spawn-hinted tiles (deduplicated, registration order), or the first
    /// empty tile in y/z/x scan order when there are no spawn hints.
    pub fn resolve_seeds(&self) -> Seeds {
        let spawns = self.store.hints_of_type(HintKind::Spawn);
        if !spawns.is_empty() {
            let mut seen: HashSet<TileKey> = HashSet::new();
            let mut positions = Vec::new();
            for h in spawns {
                if !self.exists(h.pos) {
                    log::debug!(target: "region", "spawn hint at {} has no tile; skipped", h.pos);
                    continue;
                }
                if seen.insert(h.key()) {
                    positions.push(h.pos);
                }
            }
            return Seeds {
                positions,
                source: SeedSource::SpawnHints,
            };
        }
        let fallback = self
            .store
            .tiles()
            .filter(|t| t.geometry.is_empty())
            .map(|t| t.pos)
            .min_by_key(|p| p.scan_order());
        match fallback {
            Some(p) => Seeds {
                positions: vec![p],
                source: SeedSource::EmptyTileFallback,
            },
            None => Seeds {
                positions: Vec::new(),
                source: SeedSource::None,
            },
        }
    }

    pub fn explore(&self) -> Exploration {
        let seeds = self.resolve_seeds();
        let mut visited: HashSet<TileKey> = HashSet::with_capacity(self.store.len());
        let mut regions: Vec<Region> = Vec::new();

        match self.options.seed_grouping {
            SeedGrouping::Merged => {
                let tiles = self.flood(&seeds.positions, &mut visited);
                push_region(&mut regions, RegionKind::Reachable, tiles);
            }
            SeedGrouping::PerSeed => {
                for &seed in &seeds.positions {
                    let tiles = self.flood(&[seed], &mut visited);
                    push_region(&mut regions, RegionKind::Reachable, tiles);
                }
            }
        }

        let mut leftovers: Vec<TilePos> = self
            .store
            .tiles()
            .map(|t| t.pos)
            .filter(|p| !visited.contains(&p.key()))
            .collect();
        leftovers.sort_unstable_by_key(|p| p.key());

        match self.options.isolated_grouping {
            IsolatedGrouping::Flat => {
                for p in &leftovers {
                    visited.insert(p.key());
                }
                push_region(&mut regions, RegionKind::Isolated, leftovers);
            }
            IsolatedGrouping::Components => {
                for p in leftovers {
                    if visited.contains(&p.key()) {
                        continue;
                    }
                    let tiles = self.flood(&[p], &mut visited);
                    push_region(&mut regions, RegionKind::Isolated, tiles);
                }
            }
        }

        debug_assert_eq!(visited.len(), self.store.len());
        for r in &regions {
            log::debug!(
                target: "region",
                "region {} {:?}: {} tiles",
                r.id,
                r.kind,
                r.len()
            );
        }
        Exploration { regions, seeds }
    }

    /// Packed keys alias outside the encodable range, so a neighbor only
    /// counts if the stored tile really sits at `pos`.
    #[inline]
    fn exists(&self, pos: TilePos) -> bool {
        self.store.get_pos(pos).is_some_and(|t| t.pos == pos)
    }

    fn flood(&self, seeds: &[TilePos], visited: &mut HashSet<TileKey>) -> Vec<TilePos> {
        let mut queue: VecDeque<TilePos> = VecDeque::new();
        for &s in seeds {
            if visited.insert(s.key()) {
                queue.push_back(s);
            }
        }
        let mut out = Vec::new();
        while let Some(p) = queue.pop_front() {
            out.push(p);
            for n in p.face_neighbors() {
                if self.exists(n) && visited.insert(n.key()) {
                    queue.push_back(n);
                }
            }
        }
        out
    }
}

fn push_region(regions: &mut Vec<Region>, kind: RegionKind, tiles: Vec<TilePos>) {
    if tiles.is_empty() {
        return;
    }
    let id = regions.len();
    regions.push(Region { id, kind, tiles });
}
