use hashbrown::HashMap;
use serde::Deserialize;
use tessera_chunk::{CHUNK_EDGE, Chunk, ChunkCoord};
use tessera_geom::{Aabb, Vec3};
use tessera_region::Exploration;
use tessera_tiles::{Tile, TileKey, TilePos, TileStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartitionOptions {
    /// Chunk edge in tiles.
    pub chunk_edge: usize,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            chunk_edge: CHUNK_EDGE,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionStats {
    pub placed: usize,
    pub failed: usize,
    pub chunks_created: usize,
    pub populated_chunks: usize,
    pub solid_tiles: usize,
}

impl PartitionStats {
    /// No tile was dropped during placement.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Buckets tiles into lazily created cubic chunks keyed by packed chunk
/// coordinates. Chunk `c` covers tiles `c * edge ..= c * edge + edge - 1` on
/// each axis (floored division, no shift by the world minimum).
#[derive(Debug)]
pub struct ChunkPartitioner {
    edge: usize,
    tile_edge: f32,
    chunks: HashMap<TileKey, Chunk>,
    bounds: Option<(TilePos, TilePos)>,
    placed: usize,
    failed: usize,
}

impl ChunkPartitioner {
    /// Empty partitioner for `store`; bounds are measured once here.
    pub fn new(store: &TileStore, options: PartitionOptions) -> Self {
        debug_assert!(options.chunk_edge > 0);
        Self {
            edge: options.chunk_edge,
            tile_edge: store.tile_edge(),
            chunks: HashMap::new(),
            bounds: store.tile_bounds(),
            placed: 0,
            failed: 0,
        }
    }

    /// Places tiles in traversal order: reachable regions first.
    pub fn from_exploration(
        store: &TileStore,
        exploration: &Exploration,
        options: PartitionOptions,
    ) -> Self {
        let mut p = Self::new(store, options);
        for pos in exploration.traversal() {
            match store.get_pos(pos) {
                Some(tile) => {
                    p.place_tile(tile);
                }
                None => {
                    log::warn!(target: "partition", "traversal names {} but store has no tile there", pos);
                    p.failed += 1;
                }
            }
        }
        p
    }

    /// Places every stored tile in store iteration order.
    pub fn from_store(store: &TileStore, options: PartitionOptions) -> Self {
        let mut p = Self::new(store, options);
        for tile in store.tiles() {
            p.place_tile(tile);
        }
        p
    }

    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    #[inline]
    pub fn tile_edge(&self) -> f32 {
        self.tile_edge
    }

    #[inline]
    pub fn world_to_chunk_coords(&self, x: i32, y: i32, z: i32) -> ChunkCoord {
        ChunkCoord::of_tile(x, y, z, self.edge)
    }

    /// Origin tile of chunk `coord`.
    #[inline]
    pub fn chunk_to_world_coords(&self, coord: ChunkCoord) -> TilePos {
        coord.origin(self.edge)
    }

    #[inline]
    pub fn chunk_world_offset(&self, coord: ChunkCoord) -> Vec3 {
        let o = coord.origin(self.edge);
        Vec3::new(o.x as f32, o.y as f32, o.z as f32) * self.tile_edge
    }

    /// Chunk containing a world-space point such as a player position.
    pub fn chunk_at_position(&self, position: Vec3) -> ChunkCoord {
        let tx = (position.x / self.tile_edge).floor() as i32;
        let ty = (position.y / self.tile_edge).floor() as i32;
        let tz = (position.z / self.tile_edge).floor() as i32;
        self.world_to_chunk_coords(tx, ty, tz)
    }

    /// Routes `tile` into its chunk, creating the chunk if needed. Returns
    /// false if the chunk refuses the tile; that indicates broken coordinate
    /// math, so it is logged and counted and the tile is dropped.
    pub fn place_tile(&mut self, tile: &Tile) -> bool {
        let coord = self.world_to_chunk_coords(tile.pos.x, tile.pos.y, tile.pos.z);
        let edge = self.edge;
        let chunk = self
            .chunks
            .entry(coord.key())
            .or_insert_with(|| Chunk::new(coord, edge));
        let ok = match chunk.world_to_local(tile.pos.x, tile.pos.y, tile.pos.z) {
            Some((lx, ly, lz)) => chunk.set_local(lx, ly, lz, *tile),
            None => false,
        };
        if ok {
            self.placed += 1;
        } else {
            self.failed += 1;
            log::warn!(
                target: "partition",
                "tile {} rejected by chunk {:?}; dropped",
                tile.pos,
                coord
            );
        }
        ok
    }

    #[inline]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord.key())
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks holding at least one solid tile, sorted by chunk coordinate.
    pub fn populated_chunks(&self) -> Vec<&Chunk> {
        let mut out: Vec<&Chunk> = self.chunks.values().filter(|c| c.has_content()).collect();
        out.sort_unstable_by_key(|c| c.coord());
        out
    }

    /// Populated chunks whose world-space box comes within `radius` of
    /// `position`, nearest first.
    pub fn chunks_near(&self, position: Vec3, radius: f32) -> Vec<&Chunk> {
        let r2 = radius * radius;
        let mut out: Vec<(f32, &Chunk)> = self
            .chunks
            .values()
            .filter(|c| c.has_content())
            .filter_map(|c| {
                let d2 = c.world_bounds(self.tile_edge).distance_sq_to_point(position);
                (d2 <= r2).then_some((d2, c))
            })
            .collect();
        out.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.coord().cmp(&b.1.coord())));
        out.into_iter().map(|(_, c)| c).collect()
    }

    /// Smallest tile coordinate on each axis across the store at construction.
    #[inline]
    pub fn min_coords(&self) -> Option<TilePos> {
        self.bounds.map(|(lo, _)| lo)
    }

    /// Largest tile coordinate on each axis across the store at construction.
    #[inline]
    pub fn max_coords(&self) -> Option<TilePos> {
        self.bounds.map(|(_, hi)| hi)
    }

    /// World-space box spanning every tile seen at construction.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let (lo, hi) = self.bounds?;
        let e = self.tile_edge;
        Some(Aabb::new(
            Vec3::new(lo.x as f32, lo.y as f32, lo.z as f32) * e,
            Vec3::new((hi.x + 1) as f32, (hi.y + 1) as f32, (hi.z + 1) as f32) * e,
        ))
    }

    pub fn stats(&self) -> PartitionStats {
        let populated = self.chunks.values().filter(|c| c.has_content());
        let (populated_chunks, solid_tiles) =
            populated.fold((0, 0), |(n, s), c| (n + 1, s + c.solid_count()));
        PartitionStats {
            placed: self.placed,
            failed: self.failed,
            chunks_created: self.chunks.len(),
            populated_chunks,
            solid_tiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_tiles::Geometry;

    fn store_with(tiles: &[(i32, i32, i32)]) -> TileStore {
        let mut store = TileStore::new(1.0);
        for &(x, y, z) in tiles {
            store.touch(x, y, z).geometry = Geometry::Full;
        }
        store
    }

    #[test]
    fn floor_mapping_at_chunk_boundaries() {
        let store = TileStore::new(1.0);
        let p = ChunkPartitioner::new(&store, PartitionOptions::default());
        assert_eq!(p.world_to_chunk_coords(15, 0, 0), ChunkCoord::new(0, 0, 0));
        assert_eq!(p.world_to_chunk_coords(16, 0, 0), ChunkCoord::new(1, 0, 0));
        assert_eq!(p.world_to_chunk_coords(-1, -1, -1), ChunkCoord::new(-1, -1, -1));
        assert_eq!(p.world_to_chunk_coords(-16, 0, -17), ChunkCoord::new(-1, 0, -2));
    }

    #[test]
    fn empty_tiles_create_chunks_without_content() {
        let mut store = TileStore::new(1.0);
        store.touch(40, 0, 0);
        let p = ChunkPartitioner::from_store(&store, PartitionOptions::default());
        assert_eq!(p.chunk_count(), 1);
        assert!(p.populated_chunks().is_empty());
        assert_eq!(p.stats().placed, 1);
    }

    #[test]
    fn negative_tiles_land_in_negative_chunks() {
        let store = store_with(&[(-1, 0, 0), (0, 0, 0)]);
        let p = ChunkPartitioner::from_store(&store, PartitionOptions::default());
        let coords: Vec<ChunkCoord> = p.populated_chunks().iter().map(|c| c.coord()).collect();
        assert_eq!(coords, vec![ChunkCoord::new(-1, 0, 0), ChunkCoord::new(0, 0, 0)]);
        let west = p.chunk(ChunkCoord::new(-1, 0, 0)).unwrap();
        assert!(west.get_local(15, 0, 0).is_some());
    }

    #[test]
    fn chunks_near_filters_by_box_distance() {
        let store = store_with(&[(0, 0, 0), (20, 0, 0), (40, 0, 0), (200, 0, 0)]);
        let p = ChunkPartitioner::from_store(&store, PartitionOptions::default());
        let near: Vec<ChunkCoord> = p
            .chunks_near(Vec3::new(20.0, 1.0, 1.0), 10.0)
            .iter()
            .map(|c| c.coord())
            .collect();
        // chunk 1 contains the point, chunk 0 ends 4 away, chunk 2 starts 12 away
        assert_eq!(near, vec![ChunkCoord::new(1, 0, 0), ChunkCoord::new(0, 0, 0)]);
    }

    #[test]
    fn bounds_and_offsets() {
        let mut store = TileStore::new(2.0);
        store.touch(-3, 0, 5).geometry = Geometry::Full;
        store.touch(17, 4, -2).geometry = Geometry::Full;
        let p = ChunkPartitioner::from_store(&store, PartitionOptions { chunk_edge: 8 });
        assert_eq!(p.min_coords(), Some(TilePos::new(-3, 0, -2)));
        assert_eq!(p.max_coords(), Some(TilePos::new(17, 4, 5)));
        let wb = p.world_bounds().unwrap();
        assert_eq!(wb.min, Vec3::new(-6.0, 0.0, -4.0));
        assert_eq!(wb.max, Vec3::new(36.0, 10.0, 12.0));
        let c = ChunkCoord::new(-1, 0, 2);
        assert_eq!(p.chunk_to_world_coords(c), TilePos::new(-8, 0, 16));
        assert_eq!(p.chunk_world_offset(c), Vec3::new(-16.0, 0.0, 32.0));
        assert_eq!(p.chunk_at_position(Vec3::new(-0.5, 3.0, 33.0)), c);
    }
}
