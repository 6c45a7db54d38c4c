use tessera_geom::{Aabb, Vec3};
use tessera_tiles::{Tile, TilePos};

use crate::ChunkCoord;

/// Dense `edge³` array of tile slots plus solid-content bookkeeping.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    edge: usize,
    slots: Vec<Option<Tile>>,
    solid: usize,
    occupied: usize,
}

impl Chunk {
    pub fn new(coord: ChunkCoord, edge: usize) -> Self {
        debug_assert!(edge > 0);
        Self {
            coord,
            edge,
            slots: vec![None; edge * edge * edge],
            solid: 0,
            occupied: 0,
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.edge + z) * self.edge + x
    }

    #[inline]
    fn in_bounds(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.edge && y < self.edge && z < self.edge
    }

    /// Stores `tile` in slot `(lx, ly, lz)`. Returns false if any local
    /// coordinate is outside `0..edge`.
    pub fn set_local(&mut self, lx: usize, ly: usize, lz: usize, tile: Tile) -> bool {
        if !self.in_bounds(lx, ly, lz) {
            return false;
        }
        let i = self.idx(lx, ly, lz);
        let was_solid = self.slots[i].is_some_and(|t| t.is_solid());
        if self.slots[i].is_none() {
            self.occupied += 1;
        }
        match (was_solid, tile.is_solid()) {
            (false, true) => self.solid += 1,
            (true, false) => self.solid -= 1,
            _ => {}
        }
        self.slots[i] = Some(tile);
        true
    }

    #[inline]
    pub fn get_local(&self, lx: usize, ly: usize, lz: usize) -> Option<&Tile> {
        if !self.in_bounds(lx, ly, lz) {
            return None;
        }
        self.slots[self.idx(lx, ly, lz)].as_ref()
    }

    /// Local slot for tile coordinates `(x, y, z)`, or `None` when that tile
    /// belongs to a different chunk.
    pub fn world_to_local(&self, x: i32, y: i32, z: i32) -> Option<(usize, usize, usize)> {
        if ChunkCoord::of_tile(x, y, z, self.edge) != self.coord {
            return None;
        }
        let o = self.origin();
        Some((
            (x - o.x) as usize,
            (y - o.y) as usize,
            (z - o.z) as usize,
        ))
    }

    #[inline]
    pub fn local_to_world(&self, lx: usize, ly: usize, lz: usize) -> TilePos {
        self.origin().offset(lx as i32, ly as i32, lz as i32)
    }

    /// Routes `tile` through [`Chunk::world_to_local`] and stores it.
    pub fn place(&mut self, tile: Tile) -> bool {
        match self.world_to_local(tile.pos.x, tile.pos.y, tile.pos.z) {
            Some((lx, ly, lz)) => self.set_local(lx, ly, lz, tile),
            None => false,
        }
    }

    #[inline]
    pub fn has_content(&self) -> bool {
        self.solid > 0
    }

    #[inline]
    pub fn solid_count(&self) -> usize {
        self.solid
    }

    /// Slots holding any tile, solid or not.
    #[inline]
    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.solid as f32 / self.capacity() as f32
    }

    #[inline]
    pub fn origin(&self) -> TilePos {
        self.coord.origin(self.edge)
    }

    #[inline]
    pub fn world_offset(&self, tile_edge: f32) -> Vec3 {
        let o = self.origin();
        Vec3::new(o.x as f32, o.y as f32, o.z as f32) * tile_edge
    }

    pub fn world_bounds(&self, tile_edge: f32) -> Aabb {
        Aabb::from_origin_size(self.world_offset(tile_edge), self.edge as f32 * tile_edge)
    }

    /// Occupied slots with their local coordinates, in storage order.
    pub fn tiles(&self) -> impl Iterator<Item = ((usize, usize, usize), &Tile)> + '_ {
        let e = self.edge;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            let t = slot.as_ref()?;
            let x = i % e;
            let z = (i / e) % e;
            let y = i / (e * e);
            Some(((x, y, z), t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_tiles::Geometry;

    fn solid(x: i32, y: i32, z: i32) -> Tile {
        Tile::new(TilePos::new(x, y, z), 1.0, Geometry::Full)
    }

    fn air(x: i32, y: i32, z: i32) -> Tile {
        Tile::empty(TilePos::new(x, y, z), 1.0)
    }

    #[test]
    fn overwrite_with_empty_clears_content_of_sole_solid() {
        let mut c = Chunk::new(ChunkCoord::new(0, 0, 0), 16);
        assert!(c.set_local(3, 4, 5, solid(3, 4, 5)));
        assert!(c.has_content());
        assert!(c.set_local(3, 4, 5, air(3, 4, 5)));
        assert!(!c.has_content());
        assert_eq!(c.solid_count(), 0);
        assert_eq!(c.occupied_count(), 1);
    }

    #[test]
    fn overwrite_keeps_content_when_other_solids_remain() {
        let mut c = Chunk::new(ChunkCoord::new(0, 0, 0), 16);
        c.set_local(0, 0, 0, solid(0, 0, 0));
        c.set_local(1, 0, 0, solid(1, 0, 0));
        c.set_local(0, 0, 0, air(0, 0, 0));
        assert!(c.has_content());
        assert_eq!(c.solid_count(), 1);
    }

    #[test]
    fn solid_over_solid_does_not_double_count() {
        let mut c = Chunk::new(ChunkCoord::new(0, 0, 0), 4);
        c.set_local(1, 1, 1, solid(1, 1, 1));
        c.set_local(1, 1, 1, Tile::new(TilePos::new(1, 1, 1), 1.0, Geometry::HalfLower));
        assert_eq!(c.solid_count(), 1);
        assert!((c.load_factor() - 1.0 / 64.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_locals() {
        let mut c = Chunk::new(ChunkCoord::new(0, 0, 0), 16);
        assert!(!c.set_local(16, 0, 0, solid(16, 0, 0)));
        assert!(!c.set_local(0, 0, 99, solid(0, 0, 99)));
        assert!(c.get_local(16, 0, 0).is_none());
        assert_eq!(c.occupied_count(), 0);
    }

    #[test]
    fn world_to_local_refuses_foreign_tiles() {
        let c = Chunk::new(ChunkCoord::new(-1, 0, 0), 16);
        assert_eq!(c.world_to_local(-1, 0, 0), Some((15, 0, 0)));
        assert_eq!(c.world_to_local(-16, 15, 15), Some((0, 15, 15)));
        assert_eq!(c.world_to_local(0, 0, 0), None);
        assert_eq!(c.world_to_local(-17, 0, 0), None);
    }

    #[test]
    fn tiles_iterator_reports_local_coords() {
        let mut c = Chunk::new(ChunkCoord::new(1, 0, 0), 8);
        assert!(c.place(solid(9, 2, 7)));
        let seen: Vec<_> = c.tiles().map(|(l, t)| (l, t.pos)).collect();
        assert_eq!(seen, vec![((1, 2, 7), TilePos::new(9, 2, 7))]);
        assert_eq!(c.local_to_world(1, 2, 7), TilePos::new(9, 2, 7));
    }

    #[test]
    fn world_bounds_scale_with_tile_edge() {
        let c = Chunk::new(ChunkCoord::new(1, -1, 0), 16);
        let b = c.world_bounds(0.5);
        assert_eq!(b.min, Vec3::new(8.0, -8.0, 0.0));
        assert_eq!(b.max, Vec3::new(16.0, 0.0, 8.0));
    }
}
