use hashbrown::HashMap;

use crate::hint::{Hint, HintBucket, HintKind};
use crate::key::{KeyRangeError, TileKey, TilePos};
use crate::tile::Tile;

#[derive(Default, Debug, Clone, Copy)]
pub struct TileStoreStats {
    pub tiles: usize,
    pub solid_tiles: usize,
    pub hints: usize,
    pub hint_kinds: usize,
}

/// Sparse map from packed coordinate key to tile, plus the hint registry.
///
/// Append-only: tiles are created by [`TileStore::touch`] or
/// [`TileStore::insert`] and live until the store is dropped. Coordinates must
/// lie within `AXIS_MIN..=AXIS_MAX` on every axis; see [`TileStore::validate_range`].
#[derive(Debug)]
pub struct TileStore {
    tile_edge: f32,
    tiles: HashMap<TileKey, Tile>,
    hints: HashMap<HintKind, HintBucket>,
}

impl TileStore {
    pub fn new(tile_edge: f32) -> Self {
        Self::with_capacity(tile_edge, 0)
    }

    pub fn with_capacity(tile_edge: f32, capacity: usize) -> Self {
        debug_assert!(tile_edge > 0.0);
        Self {
            tile_edge,
            tiles: HashMap::with_capacity(capacity),
            hints: HashMap::new(),
        }
    }

    #[inline]
    pub fn tile_edge(&self) -> f32 {
        self.tile_edge
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&Tile> {
        self.tiles.get(&TileKey::encode(x, y, z))
    }

    #[inline]
    pub fn get_pos(&self, pos: TilePos) -> Option<&Tile> {
        self.get(pos.x, pos.y, pos.z)
    }

    #[inline]
    pub fn contains(&self, pos: TilePos) -> bool {
        self.tiles.contains_key(&pos.key())
    }

    /// Returns the tile at `(x, y, z)`, creating an empty one there first if absent.
    pub fn touch(&mut self, x: i32, y: i32, z: i32) -> &mut Tile {
        let edge = self.tile_edge;
        self.tiles
            .entry(TileKey::encode(x, y, z))
            .or_insert_with(|| Tile::empty(TilePos::new(x, y, z), edge))
    }

    /// Stores `tile` at its own position, returning the tile it replaced.
    pub fn insert(&mut self, tile: Tile) -> Option<Tile> {
        self.tiles.insert(tile.key(), tile)
    }

    /// Unordered snapshot of every stored tile.
    pub fn all_tiles(&self) -> Vec<Tile> {
        self.tiles.values().copied().collect()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn register_hint(&mut self, hint: Hint) {
        log::trace!(target: "tiles", "hint {:?} at {}", hint.kind(), hint.pos);
        self.hints.entry(hint.kind()).or_default().push(hint);
    }

    /// Every hint of `kind`, grouped by tile in first-annotated order.
    pub fn hints_of_type(&self, kind: HintKind) -> Vec<&Hint> {
        self.hints
            .get(&kind)
            .map(|b| b.iter().collect())
            .unwrap_or_default()
    }

    pub fn hints_at(&self, x: i32, y: i32, z: i32) -> Vec<&Hint> {
        let key = TileKey::encode(x, y, z);
        let mut kinds: Vec<&HintKind> = self.hints.keys().collect();
        kinds.sort();
        kinds
            .into_iter()
            .filter_map(|k| self.hints.get(k))
            .flat_map(|b| b.at(key).iter())
            .collect()
    }

    pub fn hint_count(&self) -> usize {
        self.hints.values().map(HintBucket::len).sum()
    }

    /// Inclusive min/max tile coordinates over all tiles, or `None` when empty.
    pub fn tile_bounds(&self) -> Option<(TilePos, TilePos)> {
        let mut it = self.tiles.values().map(|t| t.pos);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Checks that every stored tile and hint lies inside the encodable range.
    ///
    /// Out-of-range positions alias other keys when packed, so this walks the
    /// stored positions rather than the keys.
    pub fn validate_range(&self) -> Result<(), KeyRangeError> {
        for t in self.tiles.values() {
            TileKey::checked(t.pos.x, t.pos.y, t.pos.z)?;
        }
        for h in self.hints.values().flat_map(HintBucket::iter) {
            TileKey::checked(h.pos.x, h.pos.y, h.pos.z)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> TileStoreStats {
        TileStoreStats {
            tiles: self.tiles.len(),
            solid_tiles: self.tiles.values().filter(|t| t.is_solid()).count(),
            hints: self.hint_count(),
            hint_kinds: self.hints.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Geometry;
    use tessera_geom::Vec3;

    #[test]
    fn touch_creates_empty_tile_once() {
        let mut store = TileStore::new(2.0);
        assert!(store.get(1, 2, 3).is_none());
        let t = store.touch(1, 2, 3);
        assert_eq!(t.geometry, Geometry::Empty);
        assert_eq!(t.world, Vec3::new(2.0, 4.0, 6.0));
        t.geometry = Geometry::Full;
        assert_eq!(store.len(), 1);
        // Second touch returns the existing tile untouched.
        assert_eq!(store.touch(1, 2, 3).geometry, Geometry::Full);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn all_tiles_snapshots_every_stored_tile() {
        let mut store = TileStore::new(1.0);
        store.touch(0, 0, 0);
        store.touch(-3, 7, 2).geometry = Geometry::Full;
        store.insert(Tile::new(TilePos::new(5, 1, -1), 1.0, Geometry::HalfLower));
        // overwrite keeps one entry per position
        store.insert(Tile::new(TilePos::new(0, 0, 0), 1.0, Geometry::Full));

        let mut snap = store.all_tiles();
        assert_eq!(snap.len(), 3);
        snap.sort_by_key(|t| t.pos.key());
        for t in &snap {
            assert_eq!(store.get_pos(t.pos), Some(t));
        }
        assert_eq!(snap.iter().filter(|t| t.is_solid()).count(), 3);
        assert!(snap.iter().any(|t| t.pos == TilePos::new(-3, 7, 2)));

        // the snapshot is detached from later edits
        store.touch(9, 9, 9);
        assert_eq!(snap.len(), 3);
        assert_eq!(store.all_tiles().len(), 4);
    }

    #[test]
    fn get_has_no_side_effects() {
        let store = TileStore::new(1.0);
        assert!(store.get(0, 0, 0).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn hints_group_by_kind_then_tile() {
        let mut store = TileStore::new(1.0);
        let a = TilePos::new(0, 0, 0);
        let b = TilePos::new(4, 0, 0);
        store.register_hint(Hint::spawn(b, 0));
        store.register_hint(Hint::light(a, [255, 200, 80], 12));
        store.register_hint(Hint::spawn(a, 1));
        store.register_hint(Hint::spawn(b, 2));

        let spawns = store.hints_of_type(HintKind::Spawn);
        let order: Vec<TilePos> = spawns.iter().map(|h| h.pos).collect();
        assert_eq!(order, vec![b, b, a]);
        assert_eq!(store.hints_of_type(HintKind::Light).len(), 1);
        assert!(store.hints_of_type(HintKind::Marker).is_empty());
        assert_eq!(store.hints_at(0, 0, 0).len(), 2);
        assert_eq!(store.hint_count(), 4);
    }

    #[test]
    fn bounds_cover_negative_coordinates() {
        let mut store = TileStore::new(1.0);
        assert!(store.tile_bounds().is_none());
        store.touch(-5, 2, 9);
        store.touch(3, -1, 0);
        let (lo, hi) = store.tile_bounds().unwrap();
        assert_eq!(lo, TilePos::new(-5, -1, 0));
        assert_eq!(hi, TilePos::new(3, 2, 9));
    }

    #[test]
    fn validate_range_flags_unencodable_tiles() {
        let mut store = TileStore::new(1.0);
        store.touch(0, 0, 0);
        assert!(store.validate_range().is_ok());
        store.insert(Tile::new(TilePos::new(0, 2_000_000, 0), 1.0, Geometry::Full));
        assert!(store.validate_range().is_err());
    }
}
