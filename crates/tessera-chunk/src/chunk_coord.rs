use serde::{Deserialize, Serialize};
use tessera_tiles::{TileKey, TilePos};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Chunk owning tile `(x, y, z)`. Floors toward negative infinity, so
    /// tile -1 lands in chunk -1 rather than chunk 0.
    #[inline]
    pub fn of_tile(x: i32, y: i32, z: i32, edge: usize) -> Self {
        let e = edge as i32;
        Self {
            cx: x.div_euclid(e),
            cy: y.div_euclid(e),
            cz: z.div_euclid(e),
        }
    }

    #[inline]
    pub fn of_pos(pos: TilePos, edge: usize) -> Self {
        Self::of_tile(pos.x, pos.y, pos.z, edge)
    }

    /// Tile coordinates of this chunk's (0, 0, 0) slot.
    #[inline]
    pub fn origin(self, edge: usize) -> TilePos {
        let e = edge as i32;
        TilePos::new(self.cx * e, self.cy * e, self.cz * e)
    }

    /// Packed map key; same 21-bit-per-axis layout as tile keys.
    #[inline]
    pub fn key(self) -> TileKey {
        TileKey::encode(self.cx, self.cy, self.cz)
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}
