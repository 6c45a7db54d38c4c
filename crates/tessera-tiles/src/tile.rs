use serde::{Deserialize, Serialize};
use tessera_geom::Vec3;

use crate::key::{TileKey, TilePos};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    #[default]
    Empty,
    Full,
    HalfLower,
    HalfUpper,
    Slope,
    SlopeInnerCorner,
    SlopeOuterCorner,
}

impl Geometry {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Geometry::Empty)
    }

    #[inline]
    pub fn is_sloped(self) -> bool {
        matches!(
            self,
            Geometry::Slope | Geometry::SlopeInnerCorner | Geometry::SlopeOuterCorner
        )
    }
}

/// What occupies the non-solid part of a tile. Independent of geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
    #[default]
    Air,
    Water,
    Lava,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    /// Unit step in the xz plane this orientation faces; north is -z.
    pub fn step(self) -> (i32, i32) {
        match self {
            Orientation::North => (0, -1),
            Orientation::East => (1, 0),
            Orientation::South => (0, 1),
            Orientation::West => (-1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u16);

/// One unit cube of world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub pos: TilePos,
    /// `pos` scaled by the owning store's tile edge.
    pub world: Vec3,
    pub geometry: Geometry,
    pub fill: Fill,
    /// Only meaningful for sloped geometry.
    pub orientation: Orientation,
    pub material: MaterialId,
}

impl Tile {
    pub fn empty(pos: TilePos, tile_edge: f32) -> Self {
        Self {
            pos,
            world: Vec3::new(
                pos.x as f32 * tile_edge,
                pos.y as f32 * tile_edge,
                pos.z as f32 * tile_edge,
            ),
            geometry: Geometry::Empty,
            fill: Fill::Air,
            orientation: Orientation::North,
            material: MaterialId::default(),
        }
    }

    pub fn new(pos: TilePos, tile_edge: f32, geometry: Geometry) -> Self {
        Self {
            geometry,
            ..Self::empty(pos, tile_edge)
        }
    }

    #[inline]
    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    #[inline]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[inline]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = material;
        self
    }

    #[inline]
    pub fn key(&self) -> TileKey {
        self.pos.key()
    }

    /// Whether this tile counts toward a chunk's solid content.
    #[inline]
    pub fn is_solid(&self) -> bool {
        !self.geometry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_steps_cancel_in_pairs() {
        let sum = Orientation::ALL.iter().fold((0, 0), |(x, z), o| {
            let (dx, dz) = o.step();
            (x + dx, z + dz)
        });
        assert_eq!(sum, (0, 0));
        assert_eq!(Orientation::North.step(), (0, -1));
    }

    #[test]
    fn world_position_scales_by_edge() {
        let t = Tile::empty(TilePos::new(2, -3, 0), 0.5);
        assert_eq!(t.world, Vec3::new(1.0, -1.5, 0.0));
        assert!(!t.is_solid());
    }

    #[test]
    fn fill_does_not_make_a_tile_solid() {
        let water = Tile::empty(TilePos::default(), 1.0).with_fill(Fill::Water);
        assert!(!water.is_solid());
        let ramp = Tile::new(TilePos::default(), 1.0, Geometry::Slope)
            .with_orientation(Orientation::West);
        assert!(ramp.is_solid());
        assert!(ramp.geometry.is_sloped());
    }
}
