//! Sparse tile storage: packed coordinate keys, tile records, and hints.
#![forbid(unsafe_code)]

pub mod hint;
pub mod key;
pub mod store;
pub mod tile;

pub use hint::{Hint, HintData, HintKind};
pub use key::{AXIS_BITS, AXIS_MAX, AXIS_MIN, Axis, KeyRangeError, TileKey, TilePos};
pub use store::TileStore;
pub use tile::{Fill, Geometry, MaterialId, Orientation, Tile};
