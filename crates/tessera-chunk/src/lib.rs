//! Fixed-edge cubic chunks of tile slots.
#![forbid(unsafe_code)]

mod chunk;
mod chunk_coord;

pub use chunk::Chunk;
pub use chunk_coord::ChunkCoord;

/// Default chunk edge in tiles.
pub const CHUNK_EDGE: usize = 16;

/// Largest chunk edge accepted from configuration. Edges are narrowed to
/// `i32` for coordinate math and each chunk allocates `edge³` slots.
pub const MAX_CHUNK_EDGE: usize = 1 << 10;
