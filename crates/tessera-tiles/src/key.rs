use serde::{Deserialize, Serialize};
use std::fmt;

/// Bits reserved per axis in a packed key.
pub const AXIS_BITS: u32 = 21;
pub const AXIS_MIN: i32 = -(1 << (AXIS_BITS - 1));
pub const AXIS_MAX: i32 = (1 << (AXIS_BITS - 1)) - 1;

const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;
const SIGN_SHIFT: u32 = 64 - AXIS_BITS;

/// Integer tile coordinates (tile units, not world units).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// The six face-adjacent positions (±1 on exactly one axis).
    #[inline]
    pub fn face_neighbors(self) -> [TilePos; 6] {
        [
            self.offset(1, 0, 0),
            self.offset(-1, 0, 0),
            self.offset(0, 1, 0),
            self.offset(0, -1, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
        ]
    }

    #[inline]
    pub fn key(self) -> TileKey {
        TileKey::encode(self.x, self.y, self.z)
    }

    /// Ordering key used wherever "first tile" must be deterministic: y, then z, then x.
    #[inline]
    pub fn scan_order(self) -> (i32, i32, i32) {
        (self.y, self.z, self.x)
    }

    #[inline]
    pub fn min(self, other: TilePos) -> TilePos {
        TilePos::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    #[inline]
    pub fn max(self, other: TilePos) -> TilePos {
        TilePos::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl From<(i32, i32, i32)> for TilePos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<TilePos> for (i32, i32, i32) {
    fn from(value: TilePos) -> Self {
        (value.x, value.y, value.z)
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyRangeError {
    #[error("{axis} coordinate {value} outside encodable range {}..={}", AXIS_MIN, AXIS_MAX)]
    OutOfRange { axis: Axis, value: i32 },
}

/// 64-bit packed coordinate: X in bits 42..63, Y in 21..42, Z in 0..21.
///
/// Each axis is masked to [`AXIS_BITS`] bits, so the packing is injective only
/// for coordinates in `AXIS_MIN..=AXIS_MAX`. [`TileKey::encode`] does not check;
/// callers validate extents up front with [`TileKey::checked`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey(pub u64);

impl TileKey {
    #[inline]
    pub fn encode(x: i32, y: i32, z: i32) -> Self {
        let px = (x as u64) & AXIS_MASK;
        let py = (y as u64) & AXIS_MASK;
        let pz = (z as u64) & AXIS_MASK;
        TileKey((px << (2 * AXIS_BITS)) | (py << AXIS_BITS) | pz)
    }

    pub fn checked(x: i32, y: i32, z: i32) -> Result<Self, KeyRangeError> {
        check_axis(Axis::X, x)?;
        check_axis(Axis::Y, y)?;
        check_axis(Axis::Z, z)?;
        Ok(Self::encode(x, y, z))
    }

    /// Sign-extends each 21-bit field back into a coordinate triple.
    #[inline]
    pub fn decode(self) -> TilePos {
        let field = |shift: u32| -> i32 {
            let raw = (self.0 >> shift) & AXIS_MASK;
            (((raw << SIGN_SHIFT) as i64) >> SIGN_SHIFT) as i32
        };
        TilePos::new(field(2 * AXIS_BITS), field(AXIS_BITS), field(0))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[inline]
fn check_axis(axis: Axis, value: i32) -> Result<(), KeyRangeError> {
    if (AXIS_MIN..=AXIS_MAX).contains(&value) {
        Ok(())
    } else {
        Err(KeyRangeError::OutOfRange { axis, value })
    }
}
