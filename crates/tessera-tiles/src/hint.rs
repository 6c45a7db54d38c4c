use hashbrown::HashMap;

use crate::key::{TileKey, TilePos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HintKind {
    Spawn,
    Light,
    Marker,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HintData {
    Spawn { team: u8 },
    Light { color: [u8; 3], intensity: u8 },
    Marker { label: String },
}

/// Side-channel annotation attached to the tile at `pos`.
#[derive(Clone, Debug, PartialEq)]
pub struct Hint {
    pub pos: TilePos,
    pub data: HintData,
}

impl Hint {
    pub fn spawn(pos: TilePos, team: u8) -> Self {
        Self {
            pos,
            data: HintData::Spawn { team },
        }
    }

    pub fn light(pos: TilePos, color: [u8; 3], intensity: u8) -> Self {
        Self {
            pos,
            data: HintData::Light { color, intensity },
        }
    }

    pub fn marker(pos: TilePos, label: impl Into<String>) -> Self {
        Self {
            pos,
            data: HintData::Marker {
                label: label.into(),
            },
        }
    }

    #[inline]
    pub fn kind(&self) -> HintKind {
        match self.data {
            HintData::Spawn { .. } => HintKind::Spawn,
            HintData::Light { .. } => HintKind::Light,
            HintData::Marker { .. } => HintKind::Marker,
        }
    }

    #[inline]
    pub fn key(&self) -> TileKey {
        self.pos.key()
    }
}

/// Hints of a single kind, grouped by tile key. Keys iterate in the order
/// they were first annotated.
#[derive(Default, Debug)]
pub(crate) struct HintBucket {
    by_key: HashMap<TileKey, Vec<Hint>>,
    order: Vec<TileKey>,
}

impl HintBucket {
    pub(crate) fn push(&mut self, hint: Hint) {
        let key = hint.key();
        if !self.by_key.contains_key(&key) {
            self.order.push(key);
        }
        self.by_key.entry(key).or_default().push(hint);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Hint> {
        self.order
            .iter()
            .filter_map(|k| self.by_key.get(k))
            .flat_map(|v| v.iter())
    }

    pub(crate) fn at(&self, key: TileKey) -> &[Hint] {
        self.by_key.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }
}
