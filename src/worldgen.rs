//! Demo tile producer: a noise heightfield with a walkable air layer on top,
//! optional flooded basins, and hollow vaults floating out of reach.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;
use tessera_tiles::{Fill, Geometry, Hint, MaterialId, Orientation, Tile, TilePos, TileStore};

pub const STONE: MaterialId = MaterialId(1);
pub const DIRT: MaterialId = MaterialId(2);
pub const GRASS: MaterialId = MaterialId(3);
pub const VAULT: MaterialId = MaterialId(4);

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub seed: i32,
    /// Columns along x; the terrain is centered on x = 0.
    pub size_x: i32,
    /// Columns along z; the terrain is centered on z = 0.
    pub size_z: i32,
    pub base_height: i32,
    pub amplitude: f32,
    pub frequency: f32,
    /// Basins below this level are filled with `sea_fill`.
    pub sea_level: i32,
    pub sea_fill: Fill,
    pub spawns: usize,
    pub vaults: usize,
    pub vault_size: i32,
    /// Gap in tiles between the highest air tile and the vault floors.
    pub vault_altitude: i32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            size_x: 96,
            size_z: 96,
            base_height: 12,
            amplitude: 6.0,
            frequency: 0.03,
            sea_level: 10,
            sea_fill: Fill::Water,
            spawns: 2,
            vaults: 3,
            vault_size: 5,
            vault_altitude: 8,
        }
    }
}

/// Upper bounds on generator inputs, keeping generation time and memory sane.
pub const MAX_COLUMNS_PER_AXIS: i32 = 4096;
pub const MAX_SPAWNS: usize = u8::MAX as usize + 1;
pub const MAX_VAULTS: usize = 256;
pub const MAX_VAULT_SIZE: i32 = 64;

impl DemoConfig {
    /// Inclusive tile extent this config can write to, for range validation.
    /// `None` when the bounds do not fit in `i32`.
    pub fn extent(&self) -> Option<(TilePos, TilePos)> {
        let x0 = -(self.size_x / 2);
        let z0 = -(self.size_z / 2);
        let n = self.vault_size.max(3);
        let amplitude = self.amplitude.abs().ceil();
        if !amplitude.is_finite() || amplitude > i32::MAX as f32 {
            return None;
        }
        let surface = self.base_height.checked_add(amplitude as i32)?.max(self.sea_level);
        let top = surface.checked_add(self.vault_altitude.max(1))?.checked_add(n)?;
        let hi_x = x0.checked_add(self.size_x)?.checked_add(n)?;
        let hi_z = z0.checked_add(self.size_z)?.checked_add(n)?;
        Some((TilePos::new(x0, 0, z0), TilePos::new(hi_x, top, hi_z)))
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoStats {
    pub columns: usize,
    pub solid: usize,
    pub air: usize,
    pub liquid: usize,
    pub vault_tiles: usize,
    pub spawns: usize,
}

pub fn generate(cfg: &DemoConfig, tile_edge: f32) -> (TileStore, DemoStats) {
    let mut noise = FastNoiseLite::with_seed(cfg.seed);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(cfg.frequency));

    let x0 = -(cfg.size_x / 2);
    let z0 = -(cfg.size_z / 2);
    let sx = cfg.size_x.max(0) as usize;
    let sz = cfg.size_z.max(0) as usize;

    let mut heights = vec![0i32; sx * sz];
    for dz in 0..sz {
        for dx in 0..sx {
            let wx = x0 + dx as i32;
            let wz = z0 + dz as i32;
            let n = noise.get_noise_2d(wx as f32, wz as f32);
            heights[dz * sx + dx] = (cfg.base_height + (n * cfg.amplitude).round() as i32).max(1);
        }
    }
    let height = |dx: i32, dz: i32| -> Option<i32> {
        if dx < 0 || dz < 0 || dx as usize >= sx || dz as usize >= sz {
            return None;
        }
        Some(heights[dz as usize * sx + dx as usize])
    };

    let per_column = cfg.base_height.max(1) as usize + 4;
    let reserve = sx.saturating_mul(sz).saturating_mul(per_column).min(1 << 22);
    let mut store = TileStore::with_capacity(tile_edge, reserve);
    let mut stats = DemoStats {
        columns: sx * sz,
        ..DemoStats::default()
    };
    let mut max_air_y = 0;

    for dz in 0..sz as i32 {
        for dx in 0..sx as i32 {
            let Some(h) = height(dx, dz) else { continue };
            let (wx, wz) = (x0 + dx, z0 + dz);
            for y in 0..h {
                let material = if y == h - 1 {
                    GRASS
                } else if y >= h - 3 {
                    DIRT
                } else {
                    STONE
                };
                let mut tile = Tile::new(TilePos::new(wx, y, wz), tile_edge, Geometry::Full)
                    .with_material(material);
                if y == h - 1 {
                    if let Some(facing) = downhill(&height, dx, dz, h) {
                        tile.geometry = Geometry::Slope;
                        tile.orientation = facing;
                    }
                }
                store.insert(tile);
                stats.solid += 1;
            }
            // Liquid up to sea level, then one walkable air layer.
            let mut y = h;
            while y < cfg.sea_level {
                store.touch(wx, y, wz).fill = cfg.sea_fill;
                stats.liquid += 1;
                y += 1;
            }
            store.touch(wx, y, wz);
            stats.air += 1;
            max_air_y = max_air_y.max(y);
        }
    }

    for i in 0..cfg.spawns {
        let dx = (sx * (i + 1) / (cfg.spawns + 1)) as i32;
        let dz = (sz / 2) as i32;
        let Some(h) = height(dx, dz) else { continue };
        let y = h.max(cfg.sea_level);
        let team = u8::try_from(i).unwrap_or(u8::MAX);
        store.register_hint(Hint::spawn(TilePos::new(x0 + dx, y, z0 + dz), team));
        stats.spawns += 1;
    }

    let floor = max_air_y + 1 + cfg.vault_altitude.max(1);
    for v in 0..cfg.vaults {
        let dx = (sx * (v + 1) / (cfg.vaults + 1)) as i32;
        let dz = (sz * (cfg.vaults - v) / (cfg.vaults + 1)) as i32;
        let origin = TilePos::new(x0 + dx, floor, z0 + dz);
        stats.vault_tiles += place_vault(&mut store, origin, cfg.vault_size.max(3), tile_edge);
        store.register_hint(Hint::marker(origin, format!("vault-{v}")));
    }

    log::info!(
        target: "worldgen",
        "demo world seed={} {}x{} columns: {} solid, {} liquid, {} air, {} vault tiles, {} spawns",
        cfg.seed,
        sx,
        sz,
        stats.solid,
        stats.liquid,
        stats.air,
        stats.vault_tiles,
        stats.spawns
    );
    (store, stats)
}

/// Hollow cube with an air interior and a light at its center.
fn place_vault(store: &mut TileStore, origin: TilePos, n: i32, tile_edge: f32) -> usize {
    let mut placed = 0;
    for y in 0..n {
        for z in 0..n {
            for x in 0..n {
                let pos = origin.offset(x, y, z);
                let shell = x == 0 || y == 0 || z == 0 || x == n - 1 || y == n - 1 || z == n - 1;
                let tile = if shell {
                    Tile::new(pos, tile_edge, Geometry::Full).with_material(VAULT)
                } else {
                    Tile::empty(pos, tile_edge)
                };
                store.insert(tile);
                placed += 1;
            }
        }
    }
    let c = n / 2;
    store.register_hint(Hint::light(origin.offset(c, c, c), [255, 196, 120], 14));
    placed
}

/// Direction of a neighbor column exactly one tile lower, if any.
fn downhill(height: &impl Fn(i32, i32) -> Option<i32>, dx: i32, dz: i32, h: i32) -> Option<Orientation> {
    Orientation::ALL.into_iter().find(|o| {
        let (ox, oz) = o.step();
        height(dx + ox, dz + oz) == Some(h - 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_partition::{BuildOptions, organize};
    use tessera_tiles::{HintData, HintKind};

    fn small() -> DemoConfig {
        DemoConfig {
            size_x: 24,
            size_z: 20,
            vaults: 2,
            vault_size: 4,
            ..DemoConfig::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let (a, sa) = generate(&small(), 1.0);
        let (b, sb) = generate(&small(), 1.0);
        assert_eq!(sa, sb);
        assert_eq!(a.len(), b.len());
        for t in a.tiles() {
            assert_eq!(b.get_pos(t.pos), Some(t));
        }
    }

    #[test]
    fn spawns_sit_on_existing_non_solid_tiles() {
        let (store, stats) = generate(&small(), 1.0);
        assert_eq!(stats.spawns, 2);
        for h in store.hints_of_type(HintKind::Spawn) {
            let t = store.get_pos(h.pos).expect("spawn tile exists");
            assert!(!t.is_solid());
        }
    }

    #[test]
    fn vaults_are_isolated_from_spawn() {
        let cfg = small();
        let (store, stats) = generate(&cfg, 1.0);
        assert_eq!(stats.vault_tiles, 2 * 4 * 4 * 4);
        let world = organize(store, &BuildOptions::default());
        let r = world.report();
        assert_eq!(r.isolated_tiles, stats.vault_tiles);
        assert_eq!(r.reachable_tiles + r.isolated_tiles, r.tiles);
        assert!(r.partition.is_clean());
    }

    #[test]
    fn spawn_teams_saturate_instead_of_wrapping() {
        let cfg = DemoConfig {
            spawns: 300,
            vaults: 0,
            ..small()
        };
        let (store, stats) = generate(&cfg, 1.0);
        assert_eq!(stats.spawns, 300);
        let teams: Vec<u8> = store
            .hints_of_type(HintKind::Spawn)
            .iter()
            .filter_map(|h| match h.data {
                HintData::Spawn { team } => Some(team),
                _ => None,
            })
            .collect();
        assert_eq!(teams.len(), 300);
        assert!(teams.contains(&u8::MAX));
        // team 0 never reappears from a wrapped counter
        assert_eq!(teams.iter().filter(|&&t| t == 0).count(), 1);
    }

    #[test]
    fn extent_contains_generated_tiles() {
        let cfg = small();
        let (lo, hi) = cfg.extent().unwrap();
        let (store, _) = generate(&cfg, 1.0);
        let (min, max) = store.tile_bounds().unwrap();
        assert_eq!(min.min(lo), lo);
        assert_eq!(max.max(hi), hi);
    }
}
