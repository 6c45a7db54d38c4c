use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessera_chunk::{CHUNK_EDGE, MAX_CHUNK_EDGE};
use tessera_partition::{BuildOptions, PartitionOptions};
use tessera_region::ExploreOptions;
use tessera_tiles::{KeyRangeError, TileKey};

use crate::worldgen::{DemoConfig, MAX_COLUMNS_PER_AXIS, MAX_SPAWNS, MAX_VAULT_SIZE, MAX_VAULTS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("demo world does not fit the key encoding: {0}")]
    Range(#[from] KeyRangeError),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldSection {
    /// World units per tile edge.
    pub tile_edge: f32,
    /// Tiles per chunk edge.
    pub chunk_edge: usize,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            tile_edge: 1.0,
            chunk_edge: CHUNK_EDGE,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TesseraConfig {
    pub world: WorldSection,
    pub explore: ExploreOptions,
    pub demo: DemoConfig,
}

impl TesseraConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: TesseraConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if !(1..=MAX_CHUNK_EDGE).contains(&world.chunk_edge) {
            return Err(ConfigError::Invalid(format!(
                "world.chunk_edge must be in 1..={MAX_CHUNK_EDGE}, got {}",
                world.chunk_edge
            )));
        }
        if !(world.tile_edge.is_finite() && world.tile_edge > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "world.tile_edge must be positive, got {}",
                world.tile_edge
            )));
        }

        let demo = &self.demo;
        for (name, v) in [("size_x", demo.size_x), ("size_z", demo.size_z)] {
            if !(0..=MAX_COLUMNS_PER_AXIS).contains(&v) {
                return Err(ConfigError::Invalid(format!(
                    "demo.{name} must be in 0..={MAX_COLUMNS_PER_AXIS}, got {v}"
                )));
            }
        }
        if demo.base_height < 0 {
            return Err(ConfigError::Invalid(format!(
                "demo.base_height must not be negative, got {}",
                demo.base_height
            )));
        }
        if !(demo.amplitude.is_finite() && demo.frequency.is_finite()) {
            return Err(ConfigError::Invalid("demo.amplitude and demo.frequency must be finite".into()));
        }
        if demo.spawns > MAX_SPAWNS {
            return Err(ConfigError::Invalid(format!(
                "demo.spawns must be at most {MAX_SPAWNS}, got {}",
                demo.spawns
            )));
        }
        if demo.vaults > MAX_VAULTS {
            return Err(ConfigError::Invalid(format!(
                "demo.vaults must be at most {MAX_VAULTS}, got {}",
                demo.vaults
            )));
        }
        if demo.vault_size > MAX_VAULT_SIZE {
            return Err(ConfigError::Invalid(format!(
                "demo.vault_size must be at most {MAX_VAULT_SIZE}, got {}",
                demo.vault_size
            )));
        }
        let (lo, hi) = demo
            .extent()
            .ok_or_else(|| ConfigError::Invalid("demo world bounds overflow i32".into()))?;
        TileKey::checked(lo.x, lo.y, lo.z)?;
        TileKey::checked(hi.x, hi.y, hi.z)?;
        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            explore: self.explore,
            partition: PartitionOptions {
                chunk_edge: self.world.chunk_edge,
            },
        }
    }
}
