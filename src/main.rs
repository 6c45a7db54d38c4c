mod config;
mod worldgen;

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tessera_geom::Vec3;
use tessera_partition::{OrganizedWorld, organize};
use tessera_runtime::{SharedWorld, WaitError, WorldBuilder};

use crate::config::TesseraConfig;

#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Generate a demo tile world and organize it into chunks")]
struct Cli {
    /// TOML config; defaults apply to anything it leaves out
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override demo.seed
    #[arg(long)]
    seed: Option<i32>,
    /// Build on the worker thread and publish through a shared handle
    #[arg(long)]
    background: bool,
    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Query populated chunks near this world position ("x,y,z")
    #[arg(long, value_parser = parse_vec3)]
    near: Option<Vec3>,
    /// Radius for --near, in world units
    #[arg(long, default_value_t = 48.0)]
    radius: f32,
    /// Exit with an error if any tile failed placement
    #[arg(long)]
    strict: bool,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got {s:?}"));
    }
    let mut v = [0.0f32; 3];
    for (slot, p) in v.iter_mut().zip(&parts) {
        *slot = p.parse().map_err(|e| format!("{p:?}: {e}"))?;
    }
    Ok(Vec3::new(v[0], v[1], v[2]))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut cfg = match &cli.config {
        Some(path) => {
            log::info!("loading config from {:?}", path);
            TesseraConfig::from_path(path)?
        }
        None => TesseraConfig::default(),
    };
    if let Some(seed) = cli.seed {
        cfg.demo.seed = seed;
    }
    cfg.validate()?;

    let (store, _) = worldgen::generate(&cfg.demo, cfg.world.tile_edge);
    store.validate_range()?;
    let options = cfg.build_options();

    let world = if cli.background {
        let builder = WorldBuilder::new()?;
        let shared = SharedWorld::new();
        let rev = builder.submit(store, options);
        log::info!("submitted background build rev {}", rev);
        while shared.revision() < rev {
            match builder.wait_result(Duration::from_millis(250)) {
                Ok(out) => {
                    shared.publish(out.rev, out.world);
                }
                Err(WaitError::Timeout) => log::debug!("waiting on build rev {}", rev),
                Err(e) => return Err(e.into()),
            }
        }
        shared.snapshot().ok_or("background build produced no world")?
    } else {
        std::sync::Arc::new(organize(store, &options))
    };

    log_summary(&world);
    if let Some(p) = cli.near {
        log_near(&world, p, cli.radius);
    }

    let stats = world.partitioner.stats();
    if cli.strict && !stats.is_clean() {
        return Err(format!("{} tiles failed placement", stats.failed).into());
    }
    Ok(())
}

fn log_summary(world: &OrganizedWorld) {
    let r = world.report();
    let p = &world.partitioner;
    log::info!(
        "{} tiles, {} regions ({} reachable / {} isolated tiles), {} of {} chunks populated, edge {}",
        r.tiles,
        r.regions,
        r.reachable_tiles,
        r.isolated_tiles,
        r.partition.populated_chunks,
        r.partition.chunks_created,
        p.edge()
    );
    if let (Some(lo), Some(hi), Some(wb)) = (p.min_coords(), p.max_coords(), p.world_bounds()) {
        log::info!(
            "tile bounds {} .. {}; world ({:.1}, {:.1}, {:.1}) .. ({:.1}, {:.1}, {:.1})",
            lo,
            hi,
            wb.min.x,
            wb.min.y,
            wb.min.z,
            wb.max.x,
            wb.max.y,
            wb.max.z
        );
    }
    if log::log_enabled!(log::Level::Debug) {
        let mut chunks = p.populated_chunks();
        chunks.sort_by(|a, b| b.load_factor().total_cmp(&a.load_factor()));
        for c in chunks.iter().take(8) {
            log::debug!(
                "chunk {:?} solid={} occupied={} load={:.3}",
                c.coord(),
                c.solid_count(),
                c.occupied_count(),
                c.load_factor()
            );
        }
    }
}

fn log_near(world: &OrganizedWorld, position: Vec3, radius: f32) {
    let p = &world.partitioner;
    let home = p.chunk_at_position(position);
    let near = p.chunks_near(position, radius);
    log::info!(
        "{} populated chunks within {:.1} of ({:.1}, {:.1}, {:.1}) (home chunk {:?})",
        near.len(),
        radius,
        position.x,
        position.y,
        position.z,
        home
    );
    for c in near {
        let o = p.chunk_world_offset(c.coord());
        log::info!(
            "  {:?} at ({:.1}, {:.1}, {:.1}) solid={}",
            c.coord(),
            o.x,
            o.y,
            o.z,
            c.solid_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vec3_arguments() {
        assert_eq!(parse_vec3("1, -2.5,3").unwrap(), Vec3::new(1.0, -2.5, 3.0));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("a,b,c").is_err());
    }

    #[test]
    fn cli_accepts_flags() {
        let cli = Cli::try_parse_from([
            "tessera",
            "--background",
            "--seed",
            "42",
            "--near",
            "0,20,0",
            "--radius",
            "16",
        ])
        .unwrap();
        assert!(cli.background);
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.near, Some(Vec3::new(0.0, 20.0, 0.0)));
        assert_eq!(cli.radius, 16.0);
        assert!(!cli.strict);
    }
}
