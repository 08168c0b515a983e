//! Map tooling tasks for bonnie-wolf
//!
//! Usage:
//!   cargo xtask check-maps            # Parse and build every map in maps/
//!   cargo xtask stats level1.map      # Geometry and entity counts for one map

use anyhow::{bail, Context, Result};
use bonnie_wolf::config::Tunables;
use bonnie_wolf::world::{build_level, load_map, LevelLayout};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Map tooling for bonnie-wolf")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and build every .map file in a directory
    CheckMaps {
        /// Map directory (defaults to maps/ in the project root)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Tunables file to build with
        #[arg(long)]
        tunables: Option<PathBuf>,
    },
    /// Print geometry and entity counts for one map
    Stats {
        map: PathBuf,
        #[arg(long)]
        tunables: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckMaps { dir, tunables } => {
            let dir = dir.unwrap_or_else(|| project_root().join("maps"));
            check_maps(&dir, &load_tunables(tunables)?)
        }
        Commands::Stats { map, tunables } => stats(&map, &load_tunables(tunables)?),
    }
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.parent().unwrap_or(manifest).to_path_buf()
}

fn load_tunables(path: Option<PathBuf>) -> Result<Tunables> {
    match path {
        Some(path) => Tunables::load(&path).with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(Tunables::default()),
    }
}

fn build(path: &Path, tunables: &Tunables) -> Result<LevelLayout> {
    let grid = load_map(path)?;
    let layout = build_level(&grid, tunables).with_context(|| format!("Failed to build {}", path.display()))?;
    Ok(layout)
}

fn check_maps(dir: &Path, tunables: &Tunables) -> Result<()> {
    let mut maps: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "map"))
        .collect();
    maps.sort();

    if maps.is_empty() {
        bail!("No .map files in {}", dir.display());
    }

    let mut failed = 0;
    for path in &maps {
        match build(path, tunables) {
            Ok(_) => println!("  ok    {}", path.display()),
            Err(e) => {
                println!("  FAIL  {:#}", e);
                failed += 1;
            }
        }
    }

    println!("{} maps checked, {} failed", maps.len(), failed);
    if failed > 0 {
        bail!("{} map(s) failed to build", failed);
    }
    Ok(())
}

fn stats(path: &Path, tunables: &Tunables) -> Result<()> {
    let layout = build(path, tunables)?;
    let spawns = &layout.spawns;

    println!("{}", path.display());
    println!("  vertices:   {}", layout.mesh.vertices.len());
    println!("  triangles:  {}", layout.mesh.triangle_count());
    println!("  segments:   {}", layout.segments.len());
    println!("  player:     ({:.2}, {:.2})", spawns.player.x, spawns.player.z);
    println!("  doors:      {}", spawns.doors.len());
    println!("  monsters:   {}", spawns.monsters.len());
    println!("  medkits:    {}", spawns.medkits.len());
    println!("  exits:      {}", spawns.exits.len());
    Ok(())
}
