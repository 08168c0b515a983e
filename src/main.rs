//! Headless runner
//!
//! Loads `level1.map` from the configured map directory and plays it with a
//! scripted autopilot on simulated time, logging what happens. Pass a RON
//! tunables file as the only argument to override the defaults.

use std::io::ErrorKind;
use bonnie_wolf::assets::{AssetCache, HeadlessLoader};
use bonnie_wolf::config::Tunables;
use bonnie_wolf::game::{FixedTimestep, Game, GameError, PlayerIntent};
use bonnie_wolf::world::MapLoadError;
use bonnie_wolf::VERSION;

/// Simulated display refresh
const DISPLAY_FRAME: f64 = 1.0 / 60.0;
/// Give up after this much simulated time
const SIM_SECONDS: f64 = 120.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("bonnie-wolf v{}", VERSION);

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Walk forward, keep pressing use, fire twice a second
fn autopilot(now: f64) -> PlayerIntent {
    PlayerIntent {
        forward: true,
        interact: true,
        fire: now.fract() < 0.004 || (now.fract() - 0.5).abs() < 0.002,
        ..Default::default()
    }
}

/// The map directory ran out of levels
fn is_last_level(err: &GameError) -> bool {
    matches!(err, GameError::Map(MapLoadError::Io { source, .. }) if source.kind() == ErrorKind::NotFound)
}

fn run() -> Result<(), GameError> {
    let tunables = match std::env::args().nth(1) {
        Some(path) => Tunables::load(path)?,
        None => Tunables::default(),
    };

    let mut loader = HeadlessLoader::new();
    let assets = AssetCache::init(&mut loader)?;
    let mut game = Game::new(tunables, assets);
    game.load_next_level()?;

    let mut timestep = FixedTimestep::new(game.frame_time());
    let mut sim_time = 0.0;
    let mut elapsed = 0.0;
    let mut result = Ok(());

    'frames: while game.is_running() && elapsed < SIM_SECONDS {
        elapsed += DISPLAY_FRAME;

        for _ in 0..timestep.advance(DISPLAY_FRAME) {
            sim_time += timestep.frame_time();
            game.input(&autopilot(sim_time), sim_time);
            if let Err(e) = game.update(sim_time) {
                if is_last_level(&e) {
                    log::info!("no more levels after level {}", game.level_num());
                } else {
                    result = Err(e);
                }
                break 'frames;
            }
        }

        if timestep.should_render() {
            let items = game.render_list();
            log::trace!("frame at {:.3}s: {} render items", sim_time, items.len());
            timestep.frame_rendered();
        }
    }

    if let Some(level) = game.level() {
        log::info!(
            "stopped at {:.1}s on level {}: health {}, {} monsters left standing",
            sim_time,
            game.level_num(),
            level.player.health.current,
            level.monsters.iter().filter(|m| !m.health.is_dead()).count(),
        );
    }

    game.into_assets().teardown(&mut loader);
    result
}
