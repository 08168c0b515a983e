//! Game Runtime
//!
//! Drives levels with a fixed logic timestep, loads level N+1 when the
//! player leaves through an exit and stops when the player dies.

use std::path::PathBuf;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use crate::assets::{AssetCache, AssetError};
use crate::config::{ConfigError, Tunables};
use crate::world::{load_map, GeometryError, MapLoadError};
use super::level::{Level, RenderItem};
use super::player::PlayerIntent;

/// Time passed into every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    /// Seconds since start
    pub now: f64,
    /// Seconds covered by this tick
    pub delta: f32,
}

impl Clock {
    /// Position within the current wall-clock second, in [0, 1)
    pub fn second_fraction(&self) -> f64 {
        self.now.fract()
    }

    /// Which quarter of the current second is running (0..=3)
    pub fn quarter(&self) -> usize {
        ((self.second_fraction() * 4.0) as usize).min(3)
    }
}

/// Time accumulator: real time goes in, fixed logic slices come out
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    frame_time: f64,
    unprocessed: f64,
    render: bool,
    frames: u32,
    frame_counter: f64,
    last_fps: u32,
}

impl FixedTimestep {
    pub fn new(frame_time: f64) -> Self {
        Self {
            frame_time,
            unprocessed: 0.0,
            render: false,
            frames: 0,
            frame_counter: 0.0,
            last_fps: 0,
        }
    }

    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    /// Add `passed` seconds and return how many whole slices to run
    pub fn advance(&mut self, passed: f64) -> usize {
        self.unprocessed += passed;
        self.frame_counter += passed;

        let mut slices = 0;
        while self.unprocessed > self.frame_time {
            self.unprocessed -= self.frame_time;
            slices += 1;
        }
        self.render = slices > 0;

        if self.frame_counter >= 1.0 {
            self.last_fps = self.frames;
            log::debug!("FPS: {}", self.frames);
            self.frames = 0;
            self.frame_counter = 0.0;
        }
        slices
    }

    /// True when the last advance ran at least one slice
    pub fn should_render(&self) -> bool {
        self.render
    }

    /// Count a presented frame
    pub fn frame_rendered(&mut self) {
        self.frames += 1;
    }

    /// Frames presented during the last full second
    pub fn fps(&self) -> u32 {
        self.last_fps
    }
}

/// Where level maps live
#[derive(Debug, Clone)]
pub struct MapSource {
    pub dir: PathBuf,
    /// Always load `levelTest.map`
    pub debug: bool,
}

impl MapSource {
    pub fn path(&self, level: u32) -> PathBuf {
        if self.debug {
            self.dir.join("levelTest.map")
        } else {
            self.dir.join(format!("level{}.map", level))
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Map(#[from] MapLoadError),
    #[error("level {level}: {source}")]
    Geometry { level: u32, source: GeometryError },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Top-level state: current level, level counter, running flag
pub struct Game {
    level: Option<Level>,
    level_num: u32,
    is_running: bool,
    maps: MapSource,
    tunables: Tunables,
    assets: AssetCache,
    rng: StdRng,
}

impl Game {
    /// Nothing is loaded until `load_next_level`
    pub fn new(tunables: Tunables, assets: AssetCache) -> Self {
        let rng = match tunables.timing.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let maps = MapSource {
            dir: tunables.level.map_dir.clone(),
            debug: tunables.level.debug_level,
        };
        Self {
            level: None,
            level_num: 0,
            is_running: false,
            maps,
            tunables,
            assets,
            rng,
        }
    }

    pub fn level_num(&self) -> u32 {
        self.level_num
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut Level> {
        self.level.as_mut()
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn frame_time(&self) -> f64 {
        self.tunables.frame_time()
    }

    /// Advance the level counter and load that level. The previous level is
    /// kept if loading fails.
    pub fn load_next_level(&mut self) -> Result<(), GameError> {
        let next = self.level_num + 1;
        let path = self.maps.path(next);
        log::info!("loading level {} from {}", next, path.display());

        let grid = load_map(&path)?;
        let level = Level::new(grid, &self.tunables)
            .map_err(|source| GameError::Geometry { level: next, source })?;

        self.level = Some(level);
        self.level_num = next;
        self.is_running = true;
        Ok(())
    }

    /// Apply player input for the coming tick
    pub fn input(&mut self, intent: &PlayerIntent, now: f64) {
        if !self.is_running {
            return;
        }
        if let Some(level) = self.level.as_mut() {
            level.events.clear_all();
            level.input(intent, now, &mut self.rng);
        }
    }

    /// One fixed logic tick at `now`, then handle death and exits
    pub fn update(&mut self, now: f64) -> Result<(), GameError> {
        if !self.is_running {
            return Ok(());
        }
        let Some(level) = self.level.as_mut() else {
            return Ok(());
        };

        let clock = Clock { now, delta: self.tunables.frame_time() as f32 };
        level.update(clock, &mut self.rng);

        let died = level.events.player_died.drain().count() > 0;
        let exited = level.events.exit_reached.drain().count() > 0;

        if died {
            log::warn!("player died on level {}", self.level_num);
            self.is_running = false;
        } else if exited {
            self.load_next_level()?;
        }
        Ok(())
    }

    pub fn render_list(&self) -> Vec<RenderItem> {
        self.level
            .as_ref()
            .map(|level| level.render_list(&self.assets))
            .unwrap_or_default()
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    /// Hand the asset cache back for teardown
    pub fn into_assets(self) -> AssetCache {
        self.assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_quarters() {
        let c = |now| Clock { now, delta: 0.0 };
        assert_eq!(c(10.0).quarter(), 0);
        assert_eq!(c(10.3).quarter(), 1);
        assert_eq!(c(10.55).quarter(), 2);
        assert_eq!(c(10.99).quarter(), 3);
        assert!((c(7.25).second_fraction() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_timestep_drains_whole_slices() {
        let mut ts = FixedTimestep::new(0.004);
        assert_eq!(ts.advance(0.003), 0);
        assert!(!ts.should_render());
        // 0.003 + 0.0095 = 0.0125 -> three slices, 0.0005 left over
        assert_eq!(ts.advance(0.0095), 3);
        assert!(ts.should_render());
        assert_eq!(ts.advance(0.0001), 0);
    }

    #[test]
    fn test_timestep_exact_slice_waits() {
        // Strictly greater: an exact slice is held until more time arrives
        let mut ts = FixedTimestep::new(0.5);
        assert_eq!(ts.advance(0.5), 0);
        assert_eq!(ts.advance(0.25), 1);
    }

    #[test]
    fn test_fps_reported_each_second() {
        let mut ts = FixedTimestep::new(0.1);
        for _ in 0..10 {
            if ts.advance(0.11) > 0 {
                ts.frame_rendered();
            }
        }
        assert_eq!(ts.fps(), 9);
    }

    #[test]
    fn test_map_source_paths() {
        let normal = MapSource { dir: PathBuf::from("maps"), debug: false };
        assert_eq!(normal.path(3), PathBuf::from("maps/level3.map"));
        let debug = MapSource { dir: PathBuf::from("maps"), debug: true };
        assert_eq!(debug.path(3), PathBuf::from("maps/levelTest.map"));
    }
}
