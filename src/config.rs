//! Gameplay tunables
//!
//! Every constant the simulation depends on lives here so a level designer
//! can override it from a RON file without rebuilding. Missing sections and
//! fields fall back to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

/// Error type for tunables loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Where wall and plane texture coordinates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UvSource {
    /// Explicit `wallN {..}` rectangles declared in the map file
    #[default]
    Table,
    /// Derived from the tile code's slot in a square texture atlas
    Atlas,
}

/// Grid, texture atlas and map file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub spot_width: f32,
    pub spot_length: f32,
    pub spot_height: f32,
    /// Atlas is `2^tex_exponent` cells on a side
    pub tex_exponent: u32,
    pub uv_source: UvSource,
    /// Reach for doors and exits when interacting
    pub open_distance: f32,
    pub map_dir: PathBuf,
    /// Load `levelTest.map` instead of `level{N}.map`
    pub debug_level: bool,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            spot_width: 1.0,
            spot_length: 1.0,
            spot_height: 1.0,
            tex_exponent: 4,
            uv_source: UvSource::Table,
            open_distance: 1.0,
            map_dir: PathBuf::from("maps"),
            debug_level: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorSettings {
    pub length: f32,
    pub width: f32,
    pub height: f32,
    /// How far a door slides along its axis when open
    pub open_movement: f32,
    /// Seconds spent sliding in either direction
    pub time_to_open: f64,
    /// Seconds a door stays fully open
    pub close_delay: f64,
}

impl Default for DoorSettings {
    fn default() -> Self {
        Self {
            length: 1.0,
            width: 0.125,
            height: 1.0,
            open_movement: 0.9,
            time_to_open: 0.25,
            close_delay: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Half extent of the collision footprint
    pub size: f32,
    pub move_speed: f32,
    pub max_health: i32,
    pub damage_min: i32,
    pub damage_max: i32,
    pub shoot_distance: f32,
    pub eye_height: f32,
    pub gun_offset: f32,
    pub gun_distance: f32,
    pub mouse_sensitivity: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            size: 0.2,
            move_speed: 5.0,
            max_health: 100,
            damage_min: 20,
            damage_max: 60,
            shoot_distance: 1000.0,
            eye_height: 0.4375,
            gun_offset: -0.0875,
            gun_distance: 0.105,
            mouse_sensitivity: 1.0 / 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterSettings {
    pub size: f32,
    pub move_speed: f32,
    pub max_health: i32,
    pub damage_min: i32,
    pub damage_max: i32,
    pub shoot_distance: f32,
    /// Chasing monsters stop and attack inside this distance
    pub stop_distance: f32,
    /// Total aim spread in degrees (shots deviate by half of it either way)
    pub shoot_angle: f32,
    /// Attack probability per second while chasing
    pub attack_chance: f32,
    pub ground_offset: f32,
    /// Seconds after death at which each dying frame ends
    pub death_windows: [f64; 4],
}

impl Default for MonsterSettings {
    fn default() -> Self {
        Self {
            size: 0.2,
            move_speed: 2.0,
            max_health: 100,
            damage_min: 5,
            damage_max: 30,
            shoot_distance: 1000.0,
            stop_distance: 1.5,
            shoot_angle: 10.0,
            attack_chance: 0.5,
            ground_offset: 0.0,
            death_windows: [0.1, 0.3, 0.45, 0.6],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MedkitSettings {
    pub pickup_distance: f32,
    pub heal_amount: i32,
}

impl Default for MedkitSettings {
    fn default() -> Self {
        Self {
            pickup_distance: 0.75,
            heal_amount: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Logic ticks per second
    pub frame_cap: f64,
    /// Fixed seed for reproducible runs (None = entropy)
    pub rng_seed: Option<u64>,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            frame_cap: 250.0,
            rng_seed: None,
        }
    }
}

/// All gameplay settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub level: LevelSettings,
    pub door: DoorSettings,
    pub player: PlayerSettings,
    pub monster: MonsterSettings,
    pub medkit: MedkitSettings,
    pub timing: TimingSettings,
}

impl Tunables {
    /// Parse tunables from a RON string
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let tunables: Tunables = ron::from_str(s)?;
        tunables.validate()?;
        Ok(tunables)
    }

    /// Load tunables from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let tunables = Self::from_ron_str(&contents)?;
        log::info!("loaded tunables from {}", path.as_ref().display());
        Ok(tunables)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.frame_cap <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "frame_cap must be positive ({})", self.timing.frame_cap
            )));
        }
        if self.player.damage_max <= self.player.damage_min {
            return Err(ConfigError::Validation(format!(
                "player damage range is empty ({}..{})", self.player.damage_min, self.player.damage_max
            )));
        }
        if self.monster.damage_max <= self.monster.damage_min {
            return Err(ConfigError::Validation(format!(
                "monster damage range is empty ({}..{})", self.monster.damage_min, self.monster.damage_max
            )));
        }
        let windows = &self.monster.death_windows;
        if windows.windows(2).any(|w| w[0] > w[1]) {
            return Err(ConfigError::Validation(format!(
                "death windows must be ascending ({:?})", windows
            )));
        }
        Ok(())
    }

    /// Seconds per logic tick
    pub fn frame_time(&self) -> f64 {
        1.0 / self.timing.frame_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tunables::default().validate().is_ok());
        assert!((Tunables::default().frame_time() - 0.004).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let t = Tunables::from_ron_str("(door: (close_delay: 5.0), medkit: (heal_amount: 50))").unwrap();
        assert_eq!(t.door.close_delay, 5.0);
        assert_eq!(t.door.time_to_open, 0.25);
        assert_eq!(t.medkit.heal_amount, 50);
        assert_eq!(t.player.max_health, 100);
    }

    #[test]
    fn test_empty_damage_range_rejected() {
        let err = Tunables::from_ron_str("(monster: (damage_min: 10, damage_max: 10))").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        let err = Tunables::from_ron_str("(door: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
