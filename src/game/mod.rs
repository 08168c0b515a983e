//! Game Module
//!
//! Everything that moves once a level is built: the player, doors,
//! monsters and medkits, plus the collision and raycast queries they share.
//!
//! Key concepts:
//! - Level: owns every entity list; entities refer to each other by index
//! - Obstacles: read-only view of walls and doors used by movement and rays
//! - Events: what happened during a tick, drained by the game afterwards
//! - Clock: absolute time passed into every tick, so late ticks never drift

pub mod event;
pub mod transform;
pub mod components;
pub mod collision;
pub mod raycast;
pub mod door;
pub mod player;
pub mod monster;
pub mod medkit;
pub mod level;
pub mod runtime;

// Re-export main types
pub use event::Events;
pub use transform::Transform;
pub use door::{Door, DoorState};
pub use player::{Player, PlayerIntent};
pub use monster::{Monster, MonsterState};
pub use medkit::Medkit;
pub use level::{Level, MeshKind, RenderItem};
pub use runtime::{Clock, FixedTimestep, Game, GameError, MapSource};
