//! Event System
//!
//! The level records what happened during a tick as events instead of
//! reaching back into the game. The game drains them after the tick to
//! decide level transitions and whether play continues.
//!
//! Entities are referred to by their index in the level's entity lists.

use crate::math::Vec3;

/// A queue for events of a single type.
/// Events are collected during the tick and drained afterwards.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Send an event (add to queue)
    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate over events without clearing
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    /// Drain all events (returns iterator and clears queue)
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Container for all level events
#[derive(Debug, Default)]
pub struct Events {
    pub door_opened: EventQueue<DoorEvent>,
    pub player_damaged: EventQueue<PlayerDamageEvent>,
    pub player_died: EventQueue<PlayerDeathEvent>,
    pub monster_damaged: EventQueue<MonsterDamageEvent>,
    pub monster_killed: EventQueue<MonsterDeathEvent>,
    pub medkit_collected: EventQueue<MedkitEvent>,
    pub exit_reached: EventQueue<ExitEvent>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all event queues. Called at the start of every tick.
    pub fn clear_all(&mut self) {
        self.door_opened.clear();
        self.player_damaged.clear();
        self.player_died.clear();
        self.monster_damaged.clear();
        self.monster_killed.clear();
        self.medkit_collected.clear();
        self.exit_reached.clear();
    }
}

// =============================================================================
// Event Types
// =============================================================================

/// A door started its open cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorEvent {
    pub door: usize,
    /// Who triggered it
    pub opener: Opener,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opener {
    Player,
    Monster(usize),
}

/// Player health changed by damage (negative amounts are heals)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDamageEvent {
    pub amount: i32,
    /// Health after the change
    pub health: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerDeathEvent {
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterDamageEvent {
    pub monster: usize,
    pub amount: i32,
    pub health: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonsterDeathEvent {
    pub monster: usize,
    /// Where they died
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedkitEvent {
    pub position: Vec3,
    /// Player health after healing
    pub health: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitEvent {
    pub position: Vec3,
}
