//! Shared entity components

use serde::{Serialize, Deserialize};
use crate::math::Vec2;

/// Health component for damageable entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage, returns true if this hit took health to zero or below.
    /// Health is not floored, so callers can tell overkill from a clean kill.
    pub fn damage(&mut self, amount: i32) -> bool {
        let was_alive = self.current > 0;
        self.current -= amount;
        was_alive && self.current <= 0
    }

    pub fn heal(&mut self, amount: i32) {
        self.current = (self.current + amount).min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }
}

/// Axis-aligned rectangle on the ground plane, `pos` is the minimum corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Footprint {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// Square of side `size` whose minimum corner sits at `pos`
    pub fn square(pos: Vec2, size: f32) -> Self {
        Self { pos, size: Vec2::new(size, size) }
    }
}
