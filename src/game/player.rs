//! Player: first-person camera, health, movement and the held gun sprite

use rand::Rng;
use crate::config::PlayerSettings;
use crate::math::{Vec2, Vec3};
use super::collision::Obstacles;
use super::components::{Footprint, Health};
use super::transform::Transform;

/// First-person camera. `forward` and `up` stay unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pos: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn new(pos: Vec3, forward: Vec3, up: Vec3) -> Self {
        Self { pos, forward: forward.normalize(), up: up.normalize() }
    }

    /// Horizontal axis perpendicular to the view direction
    fn horizontal_axis(&self) -> Vec3 {
        Vec3::UP.cross(self.forward).normalize()
    }

    /// Turn left/right around the world up axis (degrees)
    pub fn rotate_y(&mut self, angle: f32) {
        self.forward = self.forward.rotate(angle, Vec3::UP).normalize();
        self.up = self.forward.cross(self.horizontal_axis()).normalize();
    }

    /// Pitch around the camera's horizontal axis (degrees)
    pub fn rotate_x(&mut self, angle: f32) {
        let h_axis = self.horizontal_axis();
        self.forward = self.forward.rotate(angle, h_axis).normalize();
        self.up = self.forward.cross(h_axis).normalize();
    }

    pub fn left(&self) -> Vec3 {
        self.forward.cross(self.up).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.up.cross(self.forward).normalize()
    }

    pub fn move_by(&mut self, dir: Vec3, amount: f32) {
        self.pos = self.pos + dir * amount;
    }
}

/// One tick of player input, filled in by the platform layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    pub forward: bool,
    pub back: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    /// Horizontal look delta in input units (mouse pixels)
    pub turn: f32,
    /// Vertical look delta in input units
    pub look: f32,
    /// Open nearby doors, leave through a nearby exit
    pub interact: bool,
    pub fire: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub camera: Camera,
    pub health: Health,
    /// Gun sprite, kept in front of the camera
    pub gun: Transform,
    movement: Vec3,
    settings: PlayerSettings,
}

impl Player {
    pub fn new(position: Vec3, settings: &PlayerSettings) -> Self {
        Self {
            camera: Camera::new(position, Vec3::new(0.0, 0.0, -1.0), Vec3::UP),
            health: Health::new(settings.max_health),
            gun: Transform::IDENTITY,
            movement: Vec3::ZERO,
            settings: settings.clone(),
        }
    }

    pub fn movement(&self) -> Vec3 {
        self.movement
    }

    /// Look around and rebuild the movement vector from held keys
    pub fn apply_intent(&mut self, intent: &PlayerIntent) {
        if intent.turn != 0.0 {
            self.camera.rotate_y(intent.turn * self.settings.mouse_sensitivity);
        }
        if intent.look != 0.0 {
            self.camera.rotate_x(intent.look * self.settings.mouse_sensitivity);
        }

        let mut movement = Vec3::ZERO;
        if intent.forward {
            movement = movement + self.camera.forward;
        }
        if intent.back {
            movement = movement - self.camera.forward;
        }
        if intent.strafe_left {
            movement = movement + self.camera.left();
        }
        if intent.strafe_right {
            movement = movement + self.camera.right();
        }
        self.movement = movement;
    }

    /// Ground rectangle used as the target when monsters shoot
    pub fn footprint(&self) -> Footprint {
        Footprint::square(self.camera.pos.xz(), self.settings.size)
    }

    /// Hitscan segment along the view direction, flattened to the ground
    pub fn aim(&self) -> (Vec2, Vec2) {
        let start = self.camera.pos.xz();
        let dir = self.camera.forward.xz().normalize();
        (start, start + dir * self.settings.shoot_distance)
    }

    pub fn roll_damage<R: Rng>(&self, rng: &mut R) -> i32 {
        rng.gen_range(self.settings.damage_min..self.settings.damage_max)
    }

    /// Apply damage (negative heals, capped at max health).
    /// Returns true on the hit that kills.
    pub fn damage(&mut self, amount: i32) -> bool {
        let killed = self.health.damage(amount);
        self.health.current = self.health.current.min(self.health.max);
        log::info!("player health = {}", self.health.current);
        if killed {
            log::warn!("player died, GAME OVER");
        }
        killed
    }

    /// Move along the intent vector, sliding along walls and doors
    pub fn update(&mut self, obstacles: &Obstacles<'_>, delta: f32) {
        let amount = self.settings.move_speed * delta;

        self.movement.y = 0.0;
        self.movement = self.movement.normalize();

        let old = self.camera.pos;
        let new = old + self.movement * amount;
        let half = Vec2::new(self.settings.size, self.settings.size);
        let mask = obstacles.check_collision(old, new, half);
        self.movement = self.movement.mul_elem(mask);

        if self.movement.len() > 0.0 {
            self.camera.move_by(self.movement, amount);
        }

        let mut gun_pos = self.camera.pos + self.camera.forward.normalize() * self.settings.gun_distance;
        gun_pos.y += self.settings.gun_offset;
        self.gun.position = gun_pos;
        self.gun.face_towards(self.camera.pos);
    }
}
