//! Medkit pickups

use crate::config::MedkitSettings;
use crate::math::Vec3;
use super::event::{Events, MedkitEvent};
use super::player::Player;
use super::transform::Transform;

pub const MEDKIT_TEXTURE: &str = "MEDIA0.png";

#[derive(Debug, Clone)]
pub struct Medkit {
    pub transform: Transform,
    settings: MedkitSettings,
}

impl Medkit {
    pub fn new(position: Vec3, settings: &MedkitSettings) -> Self {
        Self {
            transform: Transform::from_position(position),
            settings: settings.clone(),
        }
    }

    /// Turn toward the player and heal them when close enough.
    /// Returns true when picked up; the caller removes it.
    pub fn update(&mut self, player: &mut Player, events: &mut Events) -> bool {
        self.transform.face_towards(player.camera.pos);

        let distance = self.transform.position.distance_xz(player.camera.pos);
        if distance >= self.settings.pickup_distance || player.health.is_full() {
            return false;
        }

        player.damage(-self.settings.heal_amount);
        events.medkit_collected.send(MedkitEvent {
            position: self.transform.position,
            health: player.health.current,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerSettings;

    fn setup(player_x: f32) -> (Medkit, Player) {
        let medkit = Medkit::new(Vec3::new(2.0, 0.0, 2.0), &MedkitSettings::default());
        let player = Player::new(Vec3::new(player_x, 0.4375, 2.0), &PlayerSettings::default());
        (medkit, player)
    }

    #[test]
    fn test_full_health_leaves_medkit() {
        let (mut m, mut p) = setup(2.1);
        let mut events = Events::new();
        assert!(!m.update(&mut p, &mut events));
        assert!(events.medkit_collected.is_empty());
    }

    #[test]
    fn test_pickup_heals_and_caps() {
        let (mut m, mut p) = setup(2.1);
        let mut events = Events::new();
        p.damage(10);
        assert!(m.update(&mut p, &mut events));
        assert_eq!(p.health.current, 100);
        assert_eq!(events.medkit_collected.len(), 1);
    }

    #[test]
    fn test_too_far_away() {
        let (mut m, mut p) = setup(3.0);
        let mut events = Events::new();
        p.damage(50);
        assert!(!m.update(&mut p, &mut events));
        assert_eq!(p.health.current, 50);
    }
}
