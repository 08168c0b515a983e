//! Monster behaviour
//!
//! Each monster runs a five-state machine every tick. Animation frames and
//! the look/attack rhythm are keyed to the fraction of the current wall-clock
//! second, so monsters placed together move in step.

use rand::Rng;
use rand::rngs::StdRng;
use crate::config::MonsterSettings;
use crate::math::{Vec2, Vec3};
use crate::world::{CollisionSegment, TileGrid};
use super::collision::Obstacles;
use super::components::{Footprint, Health};
use super::door::{open_doors_near, Door};
use super::event::{Events, MonsterDamageEvent, MonsterDeathEvent, Opener, PlayerDamageEvent, PlayerDeathEvent};
use super::player::Player;
use super::raycast::line_intersect_rect;
use super::runtime::Clock;
use super::transform::Transform;

/// Sprite sheet order: walk A-D, attack E-G, pain H, death I-L, corpse M
pub const MONSTER_FRAMES: [&str; 13] = [
    "SSWVA1.png", "SSWVB1.png", "SSWVC1.png", "SSWVD1.png",
    "SSWVE0.png", "SSWVF0.png", "SSWVG0.png",
    "SSWVH0.png",
    "SSWVI0.png", "SSWVJ0.png", "SSWVK0.png", "SSWVL0.png",
    "SSWVM0.png",
];

const ATTACK_FRAMES: [usize; 4] = [4, 5, 6, 5];
const DYING_FRAMES: [usize; 4] = [8, 9, 10, 11];
const DEAD_FRAME: usize = 12;

const DYING_SCALES: [Vec3; 4] = [
    Vec3::new(1.0, 0.964_285_7, 1.0),
    Vec3::new(1.7, 0.9, 1.0),
    Vec3::new(1.7, 0.9, 1.0),
    Vec3::new(1.7, 0.5, 1.0),
];
const DEAD_SCALE: Vec3 = Vec3::new(1.758_620_7, 0.285_714_3, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterState {
    Idle,
    Chase,
    Attack,
    Dying,
    Dead,
}

/// Level state a monster reads and writes during its update
pub struct MonsterContext<'a> {
    pub grid: &'a TileGrid,
    pub segments: &'a [CollisionSegment],
    pub doors: &'a mut [Door],
    pub player: &'a mut Player,
    pub rng: &'a mut StdRng,
    pub events: &'a mut Events,
    pub clock: Clock,
    pub spot: Vec2,
    pub open_distance: f32,
}

impl<'a> MonsterContext<'a> {
    fn obstacles(&self) -> Obstacles<'_> {
        Obstacles { grid: self.grid, segments: self.segments, doors: &*self.doors, spot: self.spot }
    }
}

#[derive(Debug, Clone)]
pub struct Monster {
    pub transform: Transform,
    pub health: Health,
    state: MonsterState,
    can_look: bool,
    can_attack: bool,
    death_time: Option<f64>,
    frame: usize,
    settings: MonsterSettings,
}

impl Monster {
    pub fn new(position: Vec3, settings: &MonsterSettings) -> Self {
        Self {
            transform: Transform::from_position(position),
            health: Health::new(settings.max_health),
            state: MonsterState::Idle,
            can_look: false,
            can_attack: true,
            death_time: None,
            frame: 0,
            settings: settings.clone(),
        }
    }

    pub fn state(&self) -> MonsterState {
        self.state
    }

    /// Index into `MONSTER_FRAMES` to draw this tick
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Ground rectangle hit by player fire
    pub fn footprint(&self) -> Footprint {
        Footprint::square(self.transform.position.xz(), self.settings.size)
    }

    fn set_state(&mut self, state: MonsterState) {
        if self.state != state {
            log::debug!("monster {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Apply a hit. Idle monsters start chasing; the hit that takes
    /// health to zero starts the death animation. Returns true on that hit.
    pub fn damage(&mut self, amount: i32) -> bool {
        if self.state == MonsterState::Idle {
            self.set_state(MonsterState::Chase);
        }
        self.health.current -= amount;

        let dying = matches!(self.state, MonsterState::Dying | MonsterState::Dead);
        if self.health.is_dead() && !dying {
            self.set_state(MonsterState::Dying);
            self.death_time = None;
            return true;
        }
        false
    }

    pub fn update(&mut self, index: usize, ctx: &mut MonsterContext<'_>) {
        let target = ctx.player.camera.pos;
        let to_player = Vec3::new(target.x - self.transform.position.x, 0.0, target.z - self.transform.position.z);
        let distance = to_player.len();
        let orientation = to_player.normalize();

        self.transform.position.y = self.settings.ground_offset;
        self.transform.face_towards(target);

        match self.state {
            MonsterState::Idle => self.idle_update(orientation, ctx),
            MonsterState::Chase => self.chase_update(index, orientation, distance, ctx),
            MonsterState::Attack => self.attack_update(orientation, ctx),
            MonsterState::Dying => self.dying_update(ctx.clock.now),
            MonsterState::Dead => self.dead_update(),
        }
    }

    fn idle_update(&mut self, orientation: Vec3, ctx: &mut MonsterContext<'_>) {
        if ctx.clock.second_fraction() < 0.5 {
            self.can_look = true;
            self.frame = 0;
            return;
        }
        if !self.can_look {
            return;
        }

        let start = self.transform.position.xz();
        let end = start + orientation.xz() * self.settings.shoot_distance;
        if ctx.obstacles().can_see(start, end, ctx.player.camera.pos.xz()) {
            self.set_state(MonsterState::Chase);
        }
        self.can_look = false;
    }

    fn chase_update(&mut self, index: usize, orientation: Vec3, distance: f32, ctx: &mut MonsterContext<'_>) {
        self.frame = ctx.clock.quarter();

        if ctx.rng.gen::<f32>() < self.settings.attack_chance * ctx.clock.delta {
            self.set_state(MonsterState::Attack);
            return;
        }

        if distance <= self.settings.stop_distance {
            self.set_state(MonsterState::Attack);
            return;
        }

        let amount = self.settings.move_speed * ctx.clock.delta;
        let old = self.transform.position;
        let half = Vec2::new(self.settings.size, self.settings.size);
        let mask = ctx.obstacles().check_collision(old, old + orientation * amount, half);
        let movement = orientation.mul_elem(mask);

        if movement.len() > 0.0 {
            self.transform.translate(movement * amount);
        }

        // Deflected by something: maybe a closed door
        if (movement - orientation).len() != 0.0 {
            open_doors_near(
                ctx.doors,
                self.transform.position,
                ctx.open_distance,
                ctx.clock.now,
                Opener::Monster(index),
                ctx.events,
            );
        }
    }

    fn attack_update(&mut self, orientation: Vec3, ctx: &mut MonsterContext<'_>) {
        let quarter = ctx.clock.quarter();
        self.frame = ATTACK_FRAMES[quarter];

        match quarter {
            2 if self.can_attack => {
                self.shoot(orientation, ctx);
                self.can_attack = false;
            }
            3 => {
                self.set_state(MonsterState::Chase);
                self.can_attack = true;
            }
            _ => {}
        }
    }

    fn shoot(&mut self, orientation: Vec3, ctx: &mut MonsterContext<'_>) {
        let spread = (ctx.rng.gen::<f32>() - 0.5) * self.settings.shoot_angle;
        let start = self.transform.position.xz();
        let end = start + orientation.xz().rotate(spread) * self.settings.shoot_distance;

        let wall = ctx.obstacles().cast(start, end);
        let Some(hit) = line_intersect_rect(start, end, ctx.player.footprint()) else {
            return;
        };
        if wall.map_or(false, |w| w.distance(start) <= hit.distance(start)) {
            return;
        }

        let amount = ctx.rng.gen_range(self.settings.damage_min..self.settings.damage_max);
        let killed = ctx.player.damage(amount);
        ctx.events.player_damaged.send(PlayerDamageEvent { amount, health: ctx.player.health.current });
        if killed {
            ctx.events.player_died.send(PlayerDeathEvent { position: ctx.player.camera.pos });
        }
    }

    fn dying_update(&mut self, now: f64) {
        let since = now - *self.death_time.get_or_insert(now);

        let window = self.settings.death_windows.iter().position(|&end| since < end);
        match window {
            Some(i) => {
                self.frame = DYING_FRAMES[i];
                self.transform.scale = DYING_SCALES[i];
            }
            None => {
                self.set_state(MonsterState::Dead);
                self.dead_update();
            }
        }
    }

    fn dead_update(&mut self) {
        self.frame = DEAD_FRAME;
        self.transform.scale = DEAD_SCALE;
    }
}

/// Damage the monster at `index`, recording the hit and any kill
pub fn hit_monster(monsters: &mut [Monster], index: usize, amount: i32, events: &mut Events) {
    let Some(monster) = monsters.get_mut(index) else {
        return;
    };
    let killed = monster.damage(amount);
    events.monster_damaged.send(MonsterDamageEvent { monster: index, amount, health: monster.health.current });
    if killed {
        events.monster_killed.send(MonsterDeathEvent { monster: index, position: monster.transform.position });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DoorSettings, PlayerSettings};
    use crate::world::{DoorOrientation, DoorSpawn, parse_map};
    use rand::SeedableRng;

    fn corridor() -> TileGrid {
        // Open 5x1 corridor along world X at z in [1, 2]
        let text = "wall1 {1,0,0,1}\nlengthmap       7\n\
            MAP:\n       \n 1     \n 1     \n 1     \n 1     \n 1     \n       \n\
            PLANES:\n       \n 1     \n 1     \n 1     \n 1     \n 1     \n       \n\
            SPECIALS:\n       \n A     \n       \n       \n       \n       \n       \n";
        parse_map(text).unwrap()
    }

    struct Fixture {
        grid: TileGrid,
        segments: Vec<CollisionSegment>,
        doors: Vec<Door>,
        player: Player,
        rng: StdRng,
        events: Events,
    }

    impl Fixture {
        fn new(player_x: f32) -> Self {
            let grid = corridor();
            let segments = crate::world::build_level(&grid, &Default::default()).unwrap().segments;
            Self {
                grid,
                segments,
                doors: Vec::new(),
                player: Player::new(Vec3::new(player_x, 0.4375, 1.5), &PlayerSettings::default()),
                rng: StdRng::seed_from_u64(1),
                events: Events::new(),
            }
        }

        fn ctx(&mut self, now: f64, delta: f32) -> MonsterContext<'_> {
            MonsterContext {
                grid: &self.grid,
                segments: &self.segments,
                doors: &mut self.doors,
                player: &mut self.player,
                rng: &mut self.rng,
                events: &mut self.events,
                clock: Clock { now, delta },
                spot: Vec2::new(1.0, 1.0),
                open_distance: 1.0,
            }
        }
    }

    fn monster_at(x: f32) -> Monster {
        Monster::new(Vec3::new(x, 0.0, 1.5), &MonsterSettings::default())
    }

    #[test]
    fn test_idle_spots_player_in_second_half() {
        let mut f = Fixture::new(1.5);
        let mut m = monster_at(5.5);

        m.update(0, &mut f.ctx(100.2, 0.004));
        assert_eq!(m.state(), MonsterState::Idle);
        m.update(0, &mut f.ctx(100.6, 0.004));
        assert_eq!(m.state(), MonsterState::Chase);
    }

    #[test]
    fn test_idle_blind_behind_door() {
        let mut f = Fixture::new(1.5);
        let spawn = DoorSpawn {
            cell: (3, 1),
            orientation: DoorOrientation::SpansZ,
            closed_position: Vec3::new(3.5, 0.0, 1.0),
            open_position: Vec3::new(3.5, 0.0, 0.1),
        };
        f.doors.push(Door::new(&spawn, &DoorSettings::default()));
        let mut m = monster_at(5.5);

        m.update(0, &mut f.ctx(100.2, 0.004));
        m.update(0, &mut f.ctx(100.6, 0.004));
        assert_eq!(m.state(), MonsterState::Idle);
    }

    #[test]
    fn test_idle_looks_once_per_second() {
        let mut f = Fixture::new(1.5);
        let mut m = monster_at(5.5);
        // Never saw the first half of a second, so it cannot look yet
        m.update(0, &mut f.ctx(100.6, 0.004));
        assert_eq!(m.state(), MonsterState::Idle);
    }

    #[test]
    fn test_chase_moves_toward_player() {
        let mut f = Fixture::new(1.5);
        let mut m = monster_at(5.5);
        m.set_state(MonsterState::Chase);
        m.settings.attack_chance = 0.0;

        m.update(0, &mut f.ctx(100.1, 0.1));
        assert!((m.transform.position.x - 5.3).abs() < 1e-4);
        assert_eq!(m.frame(), 0);
    }

    #[test]
    fn test_chase_attack_roll_holds_position() {
        let mut f = Fixture::new(1.5);
        let mut m = monster_at(5.5);
        m.set_state(MonsterState::Chase);
        // chance * delta above 1, so every roll succeeds
        m.settings.attack_chance = 20.0;

        let before = m.transform.position.xz();
        m.update(0, &mut f.ctx(100.1, 0.1));
        assert_eq!(m.state(), MonsterState::Attack);
        assert_eq!(m.transform.position.xz(), before);
    }

    #[test]
    fn test_chase_stops_and_attacks_when_close() {
        let mut f = Fixture::new(1.5);
        let mut m = monster_at(2.5);
        m.set_state(MonsterState::Chase);
        m.settings.attack_chance = 0.0;

        m.update(0, &mut f.ctx(100.1, 0.1));
        assert_eq!(m.state(), MonsterState::Attack);
        assert!((m.transform.position.x - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_attack_fires_once_per_cycle() {
        let mut f = Fixture::new(1.5);
        // Slightly off the player's row so the ray crosses the hitbox
        let mut m = Monster::new(Vec3::new(4.5, 0.0, 1.6), &MonsterSettings::default());
        m.set_state(MonsterState::Attack);
        m.settings.shoot_angle = 0.0;

        m.update(0, &mut f.ctx(100.6, 0.004));
        m.update(0, &mut f.ctx(100.65, 0.004));
        assert_eq!(f.events.player_damaged.len(), 1);
        let health = f.player.health.current;
        assert!((70..=95).contains(&health));

        m.update(0, &mut f.ctx(100.8, 0.004));
        assert_eq!(m.state(), MonsterState::Chase);
        assert_eq!(m.frame(), 5);
    }

    #[test]
    fn test_attack_blocked_by_door() {
        let mut f = Fixture::new(1.5);
        let spawn = DoorSpawn {
            cell: (3, 1),
            orientation: DoorOrientation::SpansZ,
            closed_position: Vec3::new(3.5, 0.0, 1.0),
            open_position: Vec3::new(3.5, 0.0, 0.1),
        };
        f.doors.push(Door::new(&spawn, &DoorSettings::default()));
        let mut m = monster_at(5.5);
        m.set_state(MonsterState::Attack);
        m.settings.shoot_angle = 0.0;

        m.update(0, &mut f.ctx(100.6, 0.004));
        assert!(f.events.player_damaged.is_empty());
        assert_eq!(f.player.health.current, 100);
    }

    #[test]
    fn test_chasing_monster_opens_blocking_door() {
        let mut f = Fixture::new(1.5);
        let spawn = DoorSpawn {
            cell: (3, 1),
            orientation: DoorOrientation::SpansZ,
            closed_position: Vec3::new(3.5, 0.0, 1.0),
            open_position: Vec3::new(3.5, 0.0, 0.1),
        };
        f.doors.push(Door::new(&spawn, &DoorSettings::default()));
        let mut m = monster_at(3.85);
        m.set_state(MonsterState::Chase);
        m.settings.attack_chance = 0.0;

        m.update(0, &mut f.ctx(100.1, 0.1));
        assert_eq!(f.doors[0].state(), crate::game::door::DoorState::Opening);
        assert_eq!(f.events.door_opened.len(), 1);
    }

    #[test]
    fn test_damage_kills_exactly_once() {
        let mut m = monster_at(1.0);
        assert!(!m.damage(40));
        assert_eq!(m.state(), MonsterState::Chase);
        assert!(!m.damage(40));
        assert!(m.damage(40));
        assert_eq!(m.state(), MonsterState::Dying);
        assert!(!m.damage(40));
        assert_eq!(m.state(), MonsterState::Dying);
    }

    #[test]
    fn test_death_animation() {
        let mut f = Fixture::new(1.5);
        let mut m = monster_at(3.5);
        m.damage(500);

        m.update(0, &mut f.ctx(50.0, 0.004));
        assert_eq!(m.frame(), 8);
        m.update(0, &mut f.ctx(50.2, 0.004));
        assert_eq!(m.frame(), 9);
        assert_eq!(m.transform.scale, Vec3::new(1.7, 0.9, 1.0));
        m.update(0, &mut f.ctx(50.5, 0.004));
        assert_eq!(m.frame(), 11);
        m.update(0, &mut f.ctx(50.7, 0.004));
        assert_eq!(m.state(), MonsterState::Dead);
        assert_eq!(m.frame(), 12);

        // Dead stays dead
        m.damage(10);
        m.update(0, &mut f.ctx(60.0, 0.004));
        assert_eq!(m.state(), MonsterState::Dead);
    }

    #[test]
    fn test_hit_monster_records_kill() {
        let mut monsters = vec![monster_at(1.0), monster_at(2.0)];
        let mut events = Events::new();
        hit_monster(&mut monsters, 1, 150, &mut events);
        assert_eq!(events.monster_damaged.len(), 1);
        assert_eq!(events.monster_killed.len(), 1);
        assert_eq!(monsters[0].state(), MonsterState::Idle);
    }
}
