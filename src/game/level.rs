//! A playable level
//!
//! Owns the parsed grid, the static mesh and collision segments built from
//! it, and every entity spawned by its special tiles. Entities refer to one
//! another by index into these lists; only the level mutates them.

use rand::rngs::StdRng;
use crate::assets::{AssetCache, Material};
use crate::config::Tunables;
use crate::math::{Mat4, Vec2, Vec3};
use crate::world::{build_level, door_mesh, sprite_mesh, CollisionSegment, GeometryError, Mesh, SpriteShape, TileGrid};
use super::collision::Obstacles;
use super::door::{open_doors_near, Door};
use super::event::{Events, ExitEvent, Opener};
use super::medkit::Medkit;
use super::monster::{hit_monster, Monster, MonsterContext};
use super::player::{Player, PlayerIntent};
use super::raycast::nearest_rect_hit;
use super::runtime::Clock;

/// Which shared mesh a render item draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Door,
    Monster,
    Medkit,
    Gun,
}

/// One dynamic entity to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    pub mesh: MeshKind,
    pub transform: Mat4,
    pub material: Material,
}

#[derive(Debug, Clone)]
struct EntityMeshes {
    door: Mesh,
    monster: Mesh,
    medkit: Mesh,
    gun: Mesh,
}

pub struct Level {
    grid: TileGrid,
    geometry: Mesh,
    segments: Vec<CollisionSegment>,
    meshes: EntityMeshes,
    exits: Vec<Vec3>,
    medkits_to_remove: Vec<usize>,
    tunables: Tunables,
    pub player: Player,
    pub doors: Vec<Door>,
    pub monsters: Vec<Monster>,
    pub medkits: Vec<Medkit>,
    pub events: Events,
}

impl Level {
    /// Build geometry and spawn entities. Nothing is kept on failure.
    pub fn new(grid: TileGrid, tunables: &Tunables) -> Result<Self, GeometryError> {
        let layout = build_level(&grid, tunables)?;
        let spawns = layout.spawns;

        let level = Self {
            player: Player::new(spawns.player, &tunables.player),
            doors: spawns.doors.iter().map(|d| Door::new(d, &tunables.door)).collect(),
            monsters: spawns.monsters.iter().map(|&p| Monster::new(p, &tunables.monster)).collect(),
            medkits: spawns.medkits.iter().map(|&p| Medkit::new(p, &tunables.medkit)).collect(),
            exits: spawns.exits,
            meshes: EntityMeshes {
                door: door_mesh(&tunables.door),
                monster: sprite_mesh(SpriteShape::MONSTER),
                medkit: sprite_mesh(SpriteShape::MEDKIT),
                gun: sprite_mesh(SpriteShape::GUN),
            },
            geometry: layout.mesh,
            segments: layout.segments,
            grid,
            medkits_to_remove: Vec::new(),
            tunables: tunables.clone(),
            events: Events::new(),
        };

        log::info!(
            "level built: {}x{} grid, {} triangles, {} segments, {} doors, {} monsters, {} medkits, {} exits",
            level.grid.width(),
            level.grid.height(),
            level.geometry.triangle_count(),
            level.segments.len(),
            level.doors.len(),
            level.monsters.len(),
            level.medkits.len(),
            level.exits.len(),
        );
        Ok(level)
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Static level mesh, drawn with `AssetCache::level_atlas`
    pub fn geometry(&self) -> &Mesh {
        &self.geometry
    }

    pub fn segments(&self) -> &[CollisionSegment] {
        &self.segments
    }

    pub fn exits(&self) -> &[Vec3] {
        &self.exits
    }

    pub fn mesh(&self, kind: MeshKind) -> &Mesh {
        match kind {
            MeshKind::Door => &self.meshes.door,
            MeshKind::Monster => &self.meshes.monster,
            MeshKind::Medkit => &self.meshes.medkit,
            MeshKind::Gun => &self.meshes.gun,
        }
    }

    fn spot(&self) -> Vec2 {
        Vec2::new(self.tunables.level.spot_width, self.tunables.level.spot_length)
    }

    pub fn obstacles(&self) -> Obstacles<'_> {
        Obstacles {
            grid: &self.grid,
            segments: &self.segments,
            doors: &self.doors,
            spot: self.spot(),
        }
    }

    /// Apply one tick of player input: look, movement intent, interact, fire
    pub fn input(&mut self, intent: &PlayerIntent, now: f64, rng: &mut StdRng) {
        self.player.apply_intent(intent);

        if intent.interact {
            self.interact(now);
        }
        if intent.fire {
            self.fire(rng);
        }
    }

    fn interact(&mut self, now: f64) {
        let reach = self.tunables.level.open_distance;
        let pos = self.player.camera.pos;
        open_doors_near(&mut self.doors, pos, reach, now, Opener::Player, &mut self.events);

        if let Some(&exit) = self.exits.iter().find(|e| e.distance_xz(pos) < reach) {
            log::info!("exit reached at {:?}", exit);
            self.events.exit_reached.send(ExitEvent { position: exit });
        }
    }

    fn fire(&mut self, rng: &mut StdRng) {
        let (start, end) = self.player.aim();
        let wall = self.obstacles().cast(start, end);
        let targets = self.monsters.iter().map(Monster::footprint).enumerate();

        let Some((index, hit)) = nearest_rect_hit(start, end, targets) else {
            return;
        };
        if wall.map_or(false, |w| w.distance(start) <= hit.distance(start)) {
            return;
        }

        let amount = self.player.roll_damage(rng);
        hit_monster(&mut self.monsters, index, amount, &mut self.events);
    }

    /// One logic tick: doors, player, monsters in list order, then medkits
    pub fn update(&mut self, clock: Clock, rng: &mut StdRng) {
        for door in &mut self.doors {
            door.update(clock.now);
        }

        let spot = self.spot();
        let obstacles = Obstacles { grid: &self.grid, segments: &self.segments, doors: &self.doors, spot };
        self.player.update(&obstacles, clock.delta);

        let mut ctx = MonsterContext {
            grid: &self.grid,
            segments: &self.segments,
            doors: &mut self.doors,
            player: &mut self.player,
            rng,
            events: &mut self.events,
            clock,
            spot,
            open_distance: self.tunables.level.open_distance,
        };
        for (index, monster) in self.monsters.iter_mut().enumerate() {
            monster.update(index, &mut ctx);
        }

        for (index, medkit) in self.medkits.iter_mut().enumerate() {
            if medkit.update(&mut self.player, &mut self.events) {
                self.medkits_to_remove.push(index);
            }
        }
        self.remove_collected_medkits();
    }

    fn remove_collected_medkits(&mut self) {
        if self.medkits_to_remove.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.medkits_to_remove);
        let mut index = 0;
        self.medkits.retain(|_| {
            let keep = !removed.contains(&index);
            index += 1;
            keep
        });
    }

    /// Doors, monsters, medkits, then the gun
    pub fn render_list(&self, assets: &AssetCache) -> Vec<RenderItem> {
        let doors = self.doors.iter().map(|d| RenderItem {
            mesh: MeshKind::Door,
            transform: d.transform.to_matrix(),
            material: assets.level_atlas,
        });
        let monsters = self.monsters.iter().map(|m| RenderItem {
            mesh: MeshKind::Monster,
            transform: m.transform.to_matrix(),
            material: assets.monster_frame(m.frame()),
        });
        let medkits = self.medkits.iter().map(|m| RenderItem {
            mesh: MeshKind::Medkit,
            transform: m.transform.to_matrix(),
            material: assets.medkit,
        });
        let gun = RenderItem {
            mesh: MeshKind::Gun,
            transform: self.player.gun.to_matrix(),
            material: assets.gun,
        };

        doors.chain(monsters).chain(medkits).chain(std::iter::once(gun)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::HeadlessLoader;
    use crate::game::monster::MonsterState;
    use crate::world::parse_map;
    use rand::SeedableRng;

    /// Rows are world X, columns world Z. `specials` marks entities on an
    /// otherwise open floor of '1' tiles; '#' is void.
    fn level_from(specials: &[&str]) -> Level {
        let n = specials.len();
        let mut text = format!("wall1 {{1,0,0,1}}\nlengthmap {}\n", n);
        let floor: Vec<String> = specials
            .iter()
            .map(|row| row.chars().map(|c| if c == '#' { ' ' } else { '1' }).collect())
            .collect();
        for label in ["MAP", "PLANES"] {
            text.push_str(label);
            text.push_str(":\n");
            for row in &floor {
                text.push_str(row);
                text.push('\n');
            }
        }
        text.push_str("SPECIALS:\n");
        for row in specials {
            text.extend(row.chars().map(|c| if c == '#' || c == '.' { ' ' } else { c }));
            text.push('\n');
        }
        Level::new(parse_map(&text).unwrap(), &Tunables::default()).unwrap()
    }

    fn clock(now: f64) -> Clock {
        Clock { now, delta: 0.004 }
    }

    #[test]
    fn test_spawns_entities() {
        let level = level_from(&[
            "#####",
            "#A.e#",
            "#.m.#",
            "#..X#",
            "#####",
        ]);
        assert_eq!(level.monsters.len(), 1);
        assert_eq!(level.medkits.len(), 1);
        assert_eq!(level.exits().len(), 1);
        assert!((level.player.camera.pos.x - 1.5).abs() < 1e-6);
        assert!((level.player.camera.pos.z - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_medkit_removed_after_pickup() {
        let mut level = level_from(&[
            "####",
            "#Am#",
            "#..#",
            "####",
        ]);
        let mut rng = StdRng::seed_from_u64(0);
        level.player.damage(40);
        // Medkit sits one cell along +Z from the player
        level.player.camera.pos.z = 2.2;
        level.update(clock(0.1), &mut rng);
        assert!(level.medkits.is_empty());
        assert_eq!(level.player.health.current, 85);
        assert_eq!(level.events.medkit_collected.len(), 1);
    }

    #[test]
    fn test_interact_opens_door_and_reports_exit() {
        let mut level = level_from(&[
            "#####",
            "#A#.#",
            "#d#X#",
            "#...#",
            "#####",
        ]);
        let mut rng = StdRng::seed_from_u64(0);
        let intent = PlayerIntent { interact: true, ..Default::default() };

        level.player.camera.pos = Vec3::new(2.0, 0.4375, 1.5);
        level.input(&intent, 1.0, &mut rng);
        assert_eq!(level.events.door_opened.len(), 1);
        assert!(level.events.exit_reached.is_empty());

        level.player.camera.pos = Vec3::new(2.5, 0.4375, 3.2);
        level.input(&intent, 1.1, &mut rng);
        assert_eq!(level.events.exit_reached.len(), 1);
        assert_eq!(level.events.door_opened.len(), 1);
    }

    #[test]
    fn test_fire_hits_monster_in_view() {
        let mut level = level_from(&[
            "#####",
            "#e..#",
            "#...#",
            "#A..#",
            "#####",
        ]);
        let mut rng = StdRng::seed_from_u64(3);
        // Face -X toward the monster, off its corner
        level.player.camera.rotate_y(90.0);
        level.player.camera.pos.z = 1.6;
        let intent = PlayerIntent { fire: true, ..Default::default() };
        level.input(&intent, 0.0, &mut rng);

        assert_eq!(level.events.monster_damaged.len(), 1);
        assert_eq!(level.monsters[0].state(), MonsterState::Chase);
    }

    #[test]
    fn test_fire_blocked_by_wall() {
        let mut level = level_from(&[
            "#####",
            "#...#",
            "#...#",
            "#e#A#",
            "#####",
        ]);
        let mut rng = StdRng::seed_from_u64(3);
        // Default view is -Z; the void cell between absorbs the shot
        level.player.camera.pos.x = 3.6;
        let intent = PlayerIntent { fire: true, ..Default::default() };
        level.input(&intent, 0.0, &mut rng);
        assert!(level.events.monster_damaged.is_empty());
        assert_eq!(level.monsters[0].health.current, 100);
    }

    #[test]
    fn test_render_list_order() {
        let level = level_from(&[
            "#####",
            "#A#e#",
            "#d#.#",
            "#.m.#",
            "#####",
        ]);
        let mut loader = HeadlessLoader::new();
        let assets = AssetCache::init(&mut loader).unwrap();
        let kinds: Vec<MeshKind> = level.render_list(&assets).iter().map(|r| r.mesh).collect();
        assert_eq!(kinds, vec![MeshKind::Door, MeshKind::Monster, MeshKind::Medkit, MeshKind::Gun]);
        assert_eq!(level.mesh(MeshKind::Door).vertices.len(), 16);
    }
}
