//! Collision System
//!
//! Axis-separated sweep of an entity's ground footprint against every void
//! cell of the tile grid and every door's current rectangle. The result is a
//! per-axis multiplier: 1 where the move is allowed, 0 where it is blocked.
//! Movers multiply their direction by it, so a blocked diagonal move slides
//! along the wall instead of stopping.

use crate::math::{Vec2, Vec3};
use crate::world::{CollisionSegment, TileGrid};
use super::components::Footprint;
use super::door::Door;

/// Per-axis allow mask of `old -> new` against one obstacle.
///
/// `half` is the mover's half extent. The X test uses the new X with the old
/// Y, the Y test the old X with the new Y.
pub fn rect_collide(old: Vec2, new: Vec2, half: Vec2, obstacle: Footprint) -> Vec2 {
    let min = obstacle.pos;
    let max = obstacle.pos + obstacle.size;
    let apart = |x: f32, y: f32| {
        x + half.x < min.x || x - half.x > max.x || y + half.y < min.y || y - half.y > max.y
    };

    Vec2::new(
        if apart(new.x, old.y) { 1.0 } else { 0.0 },
        if apart(old.x, new.y) { 1.0 } else { 0.0 },
    )
}

/// Read-only view of everything that blocks movement and rays in a level
#[derive(Clone, Copy)]
pub struct Obstacles<'a> {
    pub grid: &'a TileGrid,
    pub segments: &'a [CollisionSegment],
    pub doors: &'a [Door],
    /// World size of one grid cell (width, length)
    pub spot: Vec2,
}

impl<'a> Obstacles<'a> {
    /// Footprints of all void cells inside the grid
    fn void_cells(&self) -> impl Iterator<Item = Footprint> + '_ {
        let size = self.grid.width() as i32;
        (0..size)
            .flat_map(move |x| (0..size).map(move |y| (x, y)))
            .filter(|&(x, y)| self.grid.is_empty(x, y))
            .map(|(x, y)| Footprint::new(Vec2::new(x as f32, y as f32).mul_elem(self.spot), self.spot))
    }

    /// Allow mask for moving from `old` to `new` with half extent `half`.
    /// Y of the result is always 0; a zero-length move is always allowed.
    pub fn check_collision(&self, old: Vec3, new: Vec3, half: Vec2) -> Vec3 {
        if (new - old).len() == 0.0 {
            return Vec3::new(1.0, 0.0, 1.0);
        }

        let (old2, new2) = (old.xz(), new.xz());
        let mut mask = Vec2::new(1.0, 1.0);
        for cell in self.void_cells() {
            mask = mask.mul_elem(rect_collide(old2, new2, half, cell));
        }
        for door in self.doors {
            mask = mask.mul_elem(rect_collide(old2, new2, half, door.footprint()));
        }

        Vec3::new(mask.x, 0.0, mask.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DoorSettings;
    use crate::world::{DoorOrientation, DoorSpawn, parse_map};

    fn room() -> TileGrid {
        // 3x3 open room inside a void border
        let text = "wall1 {1,0,0,1}\nlengthmap       5\n\
            MAP:\n     \n 111 \n 111 \n 111 \n     \n\
            PLANES:\n     \n 111 \n 111 \n 111 \n     \n\
            SPECIALS:\n     \n  A  \n     \n     \n     \n";
        parse_map(text).unwrap()
    }

    fn obstacles<'a>(grid: &'a TileGrid, doors: &'a [Door]) -> Obstacles<'a> {
        Obstacles { grid, segments: &[], doors, spot: Vec2::new(1.0, 1.0) }
    }

    const HALF: Vec2 = Vec2::new(0.2, 0.2);

    #[test]
    fn test_rect_collide_blocks_moving_axis() {
        let wall = Footprint::square(Vec2::new(2.0, 1.0), 1.0);
        let mask = rect_collide(Vec2::new(1.5, 1.5), Vec2::new(1.85, 1.5), HALF, wall);
        assert_eq!(mask, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_rect_collide_uses_true_extent() {
        // A 0.125 wide obstacle must not shrink to 0.125 * 0.125
        let door = Footprint::new(Vec2::new(2.0, 0.0), Vec2::new(0.125, 5.0));
        let mask = rect_collide(Vec2::new(2.4, 2.0), Vec2::new(2.3, 2.0), HALF, door);
        assert_eq!(mask.x, 0.0);
    }

    #[test]
    fn test_zero_move_allowed() {
        let grid = room();
        let o = obstacles(&grid, &[]);
        let p = Vec3::new(1.2, 0.0, 1.2);
        assert_eq!(o.check_collision(p, p, HALF), Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_open_space_allowed() {
        let grid = room();
        let o = obstacles(&grid, &[]);
        let mask = o.check_collision(Vec3::new(2.5, 0.0, 2.5), Vec3::new(2.6, 0.0, 2.4), HALF);
        assert_eq!(mask, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_wall_slide() {
        let grid = room();
        let o = obstacles(&grid, &[]);
        // Diagonal move into the -X wall keeps the Z component
        let mask = o.check_collision(Vec3::new(1.25, 0.0, 2.5), Vec3::new(1.15, 0.0, 2.6), HALF);
        assert_eq!(mask, Vec3::new(0.0, 0.0, 1.0));

        // Same against the +Z wall keeps X
        let mask = o.check_collision(Vec3::new(2.5, 0.0, 3.75), Vec3::new(2.6, 0.0, 3.85), HALF);
        assert_eq!(mask, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_closed_door_blocks() {
        let grid = room();
        let spawn = DoorSpawn {
            cell: (2, 2),
            orientation: DoorOrientation::SpansX,
            closed_position: Vec3::new(2.0, 0.0, 2.5),
            open_position: Vec3::new(1.1, 0.0, 2.5),
        };
        let doors = [Door::new(&spawn, &DoorSettings::default())];
        let o = obstacles(&grid, &doors);
        let mask = o.check_collision(Vec3::new(2.5, 0.0, 2.2), Vec3::new(2.5, 0.0, 2.35), HALF);
        assert_eq!(mask.z, 0.0);
    }
}
