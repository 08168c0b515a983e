//! Level geometry generation
//!
//! A single pass over the tile grid produces the static level mesh, the
//! wall collision segments and the spawn list. Every occupiable cell gets a
//! floor and a ceiling quad; a wall quad (and a matching collision segment)
//! is emitted only on the edges that border a void cell.

use serde::{Serialize, Deserialize};
use crate::config::{DoorSettings, Tunables, UvSource};
use crate::math::{Vec2, Vec3};
use super::map::{Special, TexRect, TileGrid};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(pos: Vec3, uv: Vec2) -> Self {
        Self { pos, uv, normal: Vec3::ZERO }
    }
}

/// Index order for a quad's two triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    /// 0-1-2, 0-2-3
    Forward,
    /// 2-1-0, 3-2-0
    Reversed,
}

/// Vertex and index buffers, never mutated after generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append four corners as two triangles
    pub fn push_quad(&mut self, corners: [Vec3; 4], tex: TexRect, normal: Vec3, winding: Winding) {
        let start = self.vertices.len() as u32;
        let idx: [u32; 6] = match winding {
            Winding::Forward => [0, 1, 2, 0, 2, 3],
            Winding::Reversed => [2, 1, 0, 3, 2, 0],
        };
        self.indices.extend(idx.iter().map(|i| start + i));

        let uvs = [
            Vec2::new(tex.min_u, tex.max_v),
            Vec2::new(tex.max_u, tex.max_v),
            Vec2::new(tex.max_u, tex.min_v),
            Vec2::new(tex.min_u, tex.min_v),
        ];
        for (pos, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(Vertex { pos, uv, normal });
        }
    }
}

/// Boundary between an occupiable cell and the void, on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionSegment {
    pub start: Vec2,
    pub end: Vec2,
}

/// Cardinal neighbour of a grid cell. Grid X is world X, grid Y is world Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,  // -Z
    South,  // +Z
    West,   // -X
    East,   // +X
}

impl Direction {
    /// Emission order for wall faces
    pub const ALL: [Direction; 4] = [Direction::North, Direction::South, Direction::West, Direction::East];

    /// Get offset in grid coordinates
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
        }
    }

    /// World-space normal pointing into the neighbour
    pub fn normal(self) -> Vec3 {
        let (dx, dz) = self.offset();
        Vec3::new(dx as f32, 0.0, dz as f32)
    }

    fn winding(self) -> Winding {
        match self {
            Direction::North | Direction::East => Winding::Forward,
            Direction::South | Direction::West => Winding::Reversed,
        }
    }
}

/// Axis a door panel spans when closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorOrientation {
    /// Void on both X sides; the panel spans X and slides toward -X
    SpansX,
    /// Void on both Z sides; the panel is yawed 90 degrees and slides toward -Z
    SpansZ,
}

impl DoorOrientation {
    /// Yaw in degrees applied to the door mesh
    pub fn yaw(self) -> f32 {
        match self {
            DoorOrientation::SpansX => 0.0,
            DoorOrientation::SpansZ => 90.0,
        }
    }

    /// Ground-plane footprint (X extent, Z extent)
    pub fn footprint(self, settings: &DoorSettings) -> Vec2 {
        match self {
            DoorOrientation::SpansX => Vec2::new(settings.length, settings.width),
            DoorOrientation::SpansZ => Vec2::new(settings.width, settings.length),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorSpawn {
    pub cell: (usize, usize),
    pub orientation: DoorOrientation,
    pub closed_position: Vec3,
    pub open_position: Vec3,
}

/// Entities to create for a freshly built level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spawns {
    /// Camera position of the player start
    pub player: Vec3,
    pub doors: Vec<DoorSpawn>,
    pub monsters: Vec<Vec3>,
    pub medkits: Vec<Vec3>,
    pub exits: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    pub mesh: Mesh,
    pub segments: Vec<CollisionSegment>,
    pub spawns: Spawns,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("level has no player start")]
    MissingPlayer,
    #[error("second player start at {x},{y}")]
    DuplicatePlayer { x: usize, y: usize },
    #[error("door in an invalid location at {x},{y}")]
    InvalidDoor { x: usize, y: usize },
    #[error("texture code {code:?} at {x},{y} does not resolve")]
    UnresolvedTexture { x: usize, y: usize, code: char },
}

/// Atlas cell for a tile code in a `2^exponent` square atlas
pub fn atlas_rect(code: u8, exponent: u32) -> Option<TexRect> {
    let index = TileGrid::texture_index(code)?;
    let side = 1usize << exponent;
    if index >= side * side {
        return None;
    }
    let cell = 1.0 / side as f32;
    let max_u = 1.0 - (index % side) as f32 * cell;
    let max_v = 1.0 - (index / side) as f32 * cell;
    Some(TexRect::new(max_u, max_u - cell, max_v - cell, max_v))
}

struct Builder<'a> {
    grid: &'a TileGrid,
    tunables: &'a Tunables,
    mesh: Mesh,
    segments: Vec<CollisionSegment>,
    spawns: Spawns,
    player: Option<Vec3>,
}

impl<'a> Builder<'a> {
    fn texture(&self, code: u8, x: usize, y: usize) -> Result<TexRect, GeometryError> {
        let rect = match self.tunables.level.uv_source {
            UvSource::Table => TileGrid::texture_index(code).and_then(|i| self.grid.wall_defs().get(i).copied()),
            UvSource::Atlas => atlas_rect(code, self.tunables.level.tex_exponent),
        };
        rect.ok_or(GeometryError::UnresolvedTexture { x, y, code: char::from(code) })
    }

    fn cell_center(&self, x: usize, y: usize, height: f32) -> Vec3 {
        let level = &self.tunables.level;
        Vec3::new((x as f32 + 0.5) * level.spot_width, height, (y as f32 + 0.5) * level.spot_length)
    }

    fn add_special(&mut self, x: usize, y: usize) -> Result<(), GeometryError> {
        let byte = self.grid.special(x as i32, y as i32);
        let Some(special) = Special::from_byte(byte) else {
            panic!("unrecognized special {:?} at {},{}", char::from(byte), x, y);
        };

        match special {
            Special::PlayerA => {
                if self.player.is_some() {
                    return Err(GeometryError::DuplicatePlayer { x, y });
                }
                self.player = Some(self.cell_center(x, y, self.tunables.player.eye_height));
            }
            Special::Door => {
                let door = self.door_spawn(x, y)?;
                self.spawns.doors.push(door);
            }
            Special::Monster => {
                let pos = self.cell_center(x, y, 0.0);
                self.spawns.monsters.push(pos);
            }
            Special::SmallMedkit => {
                let pos = self.cell_center(x, y, 0.0);
                self.spawns.medkits.push(pos);
            }
            Special::Exit => {
                let pos = self.cell_center(x, y, 0.0);
                self.spawns.exits.push(pos);
            }
            other => {
                if other.is_reserved() {
                    log::debug!("reserved special {:?} at {},{} ignored", other, x, y);
                }
            }
        }
        Ok(())
    }

    fn door_spawn(&self, x: usize, y: usize) -> Result<DoorSpawn, GeometryError> {
        let (gx, gy) = (x as i32, y as i32);
        let void_z = self.grid.is_empty(gx, gy - 1) && self.grid.is_empty(gx, gy + 1);
        let void_x = self.grid.is_empty(gx - 1, gy) && self.grid.is_empty(gx + 1, gy);
        let level = &self.tunables.level;
        let slide = self.tunables.door.open_movement;

        let (orientation, closed_position, offset) = match (void_x, void_z) {
            (true, false) => (
                DoorOrientation::SpansX,
                Vec3::new(x as f32 * level.spot_width, 0.0, (y as f32 + 0.5) * level.spot_length),
                Vec3::new(slide, 0.0, 0.0),
            ),
            (false, true) => (
                DoorOrientation::SpansZ,
                Vec3::new((x as f32 + 0.5) * level.spot_width, 0.0, y as f32 * level.spot_length),
                Vec3::new(0.0, 0.0, slide),
            ),
            _ => return Err(GeometryError::InvalidDoor { x, y }),
        };

        Ok(DoorSpawn {
            cell: (x, y),
            orientation,
            closed_position,
            open_position: closed_position - offset,
        })
    }

    fn add_cell(&mut self, x: usize, y: usize) -> Result<(), GeometryError> {
        let (gx, gy) = (x as i32, y as i32);
        let (sw, sh, sl) = (
            self.tunables.level.spot_width,
            self.tunables.level.spot_height,
            self.tunables.level.spot_length,
        );
        let (x0, x1) = (x as f32 * sw, (x + 1) as f32 * sw);
        let (z0, z1) = (y as f32 * sl, (y + 1) as f32 * sl);

        // Floor and ceiling share the plane texture, wound in opposite directions
        let plane = self.texture(self.grid.plane(gx, gy), x, y)?;
        for (height, normal, winding) in [
            (0.0, Vec3::UP, Winding::Reversed),
            (sh, -Vec3::UP, Winding::Forward),
        ] {
            let corners = [
                Vec3::new(x0, height, z0),
                Vec3::new(x1, height, z0),
                Vec3::new(x1, height, z1),
                Vec3::new(x0, height, z1),
            ];
            self.mesh.push_quad(corners, plane, normal, winding);
        }

        let wall = self.texture(self.grid.wall(gx, gy), x, y)?;
        for dir in Direction::ALL {
            let (dx, dy) = dir.offset();
            if !self.grid.is_empty(gx + dx, gy + dy) {
                continue;
            }

            let (start, end) = match dir {
                Direction::North => (Vec2::new(x0, z0), Vec2::new(x1, z0)),
                Direction::South => (Vec2::new(x0, z1), Vec2::new(x1, z1)),
                Direction::West => (Vec2::new(x0, z0), Vec2::new(x0, z1)),
                Direction::East => (Vec2::new(x1, z0), Vec2::new(x1, z1)),
            };
            self.segments.push(CollisionSegment { start, end });

            let corners = [
                Vec3::new(start.x, 0.0, start.y),
                Vec3::new(end.x, 0.0, end.y),
                Vec3::new(end.x, sh, end.y),
                Vec3::new(start.x, sh, start.y),
            ];
            self.mesh.push_quad(corners, wall, dir.normal(), dir.winding());
        }
        Ok(())
    }
}

/// Build the static mesh, collision segments and spawn list for a grid.
///
/// Panics on a special byte outside the known code table; parsed grids
/// never contain one.
pub fn build_level(grid: &TileGrid, tunables: &Tunables) -> Result<LevelLayout, GeometryError> {
    let mut builder = Builder {
        grid,
        tunables,
        mesh: Mesh::default(),
        segments: Vec::new(),
        spawns: Spawns::default(),
        player: None,
    };

    for x in 0..grid.width() {
        for y in 0..grid.height() {
            if grid.is_empty(x as i32, y as i32) {
                continue;
            }
            builder.add_special(x, y)?;
            builder.add_cell(x, y)?;
        }
    }

    let Builder { mesh, segments, mut spawns, player, .. } = builder;
    spawns.player = player.ok_or(GeometryError::MissingPlayer)?;

    Ok(LevelLayout { mesh, segments, spawns })
}

/// Sliding door box: two broad faces and two narrow end caps
pub fn door_mesh(settings: &DoorSettings) -> Mesh {
    let (l, h, w) = (settings.length, settings.height, settings.width);
    let v = |x: f32, y: f32, z: f32, u: f32, tv: f32| Vertex::new(Vec3::new(x, y, z), Vec2::new(u, tv));

    let vertices = vec![
        // front
        v(0.0, 0.0, 0.0, 0.5, 1.0),
        v(0.0, h, 0.0, 0.5, 0.75),
        v(l, h, 0.0, 0.75, 0.75),
        v(l, 0.0, 0.0, 0.75, 1.0),
        // near end
        v(0.0, 0.0, 0.0, 0.73, 1.0),
        v(0.0, h, 0.0, 0.73, 0.75),
        v(0.0, h, w, 0.75, 0.75),
        v(0.0, 0.0, w, 0.75, 1.0),
        // back
        v(0.0, 0.0, w, 0.5, 1.0),
        v(0.0, h, w, 0.5, 0.75),
        v(l, h, w, 0.75, 0.75),
        v(l, 0.0, w, 0.75, 1.0),
        // far end
        v(l, 0.0, 0.0, 0.73, 1.0),
        v(l, h, 0.0, 0.73, 0.75),
        v(l, h, w, 0.75, 0.75),
        v(l, 0.0, w, 0.75, 1.0),
    ];
    let indices = vec![
        0, 1, 2, 0, 2, 3,
        6, 5, 4, 7, 6, 4,
        10, 9, 8, 11, 10, 8,
        12, 13, 14, 12, 14, 15,
    ];
    Mesh { vertices, indices }
}

/// Proportions of a camera-facing sprite quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteShape {
    /// Texture height over width
    pub aspect: f32,
    /// Quad height in world units
    pub scale: f32,
    /// Extra horizontal squeeze applied to the half width
    pub squeeze: f32,
}

impl SpriteShape {
    pub const MONSTER: SpriteShape = SpriteShape { aspect: 1.931_034_5, scale: 0.7, squeeze: 2.0 };
    pub const MEDKIT: SpriteShape = SpriteShape { aspect: 0.678_571_4, scale: 0.25, squeeze: 2.5 };
    pub const GUN: SpriteShape = SpriteShape { aspect: 1.037_974_7, scale: 0.0625, squeeze: 2.0 };

    pub fn half_width(&self) -> f32 {
        self.scale / (self.aspect * self.squeeze)
    }
}

/// Upright quad standing on the origin, mirrored in U
pub fn sprite_mesh(shape: SpriteShape) -> Mesh {
    let (sx, sy) = (shape.half_width(), shape.scale);
    let vertices = vec![
        Vertex::new(Vec3::new(-sx, 0.0, 0.0), Vec2::new(-1.0, 1.0)),
        Vertex::new(Vec3::new(-sx, sy, 0.0), Vec2::new(-1.0, 0.0)),
        Vertex::new(Vec3::new(sx, sy, 0.0), Vec2::new(0.0, 0.0)),
        Vertex::new(Vec3::new(sx, 0.0, 0.0), Vec2::new(0.0, 1.0)),
    ];
    Mesh { vertices, indices: vec![0, 1, 2, 0, 2, 3] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::map::parse_map;

    const TABLE: &str = "wall1 {0.25,0,0.75,1}\nwall2 {0.5,0.25,0.75,1}\n";

    /// Build map text from rows of equal width; `walls` and `planes` use
    /// '1' for every cell that is not a space in `specials_or_floor`.
    fn grid_from(rows: &[&str]) -> TileGrid {
        let size = rows.len();
        let mut text = format!("{}lengthmap       {}\n", TABLE, size);
        let block = |f: &dyn Fn(char) -> char| {
            rows.iter().map(|r| r.chars().map(f).collect::<String>() + "\n").collect::<String>()
        };
        text += "MAP:\n";
        text += &block(&|c| if c == '#' { ' ' } else { '1' });
        text += "PLANES:\n";
        text += &block(&|c| if c == '#' { ' ' } else { '2' });
        text += "SPECIALS:\n";
        text += &block(&|c| if c == '#' || c == '.' { ' ' } else { c });
        parse_map(&text).unwrap()
    }

    #[test]
    fn test_open_room_counts() {
        // 3x3 open room inside a void border
        let grid = grid_from(&["#####", "#...#", "#.A.#", "#...#", "#####"]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();

        // 9 cells * (floor + ceiling) + 12 boundary walls = 30 quads
        assert_eq!(layout.mesh.indices.len(), 30 * 6);
        assert_eq!(layout.mesh.vertices.len(), 30 * 4);
        assert_eq!(layout.segments.len(), 12);
        assert_eq!(layout.spawns.player, Vec3::new(2.5, 0.4375, 2.5));
    }

    #[test]
    fn test_border_cells_treat_outside_as_void() {
        let grid = grid_from(&["A.", ".."]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();
        // 4 cells, 8 outer edges
        assert_eq!(layout.segments.len(), 8);
        assert_eq!(layout.mesh.triangle_count(), (4 * 2 + 8) * 2);
    }

    #[test]
    fn test_wall_segment_positions() {
        let grid = grid_from(&["###", "#A#", "###"]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();
        let expected = [
            CollisionSegment { start: Vec2::new(1.0, 1.0), end: Vec2::new(2.0, 1.0) },
            CollisionSegment { start: Vec2::new(1.0, 2.0), end: Vec2::new(2.0, 2.0) },
            CollisionSegment { start: Vec2::new(1.0, 1.0), end: Vec2::new(1.0, 2.0) },
            CollisionSegment { start: Vec2::new(2.0, 1.0), end: Vec2::new(2.0, 2.0) },
        ];
        assert_eq!(layout.segments, expected);
    }

    #[test]
    fn test_floor_and_ceiling_wound_oppositely() {
        let grid = grid_from(&["###", "#A#", "###"]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();
        assert_eq!(&layout.mesh.indices[0..6], &[2, 1, 0, 3, 2, 0]);
        assert_eq!(&layout.mesh.indices[6..12], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(layout.mesh.vertices[4].pos.y, 1.0);
    }

    #[test]
    fn test_table_uvs() {
        let grid = grid_from(&["###", "#A#", "###"]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();
        // Floor uses the plane code '2'
        assert_eq!(layout.mesh.vertices[0].uv, Vec2::new(0.25, 1.0));
        assert_eq!(layout.mesh.vertices[1].uv, Vec2::new(0.5, 1.0));
        assert_eq!(layout.mesh.vertices[2].uv, Vec2::new(0.5, 0.75));
    }

    #[test]
    fn test_atlas_rect() {
        let first = atlas_rect(b'1', 4).unwrap();
        assert_eq!(first, TexRect::new(1.0, 0.9375, 0.9375, 1.0));
        let second = atlas_rect(b'2', 4).unwrap();
        assert!((second.max_u - 0.9375).abs() < 1e-6);
        assert_eq!(second.max_v, 1.0);
        assert!(atlas_rect(b'0', 4).is_none());
        // 2x2 atlas holds four cells
        assert!(atlas_rect(b'4', 1).is_some());
        assert!(atlas_rect(b'5', 1).is_none());
    }

    #[test]
    fn test_unresolved_texture() {
        let mut text = format!("{}lengthmap       1\n", TABLE);
        text += "MAP:\n7\nPLANES:\n1\nSPECIALS:\nA\n";
        let grid = parse_map(&text).unwrap();
        let err = build_level(&grid, &Tunables::default()).unwrap_err();
        assert_eq!(err, GeometryError::UnresolvedTexture { x: 0, y: 0, code: '7' });
    }

    #[test]
    fn test_player_count() {
        let none = grid_from(&["###", "#.#", "###"]);
        assert_eq!(build_level(&none, &Tunables::default()), Err(GeometryError::MissingPlayer));

        let two = grid_from(&["####", "#AA#", "####", "####"]);
        assert_eq!(
            build_level(&two, &Tunables::default()),
            Err(GeometryError::DuplicatePlayer { x: 1, y: 2 })
        );
    }

    #[test]
    fn test_door_orientation() {
        // Corridor along grid Y: void on both X sides of the door
        let grid = grid_from(&["#####", "#####", "A.d.e", "#####", "#####"]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();
        let door = layout.spawns.doors[0];
        assert_eq!(door.orientation, DoorOrientation::SpansX);
        assert_eq!(door.closed_position, Vec3::new(2.0, 0.0, 2.5));
        assert!((door.open_position.x - 1.1).abs() < 1e-6);

        // Corridor along grid X
        let grid = grid_from(&["##A##", "##.##", "##d##", "##.##", "#####"]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();
        let door = layout.spawns.doors[0];
        assert_eq!(door.orientation, DoorOrientation::SpansZ);
        assert_eq!(door.orientation.yaw(), 90.0);
        assert_eq!(door.closed_position, Vec3::new(2.5, 0.0, 2.0));
        assert!((door.open_position.z - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_ambiguous_door_rejected() {
        let open = grid_from(&["...", ".d.", "A.."]);
        assert_eq!(
            build_level(&open, &Tunables::default()),
            Err(GeometryError::InvalidDoor { x: 1, y: 1 })
        );
        let boxed = grid_from(&["###", "#d#", "###"]);
        assert_eq!(
            build_level(&boxed, &Tunables::default()),
            Err(GeometryError::InvalidDoor { x: 1, y: 1 })
        );
    }

    #[test]
    fn test_spawns_and_reserved_codes() {
        let grid = grid_from(&["#####", "#AeX#", "#mRV#", "#####", "#####"]);
        let layout = build_level(&grid, &Tunables::default()).unwrap();
        assert_eq!(layout.spawns.monsters, vec![Vec3::new(1.5, 0.0, 2.5)]);
        assert_eq!(layout.spawns.exits, vec![Vec3::new(1.5, 0.0, 3.5)]);
        assert_eq!(layout.spawns.medkits, vec![Vec3::new(2.5, 0.0, 1.5)]);
        assert!(layout.spawns.doors.is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let grid = grid_from(&["#####", "#A.e#", "#...#", "#m..#", "#####"]);
        let a = build_level(&grid, &Tunables::default()).unwrap();
        let b = build_level(&grid, &Tunables::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "unrecognized special")]
    fn test_unknown_special_panics() {
        let grid = grid_from(&["###", "#A#", "###"]).with_special(1, 1, b'?');
        let _ = build_level(&grid, &Tunables::default());
    }

    #[test]
    fn test_door_mesh_shape() {
        let mesh = door_mesh(&DoorSettings::default());
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.triangle_count(), 8);
        assert!(mesh.vertices.iter().all(|v| v.pos.z <= 0.125));
    }

    #[test]
    fn test_sprite_mesh_proportions() {
        let mesh = sprite_mesh(SpriteShape::MONSTER);
        assert_eq!(mesh.vertices.len(), 4);
        assert!((mesh.vertices[1].pos.y - 0.7).abs() < 1e-6);
        assert!((mesh.vertices[2].pos.x - 0.7 / (1.931_034_5 * 2.0)).abs() < 1e-6);
    }
}
