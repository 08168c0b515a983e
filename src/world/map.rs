//! Tile map text format
//!
//! A map file starts with a table of texture rectangles, one per line:
//!
//! ```text
//! wall1 {0.25,0.0,0.75,1.0}
//! wall2 {0.5,0.25,0.75,1.0}
//! lengthmap       5
//! MAP:
//! ```
//!
//! followed by three square blocks (`MAP:`, `PLANES:`, `SPECIALS:`), each
//! `size` rows of exactly `size` bytes terminated by `\n`. Row `x` of a block
//! is grid X (world X), column `y` is grid Y (world Z). A space in all three
//! blocks marks a void cell; everything else is occupiable floor space whose
//! wall and plane bytes are 1-based indices (`'1'` is the first rectangle).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Byte marking "nothing here" in every block
pub const EMPTY: u8 = b' ';

/// Special tile codes
///
/// Weapon, ammo, big medkit, visor and second-player codes are reserved:
/// they parse, but the level builder spawns nothing for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    Empty,
    PlayerA,
    PlayerB,
    Pistol,
    Gun,
    Rocket,
    Plasma,
    Chaingun,
    PistolAmmo,
    GunAmmo,
    RocketAmmo,
    PlasmaAmmo,
    BigMedkit,
    SmallMedkit,
    Visor,
    Door,
    Monster,
    Exit,
}

impl Special {
    pub const ALL: [Special; 18] = [
        Special::Empty,
        Special::PlayerA,
        Special::PlayerB,
        Special::Pistol,
        Special::Gun,
        Special::Rocket,
        Special::Plasma,
        Special::Chaingun,
        Special::PistolAmmo,
        Special::GunAmmo,
        Special::RocketAmmo,
        Special::PlasmaAmmo,
        Special::BigMedkit,
        Special::SmallMedkit,
        Special::Visor,
        Special::Door,
        Special::Monster,
        Special::Exit,
    ];

    pub fn to_byte(self) -> u8 {
        match self {
            Special::Empty => EMPTY,
            Special::PlayerA => b'A',
            Special::PlayerB => b'B',
            Special::Pistol => b'P',
            Special::Gun => b'G',
            Special::Rocket => b'R',
            Special::Plasma => b'S',
            Special::Chaingun => b'C',
            Special::PistolAmmo => b'I',
            Special::GunAmmo => b'U',
            Special::RocketAmmo => b'O',
            Special::PlasmaAmmo => b'L',
            Special::BigMedkit => b'M',
            Special::SmallMedkit => b'm',
            Special::Visor => b'V',
            Special::Door => b'd',
            Special::Monster => b'e',
            Special::Exit => b'X',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Special> {
        Special::ALL.iter().copied().find(|s| s.to_byte() == byte)
    }

    /// Parses without spawning anything
    pub fn is_reserved(self) -> bool {
        !matches!(
            self,
            Special::Empty
                | Special::PlayerA
                | Special::SmallMedkit
                | Special::Door
                | Special::Monster
                | Special::Exit
        )
    }
}

/// Texture rectangle in atlas UV space, stored in file order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TexRect {
    pub max_u: f32,
    pub min_u: f32,
    pub min_v: f32,
    pub max_v: f32,
}

impl TexRect {
    pub fn new(max_u: f32, min_u: f32, min_v: f32, max_v: f32) -> Self {
        Self { max_u, min_u, min_v, max_v }
    }
}

impl fmt::Display for TexRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{:.2}, {:.2}, {:.2}, {:.2}}}", self.max_u, self.min_u, self.min_v, self.max_v)
    }
}

/// Map text parse failures (line numbers are 1-based)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("invalid wall row at line {line}")]
    InvalidWallRow { line: usize },
    #[error("wall{index} declared twice (second time at line {line})")]
    DuplicateWall { index: usize, line: usize },
    #[error("wall{index} is missing from the wall table")]
    MissingWall { index: usize },
    #[error("no valid lengthmap declaration at line {line}")]
    InvalidLength { line: usize },
    #[error("could not match {label} declaration at line {line}")]
    MissingLabel { label: &'static str, line: usize },
    #[error("not enough data at line {line}")]
    NotEnoughData { line: usize },
    #[error("invalid line termination at line {line} ({byte})")]
    InvalidTermination { line: usize, byte: u8 },
    #[error("unknown special {byte:?} at line {line}, column {column}")]
    UnknownSpecial { byte: char, line: usize, column: usize },
}

/// A map file that could not be read or parsed
#[derive(Debug, thiserror::Error)]
pub enum MapLoadError {
    #[error("{}: {source}", .file.display())]
    Io { file: PathBuf, source: std::io::Error },
    #[error("{}: {source}", .file.display())]
    Parse { file: PathBuf, source: MapError },
}

/// Parsed map: three square byte grids plus the wall texture table.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    size: usize,
    walls: Vec<u8>,
    planes: Vec<u8>,
    specials: Vec<u8>,
    wall_defs: Vec<TexRect>,
}

impl TileGrid {
    pub fn width(&self) -> usize {
        self.size
    }

    pub fn height(&self) -> usize {
        self.size
    }

    pub fn wall_defs(&self) -> &[TexRect] {
        &self.wall_defs
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.size || y as usize >= self.size {
            return None;
        }
        Some(x as usize * self.size + y as usize)
    }

    /// True when the cell is void in all three blocks. Coordinates outside
    /// the grid count as empty so border cells can query their neighbours.
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some(i) => self.walls[i] == EMPTY && self.planes[i] == EMPTY && self.specials[i] == EMPTY,
            None => true,
        }
    }

    pub fn wall(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(EMPTY, |i| self.walls[i])
    }

    pub fn plane(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(EMPTY, |i| self.planes[i])
    }

    pub fn special(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(EMPTY, |i| self.specials[i])
    }

    /// Table index referenced by a grid byte (`'1'` -> 0)
    pub fn texture_index(code: u8) -> Option<usize> {
        code.checked_sub(b'0')?.checked_sub(1).map(usize::from)
    }

    fn lookup(&self, code: u8) -> Option<TexRect> {
        Self::texture_index(code).and_then(|i| self.wall_defs.get(i).copied())
    }

    /// Wall texture rectangle for a cell, `None` if its code is undeclared
    pub fn wall_tex(&self, x: i32, y: i32) -> Option<TexRect> {
        self.lookup(self.wall(x, y))
    }

    /// Floor/ceiling texture rectangle for a cell
    pub fn plane_tex(&self, x: i32, y: i32) -> Option<TexRect> {
        self.lookup(self.plane(x, y))
    }

    #[cfg(test)]
    pub(crate) fn with_special(mut self, x: usize, y: usize, byte: u8) -> Self {
        self.specials[x * self.size + y] = byte;
        self
    }

    /// Count of non-empty cells
    pub fn open_cells(&self) -> usize {
        (0..self.size as i32)
            .flat_map(|x| (0..self.size as i32).map(move |y| (x, y)))
            .filter(|&(x, y)| !self.is_empty(x, y))
            .count()
    }
}

/// Line-oriented byte reader that tracks the current line number
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0, line: 1 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn peek_line(&self) -> &'a [u8] {
        let rest = &self.bytes[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        &rest[..end]
    }

    fn next_line(&mut self) -> &'a [u8] {
        let line = self.peek_line();
        self.pos = (self.pos + line.len() + 1).min(self.bytes.len());
        self.line += 1;
        line
    }

    fn expect_label(&mut self, label: &'static str) -> Result<(), MapError> {
        let line = self.line;
        let text = self.next_line();
        if text.strip_suffix(b":") == Some(label.as_bytes()) {
            Ok(())
        } else {
            Err(MapError::MissingLabel { label, line })
        }
    }

    /// One block of `size` rows, each exactly `size` bytes plus `\n`
    fn read_block(&mut self, size: usize) -> Result<Vec<u8>, MapError> {
        let mut block = Vec::new();
        for _ in 0..size {
            let rest = &self.bytes[self.pos..];
            if rest.len() < size || rest[..size].contains(&b'\n') {
                return Err(MapError::NotEnoughData { line: self.line });
            }
            match rest.get(size) {
                Some(b'\n') => {}
                Some(&byte) => return Err(MapError::InvalidTermination { line: self.line, byte }),
                None => return Err(MapError::NotEnoughData { line: self.line }),
            }
            block.extend_from_slice(&rest[..size]);
            self.pos += size + 1;
            self.line += 1;
        }
        Ok(block)
    }
}

fn parse_wall_row(text: &[u8]) -> Option<(usize, TexRect)> {
    let text = std::str::from_utf8(text).ok()?;
    let rest = text.strip_prefix("wall")?;
    let (index, body) = rest.split_once('{')?;
    let index: usize = index.trim().parse().ok()?;
    let body = body.trim_end().strip_suffix('}')?;

    let mut coords = [0.0f32; 4];
    let mut parts = body.split(',');
    for c in coords.iter_mut() {
        *c = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some((index, TexRect::new(coords[0], coords[1], coords[2], coords[3])))
}

fn parse_length(text: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(text).ok()?;
    let size: usize = text.strip_prefix("lengthmap")?.trim().parse().ok()?;
    (size > 0).then_some(size)
}

/// Parse map text into a grid
pub fn parse_map(text: &str) -> Result<TileGrid, MapError> {
    let mut reader = Reader::new(text.as_bytes());

    // Wall table: any order in the file, stored by ascending index
    let mut declared: BTreeMap<usize, TexRect> = BTreeMap::new();
    while reader.peek_line().starts_with(b"wall") {
        let line = reader.line;
        let (index, rect) = parse_wall_row(reader.next_line())
            .filter(|&(index, _)| index > 0)
            .ok_or(MapError::InvalidWallRow { line })?;
        if declared.insert(index, rect).is_some() {
            return Err(MapError::DuplicateWall { index, line });
        }
    }
    let wall_defs = declared
        .iter()
        .enumerate()
        .map(|(i, (&index, &rect))| if index == i + 1 { Ok(rect) } else { Err(MapError::MissingWall { index: i + 1 }) })
        .collect::<Result<Vec<_>, _>>()?;

    let line = reader.line;
    let size = parse_length(reader.next_line()).ok_or(MapError::InvalidLength { line })?;
    // A declared size must fit at least one block in what is left of the file
    let block_bytes = size.checked_add(1).and_then(|row| row.checked_mul(size));
    if block_bytes.map_or(true, |n| n > reader.remaining()) {
        return Err(MapError::InvalidLength { line });
    }

    reader.expect_label("MAP")?;
    let walls = reader.read_block(size)?;
    reader.expect_label("PLANES")?;
    let planes = reader.read_block(size)?;
    reader.expect_label("SPECIALS")?;
    let specials_line = reader.line;
    let specials = reader.read_block(size)?;

    if let Some(i) = specials.iter().position(|&b| Special::from_byte(b).is_none()) {
        return Err(MapError::UnknownSpecial {
            byte: char::from(specials[i]),
            line: specials_line + i / size,
            column: i % size + 1,
        });
    }

    Ok(TileGrid { size, walls, planes, specials, wall_defs })
}

/// Read and parse a map file
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<TileGrid, MapLoadError> {
    let file = path.as_ref().to_path_buf();
    let text = match fs::read_to_string(&file) {
        Ok(text) => text,
        Err(source) => return Err(MapLoadError::Io { file, source }),
    };
    match parse_map(&text) {
        Ok(grid) => {
            log::debug!(
                "parsed {}: {}x{} grid, {} wall textures",
                file.display(), grid.width(), grid.height(), grid.wall_defs().len()
            );
            Ok(grid)
        }
        Err(source) => Err(MapLoadError::Parse { file, source }),
    }
}
