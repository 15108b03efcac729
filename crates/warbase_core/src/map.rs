//! Battlefield grid: terrain elements, 2×2 pieces and occupancy flags.
//!
//! Every cell is one byte:
//!
//! | bits | meaning |
//! |------|---------|
//! | 0–4  | element code ([`Element`]) |
//! | 5    | not the anchor corner of its 2×2 piece |
//! | 6    | a robot, bullet or decoration occupies the cell |
//! | 7    | the player ship is over the cell |
//!
//! Pieces are written as 2×2 footprints whose anchor is the lowest-x,
//! lowest-y corner. Reads outside the grid never index memory: they report a
//! fence, which is impassable for everything.

use serde::{Deserialize, Serialize};

/// Number of map columns.
pub const MAP_WIDTH: i16 = 512;

/// Number of map rows.
pub const MAP_HEIGHT: i16 = 16;

/// Lowest column a robot may stand on.
pub const MIN_ROBOT_X: i16 = 14;

/// Highest column a robot may stand on.
pub const MAX_ROBOT_X: i16 = MAP_WIDTH - 15;

const ELEMENT_MASK: u8 = 0b0001_1111;
const NOT_ANCHOR_BIT: u8 = 1 << 5;
const OCCUPIED_BIT: u8 = 1 << 6;
const PLAYER_BIT: u8 = 1 << 7;

/// Terrain, debris and structure element codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Element {
    /// Open ground.
    Empty = 0,
    /// Broken ground.
    Rough = 1,
    /// Debris left by explosions.
    Rubble = 2,
    /// Blast crater.
    Crater = 3,
    /// Low hill.
    HillLow = 4,
    /// Medium hill.
    HillMid = 5,
    /// High hill.
    HillHigh = 6,
    /// Ridge (last element bipods can cross).
    Ridge = 7,
    /// Rock field.
    Rocks = 8,
    /// High rock field.
    RocksHigh = 9,
    /// Cliff.
    Cliff = 10,
    /// High cliff (last element tracks can cross).
    CliffHigh = 11,
    /// Mountain.
    Mountain = 12,
    /// High mountain.
    MountainHigh = 13,
    /// Peak (last element antigrav can cross).
    Peak = 14,
    /// Map boundary fence.
    Fence = 15,
    /// Wall block.
    Wall = 16,
    /// Warbase side wall.
    WarbaseWall = 17,
    /// Warbase central block.
    WarbaseCore = 18,
    /// Factory side wall.
    FactoryWall = 19,
    /// Factory body.
    FactoryBody = 20,
    /// Remains of a destroyed building.
    Ruins = 21,
}

/// Terrain height per element code.
const ELEMENT_HEIGHT: [u8; 22] = [
    0, 1, 2, 3, // flat and debris
    4, 6, 8, 10, // hills
    12, 16, 20, 24, // rocks and cliffs
    32, 40, 48, // mountains
    64, 16, // fence, wall
    24, 28, 20, 24, // structures
    8,  // ruins
];

impl Element {
    /// Decode a 5-bit code. Unknown codes read as a fence.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code & ELEMENT_MASK {
            0 => Self::Empty,
            1 => Self::Rough,
            2 => Self::Rubble,
            3 => Self::Crater,
            4 => Self::HillLow,
            5 => Self::HillMid,
            6 => Self::HillHigh,
            7 => Self::Ridge,
            8 => Self::Rocks,
            9 => Self::RocksHigh,
            10 => Self::Cliff,
            11 => Self::CliffHigh,
            12 => Self::Mountain,
            13 => Self::MountainHigh,
            14 => Self::Peak,
            16 => Self::Wall,
            17 => Self::WarbaseWall,
            18 => Self::WarbaseCore,
            19 => Self::FactoryWall,
            20 => Self::FactoryBody,
            21 => Self::Ruins,
            _ => Self::Fence,
        }
    }

    /// Raw element code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Terrain height of this element.
    #[must_use]
    pub const fn height(self) -> u8 {
        ELEMENT_HEIGHT[self as usize]
    }

    /// Natural terrain that a nuclear blast flattens.
    #[must_use]
    pub const fn is_blast_eligible(self) -> bool {
        matches!(self.code(), 4..=14)
    }

    /// Part of a building.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(
            self,
            Self::WarbaseWall | Self::WarbaseCore | Self::FactoryWall | Self::FactoryBody
        )
    }
}

/// One packed map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell(u8);

impl Cell {
    /// Wrap a raw byte.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Element in this cell.
    #[must_use]
    pub const fn element(self) -> Element {
        Element::from_code(self.0 & ELEMENT_MASK)
    }

    /// Raw element code (bits 0–4).
    #[must_use]
    pub const fn element_code(self) -> u8 {
        self.0 & ELEMENT_MASK
    }

    /// True for the anchor corner of a piece (and for empty cells).
    #[must_use]
    pub const fn is_anchor(self) -> bool {
        self.0 & NOT_ANCHOR_BIT == 0
    }

    /// A robot, bullet or decoration is here.
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        self.0 & OCCUPIED_BIT != 0
    }

    /// The player ship is over this cell.
    #[must_use]
    pub const fn has_player(self) -> bool {
        self.0 & PLAYER_BIT != 0
    }

    const fn with_element(self, element: Element, anchor: bool) -> Self {
        let flags = self.0 & (OCCUPIED_BIT | PLAYER_BIT);
        let anchor_bit = if anchor || matches!(element, Element::Empty) {
            0
        } else {
            NOT_ANCHOR_BIT
        };
        Self(flags | anchor_bit | element.code())
    }

    const fn with_flag(self, flag: u8, on: bool) -> Self {
        if on {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }
}

/// The 512×16 battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Map {
    /// Column-major cells: index = x * MAP_HEIGHT + y.
    cells: Vec<Cell>,
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl Map {
    /// Create an all-empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::default(); (MAP_WIDTH as usize) * (MAP_HEIGHT as usize)],
        }
    }

    /// Check if coordinates are inside the grid.
    #[must_use]
    pub const fn in_bounds(x: i16, y: i16) -> bool {
        x >= 0 && x < MAP_WIDTH && y >= 0 && y < MAP_HEIGHT
    }

    /// Whether the cell store covers the whole grid (decoded maps may not).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.len() == (MAP_WIDTH as usize) * (MAP_HEIGHT as usize)
    }

    #[inline]
    fn index(x: i16, y: i16) -> Option<usize> {
        if Self::in_bounds(x, y) {
            Some((x as usize) * (MAP_HEIGHT as usize) + (y as usize))
        } else {
            None
        }
    }

    /// Cell at coordinates, `None` outside the grid.
    #[must_use]
    pub fn cell(&self, x: i16, y: i16) -> Option<Cell> {
        Self::index(x, y).map(|i| self.cells[i])
    }

    /// Element at coordinates; outside the grid reads as [`Element::Fence`].
    #[must_use]
    pub fn element_at(&self, x: i16, y: i16) -> Element {
        self.cell(x, y).map_or(Element::Fence, Cell::element)
    }

    /// Raw element code; outside the grid reads as the fence code.
    #[must_use]
    pub fn element_code_at(&self, x: i16, y: i16) -> u8 {
        self.cell(x, y)
            .map_or(Element::Fence.code(), Cell::element_code)
    }

    /// Terrain height, ignoring occupants.
    #[must_use]
    pub fn terrain_height(&self, x: i16, y: i16) -> u8 {
        self.element_at(x, y).height()
    }

    /// Occupancy bit (outside the grid counts as occupied).
    #[must_use]
    pub fn is_occupied(&self, x: i16, y: i16) -> bool {
        self.cell(x, y).map_or(true, Cell::is_occupied)
    }

    /// Player bit.
    #[must_use]
    pub fn has_player(&self, x: i16, y: i16) -> bool {
        self.cell(x, y).is_some_and(Cell::has_player)
    }

    fn update(&mut self, x: i16, y: i16, f: impl FnOnce(Cell) -> Cell) -> bool {
        match Self::index(x, y) {
            Some(i) => {
                self.cells[i] = f(self.cells[i]);
                true
            }
            None => false,
        }
    }

    /// Set or clear the occupancy bit. Returns `false` outside the grid.
    pub fn set_occupied(&mut self, x: i16, y: i16, on: bool) -> bool {
        self.update(x, y, |c| c.with_flag(OCCUPIED_BIT, on))
    }

    /// Set or clear the player bit. Returns `false` outside the grid.
    pub fn set_player(&mut self, x: i16, y: i16, on: bool) -> bool {
        self.update(x, y, |c| c.with_flag(PLAYER_BIT, on))
    }

    /// Write a 2×2 piece anchored at `(x, y)`.
    ///
    /// Occupancy and player bits of the covered cells are preserved. Cells of
    /// the footprint that fall outside the grid are skipped; returns `false` if
    /// any were.
    pub fn set_element(&mut self, x: i16, y: i16, element: Element) -> bool {
        let mut complete = true;
        for (dx, dy) in FOOTPRINT {
            let anchor = dx == 0 && dy == 0;
            complete &= self.update(x + dx, y + dy, |c| c.with_element(element, anchor));
        }
        complete
    }

    /// Erase the 2×2 piece anchored at `(x, y)` back to empty ground.
    pub fn clear_element(&mut self, x: i16, y: i16) -> bool {
        self.set_element(x, y, Element::Empty)
    }

    /// Anchor of the piece covering `(x, y)`.
    ///
    /// Returns `None` for empty ground and outside the grid. Footprints never
    /// overlap, so at most one neighbouring anchor can cover a non-anchor cell.
    #[must_use]
    pub fn anchor_of(&self, x: i16, y: i16) -> Option<(i16, i16)> {
        let cell = self.cell(x, y)?;
        if cell.element() == Element::Empty {
            return None;
        }
        if cell.is_anchor() {
            return Some((x, y));
        }
        [(x - 1, y), (x, y - 1), (x - 1, y - 1)]
            .into_iter()
            .find(|&(ax, ay)| {
                self.cell(ax, ay)
                    .is_some_and(|c| c.is_anchor() && c.element() != Element::Empty)
            })
    }

    /// Count of cells with the occupancy bit set.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    /// Coordinates of every cell with the player bit set.
    #[must_use]
    pub fn player_cells(&self) -> Vec<(i16, i16)> {
        self.iter()
            .filter(|(_, _, c)| c.has_player())
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    /// All cells in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (i16, i16, Cell)> + '_ {
        self.cells.iter().enumerate().map(|(i, c)| {
            let x = (i / MAP_HEIGHT as usize) as i16;
            let y = (i % MAP_HEIGHT as usize) as i16;
            (x, y, *c)
        })
    }
}

/// Offsets covered by a piece relative to its anchor.
pub const FOOTPRINT: [(i16, i16); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];
