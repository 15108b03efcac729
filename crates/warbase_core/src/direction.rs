//! Cardinal directions and direction sets.

use serde::{Deserialize, Serialize};

/// One of the four map directions a robot can face or move in.
///
/// `Up` increases the row index and `Down` decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards higher columns.
    Right,
    /// Towards lower columns.
    Left,
    /// Towards lower rows.
    Down,
    /// Towards higher rows.
    Up,
}

/// Turn applied when a robot must reverse: reversal happens in two 90° steps,
/// and the first step always goes this way.
const REVERSE_TURN: [Direction; 4] = [
    Direction::Down,  // from Right
    Direction::Up,    // from Left
    Direction::Left,  // from Down
    Direction::Right, // from Up
];

impl Direction {
    /// All directions in bit order.
    pub const ALL: [Self; 4] = [Self::Right, Self::Left, Self::Down, Self::Up];

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Left => 1,
            Self::Down => 2,
            Self::Up => 3,
        }
    }

    /// One-hot bit used in [`DirectionSet`].
    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Column/row delta of one step.
    #[must_use]
    pub const fn delta(self) -> (i16, i16) {
        match self {
            Self::Right => (1, 0),
            Self::Left => (-1, 0),
            Self::Down => (0, -1),
            Self::Up => (0, 1),
        }
    }

    /// The reverse direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
            Self::Down => Self::Up,
            Self::Up => Self::Down,
        }
    }

    /// Whether the direction moves along the x axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }

    /// The two directions perpendicular to this one.
    #[must_use]
    pub const fn perpendicular(self) -> [Self; 2] {
        if self.is_horizontal() {
            [Self::Down, Self::Up]
        } else {
            [Self::Right, Self::Left]
        }
    }

    /// Horizontal direction for a signed x offset (`None` for zero).
    #[must_use]
    pub const fn from_dx(dx: i16) -> Option<Self> {
        if dx > 0 {
            Some(Self::Right)
        } else if dx < 0 {
            Some(Self::Left)
        } else {
            None
        }
    }

    /// Vertical direction for a signed y offset (`None` for zero).
    #[must_use]
    pub const fn from_dy(dy: i16) -> Option<Self> {
        if dy > 0 {
            Some(Self::Up)
        } else if dy < 0 {
            Some(Self::Down)
        } else {
            None
        }
    }

    /// One 90° turn step from `self` towards `desired`.
    ///
    /// Perpendicular targets are reached in one step. A reversal first turns
    /// through a fixed intermediate direction, which is not symmetric: facing
    /// right goes through down, facing left goes through up.
    #[must_use]
    pub const fn turn_toward(self, desired: Self) -> Self {
        if self.index() == desired.index() {
            self
        } else if self.opposite().index() == desired.index() {
            REVERSE_TURN[self.index()]
        } else {
            desired
        }
    }
}

/// A set of directions packed into four bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DirectionSet(u8);

impl DirectionSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Every direction.
    pub const ALL: Self = Self(0b1111);

    /// Construct from raw bits (upper bits are ignored).
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Set with a single direction.
    #[must_use]
    pub const fn only(direction: Direction) -> Self {
        Self(direction.bit())
    }

    /// Add a direction.
    pub fn insert(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    /// Membership test.
    #[must_use]
    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    /// True when no direction is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of directions in the set.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// The only direction, if exactly one is set.
    #[must_use]
    pub fn single(self) -> Option<Direction> {
        if self.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    /// Members in bit order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |d| self.contains(*d))
    }

    /// The `n`-th member in bit order, wrapping around the set size.
    #[must_use]
    pub fn nth_wrapping(self, n: u8) -> Option<Direction> {
        let len = self.len() as usize;
        if len == 0 {
            return None;
        }
        self.iter().nth(n as usize % len)
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<T: IntoIterator<Item = Direction>>(iter: T) -> Self {
        let mut set = Self::EMPTY;
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}
