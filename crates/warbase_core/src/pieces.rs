//! Robot pieces: chassis, weapons and equipment.
//!
//! A robot is described by a [`PieceSet`], an 8-bit mask with the chassis in
//! the low three bits followed by weapon and equipment bits. Heights, costs and
//! terrain limits are fixed per piece.

use serde::{Deserialize, Serialize};

use crate::economy::ResourceCategory;

/// A single constructible piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    /// Walking chassis.
    Bipod,
    /// Tracked chassis.
    Tracks,
    /// Hovering chassis.
    Antigrav,
    /// Short-range gun.
    Cannon,
    /// Long-range launcher.
    Missiles,
    /// Energy weapon.
    Phasers,
    /// Building-destroying warhead.
    Nuclear,
    /// Targeting electronics (longer sight and range).
    Electronics,
}

impl Piece {
    /// All pieces in bit order.
    pub const ALL: [Self; 8] = [
        Self::Bipod,
        Self::Tracks,
        Self::Antigrav,
        Self::Cannon,
        Self::Missiles,
        Self::Phasers,
        Self::Nuclear,
        Self::Electronics,
    ];

    /// Bit in a [`PieceSet`].
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Bipod => 1 << 0,
            Self::Tracks => 1 << 1,
            Self::Antigrav => 1 << 2,
            Self::Cannon => 1 << 3,
            Self::Missiles => 1 << 4,
            Self::Phasers => 1 << 5,
            Self::Nuclear => 1 << 6,
            Self::Electronics => 1 << 7,
        }
    }

    /// Contribution to robot height.
    #[must_use]
    pub const fn height(self) -> u8 {
        match self {
            Self::Bipod => 9,
            Self::Tracks => 7,
            Self::Antigrav => 6,
            Self::Cannon => 6,
            Self::Missiles => 7,
            Self::Phasers => 5,
            Self::Nuclear => 8,
            Self::Electronics => 4,
        }
    }

    /// Construction cost.
    #[must_use]
    pub const fn cost(self) -> u8 {
        match self {
            Self::Bipod => 3,
            Self::Tracks => 5,
            Self::Antigrav => 10,
            Self::Cannon => 2,
            Self::Missiles => 4,
            Self::Phasers => 4,
            Self::Nuclear => 20,
            Self::Electronics => 3,
        }
    }

    /// Resource bucket that pays for this piece.
    #[must_use]
    pub const fn category(self) -> ResourceCategory {
        match self {
            Self::Bipod | Self::Tracks | Self::Antigrav => ResourceCategory::Chassis,
            Self::Cannon => ResourceCategory::Cannon,
            Self::Missiles => ResourceCategory::Missiles,
            Self::Phasers => ResourceCategory::Phasers,
            Self::Nuclear => ResourceCategory::Nuclear,
            Self::Electronics => ResourceCategory::Electronics,
        }
    }
}

/// Chassis type; bounds terrain passability and sets speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chassis {
    /// Slow walker.
    Bipod,
    /// Medium tracked vehicle.
    Tracks,
    /// Fast hover unit.
    Antigrav,
}

impl Chassis {
    /// All chassis types.
    pub const ALL: [Self; 3] = [Self::Bipod, Self::Tracks, Self::Antigrav];

    /// Table column index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Bipod => 0,
            Self::Tracks => 1,
            Self::Antigrav => 2,
        }
    }

    /// Corresponding piece.
    #[must_use]
    pub const fn piece(self) -> Piece {
        match self {
            Self::Bipod => Piece::Bipod,
            Self::Tracks => Piece::Tracks,
            Self::Antigrav => Piece::Antigrav,
        }
    }

    /// Map elements with a code strictly below this value are passable.
    #[must_use]
    pub const fn max_element(self) -> u8 {
        match self {
            Self::Bipod => 8,
            Self::Tracks => 12,
            Self::Antigrav => 15,
        }
    }
}

/// Shooting weapon type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weapon {
    /// Damage multiplier 2.
    Cannon,
    /// Damage multiplier 3, longer range.
    Missiles,
    /// Damage multiplier 4.
    Phasers,
}

impl Weapon {
    /// All shooting weapons in bit order.
    pub const ALL: [Self; 3] = [Self::Cannon, Self::Missiles, Self::Phasers];

    /// Corresponding piece.
    #[must_use]
    pub const fn piece(self) -> Piece {
        match self {
            Self::Cannon => Piece::Cannon,
            Self::Missiles => Piece::Missiles,
            Self::Phasers => Piece::Phasers,
        }
    }

    /// Damage multiplier applied to the height-based base damage.
    #[must_use]
    pub const fn damage_multiplier(self) -> i16 {
        match self {
            Self::Cannon => 2,
            Self::Missiles => 3,
            Self::Phasers => 4,
        }
    }

    /// Bullet range in cells before the electronics bonus.
    #[must_use]
    pub const fn base_range(self) -> u8 {
        match self {
            Self::Missiles => 7,
            Self::Cannon | Self::Phasers => 5,
        }
    }
}

/// Equipped pieces of a robot.
///
/// # Example
///
/// ```
/// use warbase_core::pieces::{Chassis, Piece, PieceSet, Weapon};
///
/// let set = PieceSet::from_pieces(&[Piece::Tracks, Piece::Cannon]);
/// assert_eq!(set.chassis(), Some(Chassis::Tracks));
/// assert!(set.has_weapon(Weapon::Cannon));
/// assert_eq!(set.height(), 13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PieceSet(u8);

impl PieceSet {
    const CHASSIS_MASK: u8 = 0b0000_0111;
    const ARMAMENT_MASK: u8 = 0b0111_1000;

    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Construct from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Construct from a piece list.
    #[must_use]
    pub fn from_pieces(pieces: &[Piece]) -> Self {
        Self(pieces.iter().fold(0, |bits, piece| bits | piece.bit()))
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Membership test.
    #[must_use]
    pub const fn contains(self, piece: Piece) -> bool {
        self.0 & piece.bit() != 0
    }

    /// Add a piece.
    #[must_use]
    pub const fn with(self, piece: Piece) -> Self {
        Self(self.0 | piece.bit())
    }

    /// Pieces in bit order.
    pub fn iter(self) -> impl Iterator<Item = Piece> {
        Piece::ALL.into_iter().filter(move |p| self.contains(*p))
    }

    /// The chassis, if exactly one chassis bit is set.
    #[must_use]
    pub const fn chassis(self) -> Option<Chassis> {
        match self.0 & Self::CHASSIS_MASK {
            0b001 => Some(Chassis::Bipod),
            0b010 => Some(Chassis::Tracks),
            0b100 => Some(Chassis::Antigrav),
            _ => None,
        }
    }

    /// Whether a shooting weapon is equipped.
    #[must_use]
    pub const fn has_weapon(self, weapon: Weapon) -> bool {
        self.contains(weapon.piece())
    }

    /// Equipped shooting weapons in bit order.
    pub fn weapons(self) -> impl Iterator<Item = Weapon> {
        Weapon::ALL.into_iter().filter(move |w| self.has_weapon(*w))
    }

    /// Number of shooting weapons plus the nuclear warhead.
    #[must_use]
    pub const fn armament_count(self) -> u32 {
        (self.0 & Self::ARMAMENT_MASK).count_ones()
    }

    /// Nuclear warhead fitted.
    #[must_use]
    pub const fn has_nuclear(self) -> bool {
        self.contains(Piece::Nuclear)
    }

    /// Electronics fitted.
    #[must_use]
    pub const fn has_electronics(self) -> bool {
        self.contains(Piece::Electronics)
    }

    /// Robot height: the sum of equipped piece heights.
    #[must_use]
    pub fn height(self) -> u8 {
        self.iter().map(Piece::height).sum()
    }

    /// Sum of piece costs.
    #[must_use]
    pub fn total_cost(self) -> u16 {
        self.iter().map(|p| u16::from(p.cost())).sum()
    }

    /// A buildable combination: one chassis and at least one other piece.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        self.chassis().is_some() && self.0 & !Self::CHASSIS_MASK != 0
    }
}
