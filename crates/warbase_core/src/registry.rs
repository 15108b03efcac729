//! Fixed-capacity entity registries.
//!
//! Robots, bullets and decorations live in [`Slots`] arenas indexed by stable
//! slot numbers. Iteration is always in slot order: target indices and order
//! exclusivity checks depend on it, so slots are never compacted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::economy::ResourceCategory;
use crate::factions::Faction;
use crate::orders::{Order, OrderArgument};
use crate::pieces::{PieceSet, Weapon};

/// Robot slots per faction.
pub const ROBOTS_PER_FACTION: usize = 24;

/// Total bullet slots.
pub const BULLET_SLOTS: usize = 5;

/// Bullet slot reserved for the directly controlled robot.
pub const DIRECT_BULLET_SLOT: usize = 0;

/// Decoration slots.
pub const DECORATION_SLOTS: usize = 56;

/// Starting strength of a new robot.
pub const FULL_STRENGTH: i16 = 100;

/// Strength assigned on destruction; counts up to zero while the robot blinks.
pub const DESTROYED_STRENGTH: i16 = -16;

/// Fixed flight altitude of bullets.
pub const BULLET_ALTITUDE: u8 = 10;

/// Fixed-capacity arena with stable indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slots<T> {
    slots: Vec<Option<T>>,
}

impl<T> Slots<T> {
    /// Create an arena with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True when no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Item at a slot.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutable item at a slot.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Whether a slot exists and is free.
    #[must_use]
    pub fn is_free(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(None))
    }

    /// First free slot within `range`.
    #[must_use]
    pub fn first_free_in(&self, range: std::ops::Range<usize>) -> Option<usize> {
        range.into_iter().find(|&i| self.is_free(i))
    }

    /// Place an item in the first free slot.
    pub fn insert(&mut self, item: T) -> Option<usize> {
        let index = self.first_free_in(0..self.capacity())?;
        self.slots[index] = Some(item);
        Some(index)
    }

    /// Place an item at a specific free slot. Returns `false` if taken or out of range.
    pub fn insert_at(&mut self, index: usize, item: T) -> bool {
        if self.is_free(index) {
            self.slots[index] = Some(item);
            true
        } else {
            false
        }
    }

    /// Free a slot, returning its item.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|item| (i, item)))
    }

    /// Occupied slots in index order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|item| (i, item)))
    }

    /// Indices of occupied slots.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.iter().map(|(i, _)| i).collect()
    }
}

/// Stable reference to a robot slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RobotId {
    /// Owning faction (selects the slot array).
    pub faction: Faction,
    /// Slot index within the faction array.
    pub slot: u8,
}

impl RobotId {
    /// Create a robot reference.
    #[must_use]
    pub const fn new(faction: Faction, slot: u8) -> Self {
        Self { faction, slot }
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.faction, self.slot)
    }
}

/// Who drives a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    /// Player-owned, following its orders.
    Auto,
    /// Player-owned, paused under the landed ship.
    PlayerLanded,
    /// Player-owned, steered by the input source.
    DirectControl,
    /// Computer-owned.
    EnemyAi,
}

impl ControlMode {
    /// Default mode for a newly built robot.
    #[must_use]
    pub const fn for_faction(faction: Faction) -> Self {
        match faction {
            Faction::Player => Self::Auto,
            Faction::Enemy => Self::EnemyAi,
        }
    }
}

/// A combat robot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Robot {
    /// Map column.
    pub x: i16,
    /// Map row.
    pub y: i16,
    /// Direction the robot wants to move in, if any.
    pub desired: Option<Direction>,
    /// Steps left before a new random heading is chosen.
    pub walk_steps: u8,
    /// Equipped pieces.
    pub pieces: PieceSet,
    /// Facing direction.
    pub facing: Direction,
    /// Cached sum of piece heights.
    pub height: u8,
    /// Control mode.
    pub control: ControlMode,
    /// Current order.
    pub order: Order,
    /// Order payload.
    pub argument: OrderArgument,
    /// Strength; negative while the destruction blink plays.
    pub strength: i16,
    /// Terrain altitude under the robot.
    pub altitude: u8,
    /// Ticks until the next activation.
    pub cooldown: u8,
    /// Swaps the vertical detour preference after a failed heading.
    pub detour_flip: bool,
}

impl Robot {
    /// Create a full-strength robot awaiting orders.
    #[must_use]
    pub fn new(x: i16, y: i16, pieces: PieceSet, facing: Direction, control: ControlMode) -> Self {
        Self {
            x,
            y,
            desired: None,
            walk_steps: 0,
            pieces,
            facing,
            height: pieces.height(),
            control,
            order: Order::StopAndDefend,
            argument: OrderArgument::None,
            strength: FULL_STRENGTH,
            altitude: 0,
            cooldown: 1,
            detour_flip: false,
        }
    }

    /// Alive and not blinking.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.strength > 0
    }

    /// Height plus terrain altitude: the top of the robot.
    #[must_use]
    pub const fn top(&self) -> u8 {
        self.height.saturating_add(self.altitude)
    }

    /// Position as a tuple.
    #[must_use]
    pub const fn position(&self) -> (i16, i16) {
        (self.x, self.y)
    }
}

/// Which pool of bullet slots a shot may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletClass {
    /// Slot 0, the directly controlled robot.
    Direct,
    /// Slots 1–2, player robots on automatic.
    Friendly,
    /// Slots 3–4, computer robots.
    Enemy,
}

impl BulletClass {
    /// Slot indices this class may use.
    #[must_use]
    pub const fn slots(self) -> std::ops::Range<usize> {
        match self {
            Self::Direct => 0..1,
            Self::Friendly => 1..3,
            Self::Enemy => 3..5,
        }
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bullet {
    /// Map column.
    pub x: i16,
    /// Map row.
    pub y: i16,
    /// Flight direction.
    pub direction: Direction,
    /// Cells left to travel.
    pub range: u8,
    /// Weapon that fired it.
    pub weapon: Weapon,
    /// Faction of the shooter.
    pub shooter: Faction,
}

/// Visual overlay kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecorationKind {
    /// Ownership flag.
    Flag(Faction),
    /// Warbase landing marker.
    HMarker,
    /// Factory roof showing its category.
    Roof(ResourceCategory),
}

impl DecorationKind {
    /// Altitude of the overlay's top.
    #[must_use]
    pub const fn altitude(self) -> u8 {
        match self {
            Self::Flag(_) => 40,
            Self::HMarker => 36,
            Self::Roof(_) => 32,
        }
    }
}

/// A purely visual entity tied to a building.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decoration {
    /// Map column.
    pub x: i16,
    /// Map row.
    pub y: i16,
    /// Overlay kind.
    pub kind: DecorationKind,
    /// Index of the owning building.
    pub building: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_reuse_lowest_free() {
        let mut slots: Slots<u32> = Slots::new(3);
        assert_eq!(slots.insert(10), Some(0));
        assert_eq!(slots.insert(11), Some(1));
        assert_eq!(slots.insert(12), Some(2));
        assert_eq!(slots.insert(13), None);
        assert_eq!(slots.remove(1), Some(11));
        assert_eq!(slots.insert(14), Some(1));
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_slots_iterate_in_index_order() {
        let mut slots: Slots<char> = Slots::new(4);
        slots.insert_at(3, 'd');
        slots.insert_at(1, 'b');
        let order: Vec<_> = slots.iter().collect();
        assert_eq!(order, vec![(1, &'b'), (3, &'d')]);
    }

    #[test]
    fn test_insert_at_rejects_taken_and_out_of_range() {
        let mut slots: Slots<u8> = Slots::new(2);
        assert!(slots.insert_at(0, 1));
        assert!(!slots.insert_at(0, 2));
        assert!(!slots.insert_at(5, 3));
    }

    #[test]
    fn test_bullet_class_ranges_partition_slots() {
        let mut all: Vec<usize> = [BulletClass::Direct, BulletClass::Friendly, BulletClass::Enemy]
            .iter()
            .flat_map(|c| c.slots())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..BULLET_SLOTS).collect::<Vec<_>>());
    }

    #[test]
    fn test_robot_height_is_cached() {
        use crate::pieces::Piece;
        let pieces = PieceSet::from_pieces(&[Piece::Bipod, Piece::Phasers]);
        let robot = Robot::new(20, 3, pieces, Direction::Right, ControlMode::Auto);
        assert_eq!(robot.height, 14);
        assert!(robot.is_alive());
        assert_eq!(robot.top(), 14);
    }
}
