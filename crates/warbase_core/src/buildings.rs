//! Warbases and factories.
//!
//! Buildings never move. Their state is a packed flag byte plus a capture
//! timer; ownership and destruction are mutually exclusive by construction,
//! since every setter rewrites the whole ownership field.

use serde::{Deserialize, Serialize};

use crate::economy::ResourceCategory;
use crate::factions::Faction;
use crate::map::{Element, Map};
use crate::registry::DecorationKind;

/// Number of warbases.
pub const WARBASE_COUNT: usize = 4;

/// Number of factories.
pub const FACTORY_COUNT: usize = 24;

/// Total building records (warbases first).
pub const BUILDING_COUNT: usize = WARBASE_COUNT + FACTORY_COUNT;

/// Ticks an opposing robot must hold a capture tile.
pub const CAPTURE_TICKS: u8 = 144;

const DESTROYED_BIT: u8 = 1 << 7;
const PLAYER_BIT: u8 = 1 << 6;
const ENEMY_BIT: u8 = 1 << 5;
/// Flag bits holding the ruined marker and the owner.
pub const OWNER_MASK: u8 = DESTROYED_BIT | PLAYER_BIT | ENEMY_BIT;
const SUBTYPE_MASK: u8 = 0b0000_0111;
const WARBASE_SUBTYPE: u8 = 7;

const WARBASE_PIECES: [(i16, i16, Element); 5] = [
    (0, 0, Element::WarbaseWall),
    (0, 2, Element::WarbaseWall),
    (4, 0, Element::WarbaseWall),
    (4, 2, Element::WarbaseWall),
    (2, 2, Element::WarbaseCore),
];

const FACTORY_PIECES: [(i16, i16, Element); 3] = [
    (0, 0, Element::FactoryWall),
    (0, 2, Element::FactoryWall),
    (2, 2, Element::FactoryBody),
];

/// Building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Builds robots; earns general resource.
    Warbase,
    /// Earns one resource category.
    Factory(ResourceCategory),
}

/// Decoded ownership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ownership {
    /// Nobody owns it.
    Neutral,
    /// Owned by a faction.
    Owned(Faction),
    /// Permanently ruined.
    Destroyed,
}

/// A building record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Anchor column of the footprint.
    pub x: i16,
    /// Anchor row of the footprint.
    pub y: i16,
    flags: u8,
    /// Consecutive ticks an opposing robot has held the capture tile.
    pub capture_timer: u8,
}

impl Building {
    /// A neutral warbase.
    #[must_use]
    pub const fn warbase(x: i16, y: i16) -> Self {
        Self {
            x,
            y,
            flags: WARBASE_SUBTYPE,
            capture_timer: 0,
        }
    }

    /// A neutral factory.
    #[must_use]
    pub const fn factory(x: i16, y: i16, category: ResourceCategory) -> Self {
        Self {
            x,
            y,
            flags: category.index() as u8,
            capture_timer: 0,
        }
    }

    /// Packed flag byte.
    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Building type from the subtype bits.
    #[must_use]
    pub fn kind(&self) -> BuildingKind {
        let subtype = self.flags & SUBTYPE_MASK;
        if subtype == WARBASE_SUBTYPE {
            return BuildingKind::Warbase;
        }
        ResourceCategory::from_index(subtype).map_or(BuildingKind::Warbase, BuildingKind::Factory)
    }

    /// Whether this is a warbase.
    #[must_use]
    pub fn is_warbase(&self) -> bool {
        self.kind() == BuildingKind::Warbase
    }

    /// Ownership from the flag bits.
    #[must_use]
    pub const fn ownership(&self) -> Ownership {
        match self.flags & OWNER_MASK {
            DESTROYED_BIT => Ownership::Destroyed,
            PLAYER_BIT => Ownership::Owned(Faction::Player),
            ENEMY_BIT => Ownership::Owned(Faction::Enemy),
            _ => Ownership::Neutral,
        }
    }

    /// Owning faction, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<Faction> {
        match self.ownership() {
            Ownership::Owned(faction) => Some(faction),
            _ => None,
        }
    }

    /// Whether the building is ruined.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.flags & DESTROYED_BIT != 0
    }

    /// Transfer ownership. Ignored for ruins.
    pub fn set_owner(&mut self, faction: Faction) {
        if self.is_destroyed() {
            return;
        }
        let bit = match faction {
            Faction::Player => PLAYER_BIT,
            Faction::Enemy => ENEMY_BIT,
        };
        self.flags = (self.flags & !OWNER_MASK) | bit;
        self.capture_timer = 0;
    }

    /// Mark as permanently ruined, clearing any owner.
    pub fn destroy(&mut self) {
        self.flags = (self.flags & !OWNER_MASK) | DESTROYED_BIT;
        self.capture_timer = 0;
    }

    /// Tile a robot must stand on to capture the building.
    #[must_use]
    pub const fn capture_tile(&self) -> (i16, i16) {
        (self.x + 2, self.y)
    }

    /// Footprint width in cells.
    #[must_use]
    pub fn width(&self) -> i16 {
        if self.is_warbase() {
            6
        } else {
            4
        }
    }

    /// Footprint height in cells.
    #[must_use]
    pub const fn depth(&self) -> i16 {
        4
    }

    /// Whether `(x, y)` lies inside the footprint.
    #[must_use]
    pub fn covers(&self, x: i16, y: i16) -> bool {
        x >= self.x && x < self.x + self.width() && y >= self.y && y < self.y + self.depth()
    }

    /// Structural pieces as (dx, dy, element) relative to the anchor.
    #[must_use]
    pub fn pieces(&self) -> &'static [(i16, i16, Element)] {
        if self.is_warbase() {
            &WARBASE_PIECES
        } else {
            &FACTORY_PIECES
        }
    }

    /// Write the structure into the map.
    pub fn stamp(&self, map: &mut Map) {
        let element_override = self.is_destroyed().then_some(Element::Ruins);
        for &(dx, dy, element) in self.pieces() {
            map.set_element(self.x + dx, self.y + dy, element_override.unwrap_or(element));
        }
    }

    /// Decorations the building should currently carry, with their cells.
    #[must_use]
    pub fn decorations(&self) -> Vec<(i16, i16, DecorationKind)> {
        if self.is_destroyed() {
            return Vec::new();
        }
        let mut list = Vec::with_capacity(2);
        let marker = match self.kind() {
            BuildingKind::Warbase => DecorationKind::HMarker,
            BuildingKind::Factory(category) => DecorationKind::Roof(category),
        };
        list.push((self.x + 2, self.y + 3, marker));
        if let Some(owner) = self.owner() {
            list.push((self.x, self.y + 3, DecorationKind::Flag(owner)));
        }
        list
    }

    /// Chebyshev and Manhattan limits for a nuclear strike on this building.
    #[must_use]
    pub fn blast_radius(&self) -> (i16, i16) {
        if self.is_warbase() {
            (7, 10)
        } else {
            (5, 7)
        }
    }
}

/// Per-faction building tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Holdings {
    /// Owned warbases.
    pub warbases: u8,
    /// Owned factories per category.
    pub factories: [u8; 6],
}

impl Holdings {
    /// Count what a faction owns.
    #[must_use]
    pub fn of(buildings: &[Building], faction: Faction) -> Self {
        let mut holdings = Self::default();
        for building in buildings.iter().filter(|b| b.owner() == Some(faction)) {
            match building.kind() {
                BuildingKind::Warbase => holdings.warbases += 1,
                BuildingKind::Factory(category) => holdings.factories[category.index()] += 1,
            }
        }
        holdings
    }

    /// Total factories.
    #[must_use]
    pub fn factory_total(&self) -> u8 {
        self.factories.iter().sum()
    }

    /// Warbases plus factories.
    #[must_use]
    pub fn total(&self) -> u8 {
        self.warbases + self.factory_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exclusive(b: &Building) {
        let set = [
            b.is_destroyed(),
            b.owner() == Some(Faction::Player),
            b.owner() == Some(Faction::Enemy),
            b.ownership() == Ownership::Neutral,
        ];
        assert_eq!(set.iter().filter(|s| **s).count(), 1, "flags {:#010b}", b.flags());
    }

    #[test]
    fn test_flag_encoding() {
        let mut wb = Building::warbase(18, 6);
        assert_eq!(wb.flags(), 0b0000_0111);
        wb.set_owner(Faction::Player);
        assert_eq!(wb.flags(), 0b0100_0111);
        wb.set_owner(Faction::Enemy);
        assert_eq!(wb.flags(), 0b0010_0111);
        wb.destroy();
        assert_eq!(wb.flags(), 0b1000_0111);
        assert_eq!(wb.kind(), BuildingKind::Warbase);
    }

    #[test]
    fn test_ownership_is_exclusive_through_transitions() {
        let mut f = Building::factory(40, 2, ResourceCategory::Missiles);
        assert_exclusive(&f);
        f.set_owner(Faction::Enemy);
        assert_exclusive(&f);
        f.set_owner(Faction::Player);
        assert_exclusive(&f);
        f.destroy();
        assert_exclusive(&f);
        f.set_owner(Faction::Enemy);
        assert!(f.is_destroyed());
        assert_exclusive(&f);
    }

    #[test]
    fn test_factory_kind_keeps_category() {
        let f = Building::factory(40, 2, ResourceCategory::Chassis);
        assert_eq!(f.kind(), BuildingKind::Factory(ResourceCategory::Chassis));
        assert_eq!(f.width(), 4);
    }

    #[test]
    fn test_stamp_leaves_bay_open() {
        let mut map = Map::new();
        let wb = Building::warbase(18, 6);
        wb.stamp(&mut map);
        let (ex, ey) = wb.capture_tile();
        assert_eq!(map.element_at(ex, ey), Element::Empty);
        assert_eq!(map.element_at(ex + 1, ey + 1), Element::Empty);
        assert_eq!(map.element_at(18, 6), Element::WarbaseWall);
        assert_eq!(map.element_at(21, 9), Element::WarbaseCore);
        assert_eq!(map.element_at(23, 9), Element::WarbaseWall);
    }

    #[test]
    fn test_destroyed_stamp_is_ruins() {
        let mut map = Map::new();
        let mut f = Building::factory(40, 2, ResourceCategory::Cannon);
        f.stamp(&mut map);
        f.destroy();
        f.stamp(&mut map);
        assert_eq!(map.element_at(40, 2), Element::Ruins);
        assert_eq!(map.element_at(43, 5), Element::Ruins);
        assert!(f.decorations().is_empty());
    }

    #[test]
    fn test_holdings_count() {
        let mut buildings = vec![
            Building::warbase(18, 6),
            Building::factory(40, 2, ResourceCategory::Cannon),
            Building::factory(58, 10, ResourceCategory::Cannon),
        ];
        for b in &mut buildings {
            b.set_owner(Faction::Player);
        }
        let h = Holdings::of(&buildings, Faction::Player);
        assert_eq!(h.warbases, 1);
        assert_eq!(h.factories[ResourceCategory::Cannon.index()], 2);
        assert_eq!(h.total(), 3);
        assert_eq!(Holdings::of(&buildings, Faction::Enemy).total(), 0);
    }
}
