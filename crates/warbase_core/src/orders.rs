//! Robot orders and their payloads.

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingKind, Ownership};
use crate::factions::Faction;
use crate::registry::RobotId;

/// Default distance for advance/retreat orders issued without one.
pub const DEFAULT_ORDER_DISTANCE: u8 = 16;

/// A robot's high-level directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Hold position and shoot at anything in sight.
    StopAndDefend,
    /// Move a set distance towards the opponent.
    Advance,
    /// Move a set distance towards home.
    Retreat,
    /// Hunt the nearest opposing robot.
    DestroyRobots,
    /// Nuke an opposing factory.
    DestroyFactories,
    /// Nuke an opposing warbase.
    DestroyWarbases,
    /// Occupy an unowned factory.
    CaptureNeutralFactories,
    /// Occupy an opposing factory.
    CaptureEnemyFactories,
    /// Occupy an opposing warbase.
    CaptureEnemyWarbases,
}

/// What a target-seeking order is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetQuery {
    /// The nearest live opposing robot.
    Robot,
    /// A building of this kind with this ownership, relative to the seeker.
    Building {
        /// Warbases or factories.
        warbase: bool,
        /// Neutral buildings instead of opposing ones.
        neutral: bool,
    },
}

impl TargetQuery {
    /// Whether a building satisfies the query for a robot of `faction`.
    #[must_use]
    pub fn matches(self, building: &Building, faction: Faction) -> bool {
        let Self::Building { warbase, neutral } = self else {
            return false;
        };
        let kind_ok = matches!(building.kind(), BuildingKind::Warbase) == warbase;
        let owner_ok = match building.ownership() {
            Ownership::Destroyed => false,
            Ownership::Neutral => neutral,
            Ownership::Owned(owner) => !neutral && owner == faction.opponent(),
        };
        kind_ok && owner_ok
    }
}

impl Order {
    /// All orders by code.
    pub const ALL: [Self; 9] = [
        Self::StopAndDefend,
        Self::Advance,
        Self::Retreat,
        Self::DestroyRobots,
        Self::DestroyFactories,
        Self::DestroyWarbases,
        Self::CaptureNeutralFactories,
        Self::CaptureEnemyFactories,
        Self::CaptureEnemyWarbases,
    ];

    /// Numeric code 0–8.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Self::code`].
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Anything other than the idle order.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::StopAndDefend)
    }

    /// Advance or retreat.
    #[must_use]
    pub const fn is_distance(self) -> bool {
        matches!(self, Self::Advance | Self::Retreat)
    }

    /// Destroy orders that need a nuclear warhead.
    #[must_use]
    pub const fn is_nuclear(self) -> bool {
        matches!(self, Self::DestroyFactories | Self::DestroyWarbases)
    }

    /// Target search for destroy/capture orders.
    #[must_use]
    pub const fn target_query(self) -> Option<TargetQuery> {
        match self {
            Self::DestroyRobots => Some(TargetQuery::Robot),
            Self::DestroyFactories | Self::CaptureEnemyFactories => Some(TargetQuery::Building {
                warbase: false,
                neutral: false,
            }),
            Self::DestroyWarbases | Self::CaptureEnemyWarbases => Some(TargetQuery::Building {
                warbase: true,
                neutral: false,
            }),
            Self::CaptureNeutralFactories => Some(TargetQuery::Building {
                warbase: false,
                neutral: true,
            }),
            Self::StopAndDefend | Self::Advance | Self::Retreat => None,
        }
    }

    /// Column sign of the heading for advance/retreat.
    #[must_use]
    pub const fn heading_sign(self, faction: Faction) -> i16 {
        match self {
            Self::Advance => faction.advance_sign(),
            Self::Retreat => -faction.advance_sign(),
            _ => 0,
        }
    }
}

/// Order payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderArgument {
    /// No payload (or target not yet resolved).
    #[default]
    None,
    /// Remaining columns for advance/retreat.
    Distance(u8),
    /// Robot being hunted.
    Robot(RobotId),
    /// Index of the building being pursued.
    Building(usize),
}

impl OrderArgument {
    /// The building index, if this argument names one.
    #[must_use]
    pub const fn building(self) -> Option<usize> {
        match self {
            Self::Building(index) => Some(index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::ResourceCategory;

    #[test]
    fn test_codes_round_trip_in_order() {
        for (i, order) in Order::ALL.iter().enumerate() {
            assert_eq!(order.code() as usize, i);
            assert_eq!(Order::from_code(i as u8), Some(*order));
        }
        assert_eq!(Order::from_code(9), None);
    }

    #[test]
    fn test_heading_sign_per_faction() {
        assert_eq!(Order::Advance.heading_sign(Faction::Player), 1);
        assert_eq!(Order::Retreat.heading_sign(Faction::Player), -1);
        assert_eq!(Order::Advance.heading_sign(Faction::Enemy), -1);
        assert_eq!(Order::DestroyRobots.heading_sign(Faction::Enemy), 0);
    }

    #[test]
    fn test_capture_query_matches_ownership() {
        let mut factory = Building::factory(40, 2, ResourceCategory::Cannon);
        let neutral = Order::CaptureNeutralFactories.target_query().unwrap();
        let enemy = Order::CaptureEnemyFactories.target_query().unwrap();
        assert!(neutral.matches(&factory, Faction::Enemy));
        assert!(!enemy.matches(&factory, Faction::Enemy));

        factory.set_owner(Faction::Player);
        assert!(!neutral.matches(&factory, Faction::Enemy));
        assert!(enemy.matches(&factory, Faction::Enemy));
        assert!(!enemy.matches(&factory, Faction::Player));

        factory.destroy();
        assert!(!enemy.matches(&factory, Faction::Enemy));
    }

    #[test]
    fn test_warbase_query_ignores_factories() {
        let mut factory = Building::factory(40, 2, ResourceCategory::Nuclear);
        factory.set_owner(Faction::Player);
        let query = Order::DestroyWarbases.target_query().unwrap();
        assert!(!query.matches(&factory, Faction::Enemy));
    }
}
