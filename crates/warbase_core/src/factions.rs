//! Faction definitions and identifiers.

use serde::{Deserialize, Serialize};

/// One of the two competing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// The human-controlled side, based at the low-x end of the map.
    Player,
    /// The computer-controlled side, based at the high-x end of the map.
    Enemy,
}

impl Faction {
    /// Both factions in registry iteration order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Enemy];

    /// The opposing faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Array index for per-faction tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
        }
    }

    /// Sign of the x axis this faction advances along.
    ///
    /// The player advances towards higher columns, the enemy towards lower ones.
    #[must_use]
    pub const fn advance_sign(self) -> i16 {
        match self {
            Self::Player => 1,
            Self::Enemy => -1,
        }
    }

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Enemy => "Insignian",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        for faction in Faction::ALL {
            assert_eq!(faction.opponent().opponent(), faction);
            assert_ne!(faction.opponent(), faction);
        }
    }

    #[test]
    fn test_advance_signs_oppose() {
        assert_eq!(
            Faction::Player.advance_sign(),
            -Faction::Enemy.advance_sign()
        );
    }
}
