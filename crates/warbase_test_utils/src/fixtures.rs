//! Test fixtures and helpers.
//!
//! Pre-built game states and robot configurations for consistent testing.

use warbase_core::config::EngineConfig;
use warbase_core::direction::Direction;
use warbase_core::factions::Faction;
use warbase_core::map_generation::BattlefieldConfig;
use warbase_core::pieces::{Piece, PieceSet};
use warbase_core::random::GameRng;
use warbase_core::registry::{ControlMode, Robot, RobotId};
use warbase_core::simulation::Simulation;

/// Engine configuration for a quiet arena: no terrain patches, no computer
/// strategy.
#[must_use]
pub fn open_field_config() -> EngineConfig {
    EngineConfig {
        battlefield: BattlefieldConfig {
            terrain_patches: 0,
            ..BattlefieldConfig::default()
        },
        enemy_ai_enabled: false,
        ..EngineConfig::default()
    }
}

/// Standard buildings on bare ground with the computer strategy switched off.
#[must_use]
pub fn open_field() -> Simulation {
    Simulation::new(open_field_config())
}

/// Open field whose random source replays `script`.
#[must_use]
pub fn scripted_field(script: &[u8]) -> Simulation {
    let mut sim = open_field();
    sim.set_rng(GameRng::scripted(script.to_vec()));
    sim
}

/// Piece set from a list, for terse test setup.
#[must_use]
pub fn pieces(list: &[Piece]) -> PieceSet {
    PieceSet::from_pieces(list)
}

/// Place a robot for `faction` facing its advance direction.
///
/// # Panics
///
/// Panics if the cell cannot be entered or the faction has no free slot.
pub fn place_robot(sim: &mut Simulation, faction: Faction, x: i16, y: i16, list: &[Piece]) -> RobotId {
    let facing = match faction {
        Faction::Player => Direction::Right,
        Faction::Enemy => Direction::Left,
    };
    place_robot_facing(sim, faction, x, y, list, facing)
}

/// Place a robot with an explicit facing.
///
/// # Panics
///
/// Panics if the cell cannot be entered or the faction has no free slot.
pub fn place_robot_facing(
    sim: &mut Simulation,
    faction: Faction,
    x: i16,
    y: i16,
    list: &[Piece],
    facing: Direction,
) -> RobotId {
    let robot = Robot::new(x, y, pieces(list), facing, ControlMode::for_faction(faction));
    sim.spawn_robot(faction, robot)
        .unwrap_or_else(|e| panic!("cannot place robot at ({x}, {y}): {e}"))
}

/// Live robots of a faction.
#[must_use]
pub fn live_robots(sim: &Simulation, faction: Faction) -> usize {
    sim.robots(faction).iter().filter(|(_, r)| r.is_alive()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_field_is_quiet() {
        let sim = open_field();
        assert!(!sim.config().enemy_ai_enabled);
        assert_eq!(sim.buildings().len(), 28);
        assert_eq!(live_robots(&sim, Faction::Enemy), 0);
    }

    #[test]
    fn test_place_robot_faces_advance() {
        let mut sim = open_field();
        let id = place_robot(&mut sim, Faction::Enemy, 300, 4, &[Piece::Tracks, Piece::Cannon]);
        let robot = sim.robot(id).unwrap();
        assert_eq!(robot.facing, Direction::Left);
        assert_eq!(robot.control, ControlMode::EnemyAi);
        assert!(sim.map().is_occupied(300, 4));
    }
}
