//! Computer opponent strategy.
//!
//! Each tick the computer may look at one randomly chosen slot of its robot
//! array. An occupied slot gets its orders refreshed; an empty one is a chance
//! to build a new robot at one of its warbases.

use crate::direction::Direction;
use crate::economy::BorrowPolicy;
use crate::factions::Faction;
use crate::orders::{Order, OrderArgument};
use crate::pieces::{Chassis, Piece, PieceSet};
use crate::random::RandomSource;
use crate::registry::{ControlMode, Robot, RobotId, ROBOTS_PER_FACTION};
use crate::simulation::{Simulation, TickEvents};

/// Out of 32 draws, how many let the computer act this tick.
pub const ACT_THRESHOLD: u8 = 24;

/// Robots per extra armament allowed on new designs.
pub const ARMAMENT_STEP: usize = 8;

/// Most non-chassis pieces a computer design carries.
pub const MAX_ARMAMENT: u32 = 3;

/// Non-chassis pieces selected by bits 0..5 of a design draw.
const ARMAMENT_BITS: [Piece; 5] = [
    Piece::Cannon,
    Piece::Missiles,
    Piece::Phasers,
    Piece::Nuclear,
    Piece::Electronics,
];

/// Decode a design draw into a piece set.
///
/// `chassis` uses its low two bits (3 is not a chassis); `armament` its low
/// five bits, one per piece of [`ARMAMENT_BITS`].
#[must_use]
pub fn design_from_draws(chassis: u8, armament: u8) -> Option<PieceSet> {
    let chassis = *Chassis::ALL.get(usize::from(chassis & 3))?;
    let mut pieces = PieceSet::EMPTY.with(chassis.piece());
    for (bit, piece) in ARMAMENT_BITS.iter().enumerate() {
        if armament & (1 << bit) != 0 {
            pieces = pieces.with(*piece);
        }
    }
    Some(pieces)
}

/// Most non-chassis pieces allowed with `census` robots already fielded.
#[must_use]
pub fn armament_cap(census: usize) -> u32 {
    (census / ARMAMENT_STEP + 1).min(MAX_ARMAMENT as usize) as u32
}

impl Simulation {
    /// One strategic decision for the computer faction.
    pub(crate) fn update_enemy_ai(&mut self, events: &mut TickEvents) {
        if self.rng.next_byte() & 31 >= ACT_THRESHOLD {
            return;
        }
        let slot = usize::from(self.rng.below(ROBOTS_PER_FACTION as u8));
        let id = RobotId::new(Faction::Enemy, slot as u8);
        match self.robot(id) {
            Some(robot) if robot.is_alive() => self.refresh_orders(id),
            Some(_) => {}
            None => self.try_spawn(slot, events),
        }
    }

    /// Keep or replace a computer robot's orders.
    ///
    /// Robots holding a building target are always re-tasked. That loses
    /// their progress whenever their slot comes up, and is kept as is.
    fn refresh_orders(&mut self, id: RobotId) {
        let keep = self.rng.next_byte() & 31 != 0;
        let Some(robot) = self.robot(id) else {
            return;
        };
        let holds_building = robot.argument.building().is_some();
        if keep && robot.order != Order::StopAndDefend && !holds_building {
            return;
        }
        let nuclear = robot.pieces.has_nuclear();

        let order = if nuclear {
            if self.rng.coin() {
                Order::DestroyFactories
            } else {
                Order::DestroyWarbases
            }
        } else if self.rng.coin() {
            Order::CaptureNeutralFactories
        } else if self.rng.coin() {
            Order::CaptureEnemyFactories
        } else {
            Order::CaptureEnemyWarbases
        };

        let (order, argument) = match self.find_building_target(id, order) {
            Some(index) => (order, OrderArgument::Building(index)),
            None => (Order::DestroyRobots, OrderArgument::None),
        };
        if let Some(robot) = self.robot_mut(id) {
            robot.order = order;
            robot.argument = argument;
            robot.desired = None;
            robot.walk_steps = 0;
        }
        tracing::trace!(robot = %id, ?order, ?argument, "Computer re-tasked robot");
    }

    /// Try to build a random design into an empty slot.
    ///
    /// Every refusal is silent: no warbase, blocked entrance, an invalid or
    /// over-armed design, or not enough resources.
    fn try_spawn(&mut self, slot: usize, events: &mut TickEvents) {
        let warbases: Vec<usize> = self
            .buildings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_warbase() && b.owner() == Some(Faction::Enemy))
            .map(|(index, _)| index)
            .collect();
        if warbases.is_empty() {
            return;
        }
        let warbase = warbases[usize::from(self.rng.below(warbases.len() as u8))];
        let chassis_draw = self.rng.next_byte();
        let armament_draw = self.rng.next_byte();

        let Some(pieces) = design_from_draws(chassis_draw, armament_draw) else {
            return;
        };
        let armament = pieces.armament_count();
        if armament == 0 || armament > armament_cap(self.census(Faction::Enemy)) {
            return;
        }
        let (x, y) = self.buildings[warbase].capture_tile();
        if self.map.is_occupied(x, y) {
            return;
        }
        if let Err(error) = self.resources[Faction::Enemy.index()].spend(pieces, BorrowPolicy::HalfReserve) {
            tracing::trace!(%error, "Computer could not afford design");
            return;
        }

        let robot = Robot::new(x, y, pieces, Direction::Left, ControlMode::EnemyAi);
        let id = self.place_robot(Faction::Enemy, slot, robot);
        events.robots_built.push(id);
        tracing::debug!(robot = %id, pieces = pieces.bits(), warbase, "Computer built robot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::map_generation::BattlefieldConfig;
    use crate::random::GameRng;
    use crate::registry::FULL_STRENGTH;

    fn sim() -> Simulation {
        Simulation::new(EngineConfig {
            battlefield: BattlefieldConfig {
                terrain_patches: 0,
                ..BattlefieldConfig::default()
            },
            enemy_ai_enabled: false,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_design_decoding() {
        let pieces = design_from_draws(1, 0b0_0001).unwrap();
        assert_eq!(pieces, PieceSet::from_pieces(&[Piece::Tracks, Piece::Cannon]));
        assert!(design_from_draws(3, 1).is_none());
        let pieces = design_from_draws(0b1110, 0b1_1000).unwrap();
        assert_eq!(
            pieces,
            PieceSet::from_pieces(&[Piece::Antigrav, Piece::Nuclear, Piece::Electronics])
        );
    }

    #[test]
    fn test_armament_cap_scales_with_census() {
        assert_eq!(armament_cap(0), 1);
        assert_eq!(armament_cap(7), 1);
        assert_eq!(armament_cap(8), 2);
        assert_eq!(armament_cap(16), 3);
        assert_eq!(armament_cap(24), 3);
    }

    #[test]
    fn test_spawn_tracks_and_cannon() {
        let mut sim = sim();
        // act, slot 0, warbase choice, chassis tracks, cannon only
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1, 1]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);

        let id = RobotId::new(Faction::Enemy, 0);
        assert_eq!(events.robots_built, vec![id]);
        let robot = sim.robot(id).unwrap();
        assert_eq!(robot.pieces, PieceSet::from_pieces(&[Piece::Tracks, Piece::Cannon]));
        assert_eq!(robot.strength, FULL_STRENGTH);
        assert_eq!(robot.order, Order::StopAndDefend);
        assert_eq!(robot.control, ControlMode::EnemyAi);
        assert_eq!(robot.position(), sim.buildings()[3].capture_tile());
        assert_eq!(sim.census(Faction::Enemy), 1);
        // 7 borrowed from the general reserve of 20.
        assert_eq!(sim.resources(Faction::Enemy).general, 13);
    }

    #[test]
    fn test_skip_draw_does_nothing() {
        let mut sim = sim();
        sim.set_rng(GameRng::scripted(vec![24, 0, 0, 1, 1]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);
        assert!(events.robots_built.is_empty());
        assert_eq!(sim.census(Faction::Enemy), 0);
    }

    #[test]
    fn test_over_armed_design_is_refused() {
        let mut sim = sim();
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1, 0b011]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);
        assert!(events.robots_built.is_empty());
        assert_eq!(sim.resources(Faction::Enemy).general, 20);
    }

    #[test]
    fn test_unaffordable_design_is_refused() {
        let mut sim = sim();
        sim.resources_mut(Faction::Enemy).general = 10;
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1, 1]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);
        assert!(events.robots_built.is_empty());
        assert_eq!(sim.resources(Faction::Enemy).general, 10);
    }

    #[test]
    fn test_blocked_entrance_refuses_spawn() {
        let mut sim = sim();
        let (x, y) = sim.buildings()[3].capture_tile();
        sim.map.set_occupied(x, y, true);
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1, 1]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);
        assert!(events.robots_built.is_empty());
    }

    #[test]
    fn test_refresh_reassigns_idle_robot() {
        let mut sim = sim();
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1, 1]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);

        // act, slot 0, keep draw, coin heads: capture neutral factories
        sim.set_rng(GameRng::scripted(vec![0, 0, 5, 1]));
        sim.update_enemy_ai(&mut events);
        let robot = sim.robot(RobotId::new(Faction::Enemy, 0)).unwrap();
        assert_eq!(robot.order, Order::CaptureNeutralFactories);
        let target = robot.argument.building().unwrap();
        assert!(sim.buildings()[target].owner().is_none());
    }

    #[test]
    fn test_refresh_falls_back_to_destroy_robots() {
        let mut sim = sim();
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1, 1]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);

        // coin tails twice: capture enemy warbases; the player's warbase is a
        // valid target, so take it away first.
        sim.buildings[0].set_owner(Faction::Enemy);
        sim.set_rng(GameRng::scripted(vec![0, 0, 5, 0, 0]));
        sim.update_enemy_ai(&mut events);
        let robot = sim.robot(RobotId::new(Faction::Enemy, 0)).unwrap();
        assert_eq!(robot.order, Order::DestroyRobots);
        assert_eq!(robot.argument, OrderArgument::None);
    }

    #[test]
    fn test_busy_robot_usually_keeps_orders() {
        let mut sim = sim();
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1, 1]));
        let mut events = TickEvents::default();
        sim.update_enemy_ai(&mut events);
        let id = RobotId::new(Faction::Enemy, 0);
        sim.robot_mut(id).unwrap().order = Order::DestroyRobots;

        sim.set_rng(GameRng::scripted(vec![0, 0, 5, 1]));
        sim.update_enemy_ai(&mut events);
        assert_eq!(sim.robot(id).unwrap().order, Order::DestroyRobots);

        // A zero keep draw forces a re-task.
        sim.set_rng(GameRng::scripted(vec![0, 0, 0, 1]));
        sim.update_enemy_ai(&mut events);
        assert_eq!(sim.robot(id).unwrap().order, Order::CaptureNeutralFactories);
    }
}
