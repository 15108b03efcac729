//! Per-robot decision making.
//!
//! Robots act only when their activation countdown runs out. An activation
//! fires at an enemy straight ahead if possible, otherwise turns towards any
//! enemy in sight, otherwise keeps walking along a heading chosen from its
//! orders. Headings are held for a few steps before being re-chosen.

use crate::direction::{Direction, DirectionSet};
use crate::factions::Faction;
use crate::interfaces::InputState;
use crate::movement::{activation_interval, StepResult};
use crate::orders::{Order, OrderArgument, TargetQuery};
use crate::random::RandomSource;
use crate::registry::{ControlMode, RobotId, ROBOTS_PER_FACTION};
use crate::simulation::{Simulation, TickEvents};

/// Within this many cells of its target a robot re-plans every activation.
pub const CLOSE_RANGE: i16 = 8;

/// Shortest and longest walk before a new heading is chosen.
pub const WALK_STEPS: (u8, u8) = (3, 6);

impl Simulation {
    /// Update every robot, player array first, in slot order.
    pub(crate) fn update_robots(&mut self, input: &InputState, events: &mut TickEvents) {
        for faction in Faction::ALL {
            for slot in 0..ROBOTS_PER_FACTION {
                self.update_robot(RobotId::new(faction, slot as u8), input, events);
            }
        }
    }

    fn update_robot(&mut self, id: RobotId, input: &InputState, events: &mut TickEvents) {
        let Some(robot) = self.robot_mut(id) else {
            return;
        };

        if robot.strength <= 0 {
            robot.strength += 1;
            if robot.strength >= 0 {
                self.remove_robot(id);
                tracing::trace!(robot = %id, "Wreck cleared");
            }
            return;
        }

        match robot.control {
            ControlMode::PlayerLanded => return,
            ControlMode::DirectControl => {
                self.drive_direct(id, input, events);
                return;
            }
            ControlMode::Auto | ControlMode::EnemyAi => {}
        }

        robot.cooldown = robot.cooldown.saturating_sub(1);
        if robot.cooldown > 0 {
            return;
        }
        if let Some(chassis) = robot.pieces.chassis() {
            robot.cooldown = activation_interval(chassis, robot.altitude);
        }
        self.activate(id, events);
    }

    /// Steer a robot from the controls. Firing is checked every tick;
    /// movement waits for the activation countdown.
    fn drive_direct(&mut self, id: RobotId, input: &InputState, events: &mut TickEvents) {
        if input.fire {
            let weapon = self.robot(id).and_then(|r| r.pieces.weapons().next());
            if let Some(weapon) = weapon {
                self.fire(id, weapon, events);
            }
        }

        let Some(robot) = self.robot_mut(id) else {
            return;
        };
        robot.cooldown = robot.cooldown.saturating_sub(1);
        if robot.cooldown > 0 {
            return;
        }
        if let Some(chassis) = robot.pieces.chassis() {
            robot.cooldown = activation_interval(chassis, robot.altitude);
        }
        if let Some(direction) = input.direction() {
            self.turn_or_step(id, direction);
        }
    }

    /// One decision cycle for a robot on automatic.
    fn activate(&mut self, id: RobotId, events: &mut TickEvents) {
        let Some(robot) = self.robot(id) else {
            return;
        };
        let (facing, pieces, order) = (robot.facing, robot.pieces, robot.order);

        if order.is_nuclear() && pieces.has_nuclear() {
            let target = self.resolve_building_target(id);
            if target.is_some() && target == self.nuclear_target(id) {
                self.detonate(id, events);
                return;
            }
        }

        let armed = pieces.weapons().next().is_some();
        if armed && self.line_of_sight(id, facing) && self.can_fire(id) {
            let weapons: Vec<_> = pieces.weapons().collect();
            let weapon = weapons[self.rng.below(weapons.len() as u8) as usize];
            self.fire(id, weapon, events);
            if self.movable_directions(id).contains(facing) {
                self.advance(id, facing);
            }
            return;
        }

        if armed {
            let visible: DirectionSet = Direction::ALL
                .into_iter()
                .filter(|&d| self.line_of_sight(id, d))
                .collect();
            if !visible.is_empty() {
                let wanted = match visible.single() {
                    Some(direction) => Some(direction),
                    None => self
                        .choose_direction(id)
                        .filter(|d| visible.contains(*d))
                        .or_else(|| visible.nth_wrapping(self.rng.next_byte())),
                };
                if let (Some(wanted), Some(robot)) = (wanted, self.robot_mut(id)) {
                    robot.facing = robot.facing.turn_toward(wanted);
                }
                return;
            }
        }

        self.walk(id);
    }

    /// Keep walking the current heading, re-planning when it runs out.
    fn walk(&mut self, id: RobotId) {
        let Some(robot) = self.robot(id) else {
            return;
        };
        let idle = robot.walk_steps == 0 || robot.desired.is_none();
        let close = self
            .target_offset(id)
            .is_some_and(|(dx, dy)| dx.abs().max(dy.abs()) <= CLOSE_RANGE);
        let replan = idle || close;

        if replan {
            let steps = self.rng.in_range(WALK_STEPS.0, WALK_STEPS.1);
            let desired = self.choose_direction(id);
            if let Some(robot) = self.robot_mut(id) {
                robot.walk_steps = steps;
                robot.desired = desired;
            }
        } else if let Some(robot) = self.robot_mut(id) {
            robot.walk_steps -= 1;
        }

        let Some(desired) = self.robot(id).and_then(|r| r.desired) else {
            return;
        };
        if self.turn_or_step(id, desired) == StepResult::Blocked {
            if let Some(robot) = self.robot_mut(id) {
                robot.desired = None;
                robot.walk_steps = 0;
                robot.detour_flip = !robot.detour_flip;
            }
        }
    }

    /// Pick a heading that serves the robot's orders.
    ///
    /// Returns `None` when the robot should stay where it is.
    pub fn choose_direction(&mut self, id: RobotId) -> Option<Direction> {
        let order = self.robot(id)?.order;
        let movable = self.movable_directions(id);
        match order {
            Order::StopAndDefend => None,
            Order::Advance | Order::Retreat => self.heading_direction(id, movable),
            _ => {
                let (dx, dy) = self.target_offset(id)?;
                self.approach(id, dx, dy, movable)
            }
        }
    }

    fn heading_direction(&mut self, id: RobotId, movable: DirectionSet) -> Option<Direction> {
        let robot = self.robot(id)?;
        let heading = Direction::from_dx(robot.order.heading_sign(id.faction))?;
        let flip = robot.detour_flip;

        // Half the draws favour the heading; the rest wander vertically.
        for _ in 0..2 {
            let candidate = match self.rng.below(4) {
                0 | 1 => heading,
                2 => Direction::Up,
                _ => Direction::Down,
            };
            if movable.contains(candidate) {
                return Some(candidate);
            }
        }
        if movable.contains(heading) {
            return Some(heading);
        }
        self.detour(heading, flip, movable)
    }

    fn approach(&mut self, id: RobotId, dx: i16, dy: i16, movable: DirectionSet) -> Option<Direction> {
        if dx == 0 && dy == 0 {
            return None;
        }
        let flip = self.robot(id)?.detour_flip;
        let horizontal = Direction::from_dx(dx);
        let vertical = Direction::from_dy(dy);

        if dx.abs().max(dy.abs()) > CLOSE_RANGE {
            let (primary, secondary) = if dx.abs() >= dy.abs() {
                (horizontal, vertical)
            } else {
                (vertical, horizontal)
            };
            if let Some(d) = primary.filter(|d| movable.contains(*d)) {
                return Some(d);
            }
            if let Some(d) = secondary.filter(|d| movable.contains(*d)) {
                return Some(d);
            }
            return primary.and_then(|p| self.detour(p, flip, movable));
        }

        let options: DirectionSet = [horizontal, vertical]
            .into_iter()
            .flatten()
            .filter(|d| movable.contains(*d))
            .collect();
        match options.len() {
            0 => {
                let blocked = horizontal.or(vertical)?;
                self.detour(blocked, flip, movable)
            }
            1 => options.single(),
            _ => options.nth_wrapping(self.rng.next_byte()),
        }
    }

    /// Side-step around a blocked direction. The perpendicular preference
    /// swaps with `flip`; with both sides blocked any free way is taken.
    fn detour(&mut self, blocked: Direction, flip: bool, movable: DirectionSet) -> Option<Direction> {
        let [a, b] = blocked.perpendicular();
        let sides = if flip { [b, a] } else { [a, b] };
        sides
            .into_iter()
            .find(|d| movable.contains(*d))
            .or_else(|| movable.nth_wrapping(self.rng.next_byte()))
    }

    /// Offset from a robot to its order's target, resolving the target first.
    fn target_offset(&mut self, id: RobotId) -> Option<(i16, i16)> {
        let robot = self.robot(id)?;
        let (x, y) = robot.position();
        let (tx, ty) = match robot.order.target_query()? {
            TargetQuery::Robot => self.resolve_robot_target(id)?,
            TargetQuery::Building { .. } => {
                let index = self.resolve_building_target(id)?;
                self.buildings[index].capture_tile()
            }
        };
        Some((tx - x, ty - y))
    }

    /// Current robot target, re-acquiring the nearest opposing robot when
    /// the old one is gone.
    fn resolve_robot_target(&mut self, id: RobotId) -> Option<(i16, i16)> {
        let robot = self.robot(id)?;
        if let OrderArgument::Robot(target) = robot.argument {
            if let Some(t) = self.robot(target).filter(|t| t.is_alive()) {
                if target.faction != id.faction {
                    return Some(t.position());
                }
            }
        }

        let x = robot.x;
        let opponent = id.faction.opponent();
        let found = self.robots[opponent.index()]
            .iter()
            .filter(|(_, r)| r.is_alive())
            .min_by_key(|(slot, r)| ((r.x - x).abs(), *slot))
            .map(|(slot, r)| (RobotId::new(opponent, slot as u8), r.position()));

        match found {
            Some((target, position)) => {
                if let Some(robot) = self.robot_mut(id) {
                    robot.argument = OrderArgument::Robot(target);
                }
                Some(position)
            }
            None => {
                self.target_lost(id);
                None
            }
        }
    }

    /// Current building target, re-acquiring one when the old one no longer
    /// qualifies.
    pub(crate) fn resolve_building_target(&mut self, id: RobotId) -> Option<usize> {
        let robot = self.robot(id)?;
        let order = robot.order;
        let Some(query @ TargetQuery::Building { .. }) = order.target_query() else {
            return None;
        };
        if let Some(index) = robot.argument.building() {
            if self
                .buildings
                .get(index)
                .is_some_and(|b| query.matches(b, id.faction))
            {
                return Some(index);
            }
        }

        match self.find_building_target(id, order) {
            Some(index) => {
                if let Some(robot) = self.robot_mut(id) {
                    robot.argument = OrderArgument::Building(index);
                }
                Some(index)
            }
            None => {
                self.target_lost(id);
                None
            }
        }
    }

    /// Best building for `order` from a robot's point of view.
    ///
    /// Buildings already pursued by another robot of the same faction under
    /// the same order are skipped. The nearest by column distance wins, then
    /// the lowest index; rows are not compared.
    #[must_use]
    pub fn find_building_target(&self, id: RobotId, order: Order) -> Option<usize> {
        let robot = self.robot(id)?;
        let query = order.target_query()?;
        let claimed: Vec<usize> = self.robots[id.faction.index()]
            .iter()
            .filter(|&(slot, other)| slot != id.slot as usize && other.order == order)
            .filter_map(|(_, other)| other.argument.building())
            .collect();

        self.buildings
            .iter()
            .enumerate()
            .filter(|(index, b)| query.matches(b, id.faction) && !claimed.contains(index))
            .min_by_key(|(index, b)| ((b.x - robot.x).abs(), *index))
            .map(|(index, _)| index)
    }

    /// No target left: computer robots give up and hold position.
    fn target_lost(&mut self, id: RobotId) {
        let Some(robot) = self.robot_mut(id) else {
            return;
        };
        robot.argument = OrderArgument::None;
        if robot.control == ControlMode::EnemyAi {
            robot.order = Order::StopAndDefend;
            robot.desired = None;
            tracing::trace!(robot = %id, "Target lost, holding position");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::map_generation::BattlefieldConfig;
    use crate::pieces::{Piece, PieceSet};
    use crate::random::GameRng;
    use crate::registry::Robot;

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

    fn spawn(sim: &mut Simulation, faction: Faction, x: i16, y: i16, pieces: &[Piece]) -> RobotId {
        let facing = if faction == Faction::Player {
            Direction::Right
        } else {
            Direction::Left
        };
        let robot = Robot::new(
            x,
            y,
            PieceSet::from_pieces(pieces),
            facing,
            ControlMode::for_faction(faction),
        );
        let slot = sim.robots[faction.index()].first_free_in(0..24).unwrap();
        sim.place_robot(faction, slot, robot)
    }

    fn set_order(sim: &mut Simulation, id: RobotId, order: Order, argument: OrderArgument) {
        let robot = sim.robot_mut(id).unwrap();
        robot.order = order;
        robot.argument = argument;
    }

    #[test]
    fn test_stop_and_defend_stays() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Player, 100, 8, &[Piece::Tracks, Piece::Cannon]);
        assert_eq!(sim.choose_direction(id), None);
        for _ in 0..30 {
            sim.step(&InputState::IDLE);
        }
        assert_eq!(sim.robot(id).unwrap().position(), (100, 8));
    }

    #[test]
    fn test_advance_moves_towards_opponent() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Player, 100, 8, &[Piece::Antigrav, Piece::Cannon]);
        set_order(&mut sim, id, Order::Advance, OrderArgument::Distance(4));
        for _ in 0..200 {
            sim.step(&InputState::IDLE);
        }
        let robot = sim.robot(id).unwrap();
        assert_eq!(robot.order, Order::StopAndDefend);
        assert!(robot.x >= 104, "ended at {}", robot.x);
    }

    #[test]
    fn test_heading_draw_prefers_heading() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Player, 100, 8, &[Piece::Tracks, Piece::Cannon]);
        set_order(&mut sim, id, Order::Advance, OrderArgument::Distance(4));
        sim.set_rng(GameRng::scripted(vec![0]));
        assert_eq!(sim.choose_direction(id), Some(Direction::Right));
        sim.set_rng(GameRng::scripted(vec![2]));
        assert_eq!(sim.choose_direction(id), Some(Direction::Up));
    }

    #[test]
    fn test_fires_at_enemy_ahead() {
        let mut sim = sim();
        let me = spawn(&mut sim, Faction::Player, 100, 8, &[Piece::Tracks, Piece::Phasers]);
        let them = spawn(&mut sim, Faction::Enemy, 104, 8, &[Piece::Tracks, Piece::Cannon]);
        sim.robot_mut(them).unwrap().control = ControlMode::PlayerLanded;
        let events = sim.step(&InputState::IDLE);
        assert!(events.sounds.contains(&crate::interfaces::SoundEvent::WeaponFired));
        // The bullet holds the cell ahead, so the shooter stays put.
        assert_eq!(sim.robot(me).unwrap().x, 100);
        assert_eq!(sim.bullets().len(), 1);
    }

    #[test]
    fn test_turns_towards_visible_enemy() {
        let mut sim = sim();
        let me = spawn(&mut sim, Faction::Player, 100, 4, &[Piece::Tracks, Piece::Cannon]);
        let them = spawn(&mut sim, Faction::Enemy, 100, 10, &[Piece::Tracks, Piece::Cannon]);
        sim.robot_mut(them).unwrap().control = ControlMode::PlayerLanded;
        sim.step(&InputState::IDLE);
        assert_eq!(sim.robot(me).unwrap().facing, Direction::Up);
    }

    #[test]
    fn test_destroyed_robot_blinks_then_frees() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Player, 100, 8, &[Piece::Tracks, Piece::Cannon]);
        sim.robot_mut(id).unwrap().strength = crate::registry::DESTROYED_STRENGTH;
        for _ in 0..15 {
            sim.step(&InputState::IDLE);
        }
        assert!(sim.robot(id).is_some());
        assert!(sim.map().is_occupied(100, 8));
        sim.step(&InputState::IDLE);
        assert!(sim.robot(id).is_none());
        assert!(!sim.map().is_occupied(100, 8));
    }

    #[test]
    fn test_building_target_exclusivity() {
        let mut sim = sim();
        let a = spawn(&mut sim, Faction::Enemy, 100, 8, &[Piece::Tracks, Piece::Cannon]);
        let b = spawn(&mut sim, Faction::Enemy, 101, 8, &[Piece::Tracks, Piece::Cannon]);
        let first = sim.find_building_target(a, Order::CaptureNeutralFactories).unwrap();
        set_order(&mut sim, a, Order::CaptureNeutralFactories, OrderArgument::Building(first));
        let second = sim.find_building_target(b, Order::CaptureNeutralFactories).unwrap();
        assert_ne!(first, second);
        // Factory 3 at column 94 is nearest to column 100.
        assert_eq!(first, 7);
        // A different order does not claim the building.
        let other = sim.find_building_target(b, Order::CaptureEnemyFactories);
        assert_eq!(other, None);
    }

    #[test]
    fn test_ai_robot_without_target_holds() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Enemy, 100, 8, &[Piece::Tracks, Piece::Cannon]);
        set_order(&mut sim, id, Order::CaptureEnemyFactories, OrderArgument::None);
        assert_eq!(sim.choose_direction(id), None);
        assert_eq!(sim.robot(id).unwrap().order, Order::StopAndDefend);
    }

    #[test]
    fn test_player_robot_without_target_keeps_order() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Player, 100, 8, &[Piece::Tracks, Piece::Cannon]);
        set_order(&mut sim, id, Order::DestroyRobots, OrderArgument::None);
        assert_eq!(sim.choose_direction(id), None);
        assert_eq!(sim.robot(id).unwrap().order, Order::DestroyRobots);
    }

    #[test]
    fn test_far_target_moves_along_long_axis() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Player, 60, 8, &[Piece::Tracks, Piece::Cannon]);
        spawn(&mut sim, Faction::Enemy, 90, 12, &[Piece::Tracks, Piece::Cannon]);
        set_order(&mut sim, id, Order::DestroyRobots, OrderArgument::None);
        assert_eq!(sim.choose_direction(id), Some(Direction::Right));
        assert!(matches!(
            sim.robot(id).unwrap().argument,
            OrderArgument::Robot(t) if t.faction == Faction::Enemy
        ));
    }

    #[test]
    fn test_close_target_takes_only_free_axis() {
        let mut sim = sim();
        let id = spawn(&mut sim, Faction::Player, 100, 8, &[Piece::Tracks, Piece::Cannon]);
        spawn(&mut sim, Faction::Enemy, 103, 11, &[Piece::Tracks, Piece::Cannon]);
        spawn(&mut sim, Faction::Player, 101, 8, &[Piece::Tracks, Piece::Cannon]);
        set_order(&mut sim, id, Order::DestroyRobots, OrderArgument::None);
        assert_eq!(sim.choose_direction(id), Some(Direction::Up));
    }

    #[test]
    fn test_nuclear_robot_detonates_at_target() {
        let mut sim = sim();
        // Factory 4 stands at (112, 2).
        sim.buildings[8].set_owner(Faction::Player);
        sim.sync_decorations(8);
        let id = spawn(&mut sim, Faction::Enemy, 114, 1, &[Piece::Antigrav, Piece::Nuclear]);
        set_order(&mut sim, id, Order::DestroyFactories, OrderArgument::None);
        let mut events = TickEvents::default();
        sim.activate(id, &mut events);
        assert_eq!(events.buildings_destroyed, vec![8]);
        assert!(sim.robot(id).is_none());
    }
}
