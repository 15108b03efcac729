//! Collision checks, stepping and the speed model.
//!
//! Robots occupy exactly one cell. A step is legal when the destination is
//! inside the robot columns, its element is below the chassis limit, and no
//! robot, bullet or decoration is there. The ship blocks the cell too,
//! unless it hovers above the robot's top.

use crate::direction::{Direction, DirectionSet};
use crate::error::{EngineError, Result};
use crate::factions::Faction;
use crate::map::{Map, MAX_ROBOT_X, MIN_ROBOT_X};
use crate::orders::{Order, OrderArgument};
use crate::pieces::Chassis;
use crate::registry::{ControlMode, Robot, RobotId, ROBOTS_PER_FACTION};
use crate::simulation::Simulation;

/// Activation intervals indexed by terrain band, then chassis.
pub const SPEED_TABLE: [[u8; 3]; 3] = [
    [6, 4, 3], // flat
    [8, 6, 3], // rugged
    [9, 7, 4], // mountain
];

/// Terrain band of an altitude: flat, rugged or mountain.
#[must_use]
pub const fn speed_band(altitude: u8) -> usize {
    match altitude {
        0 => 0,
        1..=3 => 1,
        _ => 2,
    }
}

/// Ticks between activations for a chassis standing at `altitude`.
#[must_use]
pub const fn activation_interval(chassis: Chassis, altitude: u8) -> u8 {
    SPEED_TABLE[speed_band(altitude)][chassis.index()]
}

/// What one call to [`Simulation::turn_or_step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Rotated 90° towards the wanted direction.
    Turned,
    /// Moved one cell.
    Moved,
    /// Already facing the way but the cell is blocked.
    Blocked,
}

impl Simulation {
    /// Whether `robot` could stand on `(x, y)`.
    pub(crate) fn can_enter(&self, robot: &Robot, x: i16, y: i16) -> bool {
        if !Map::in_bounds(x, y) || !(MIN_ROBOT_X..=MAX_ROBOT_X).contains(&x) {
            return false;
        }
        let Some(cell) = self.map.cell(x, y) else {
            return false;
        };
        let limit = robot.pieces.chassis().map_or(0, Chassis::max_element);
        if cell.element_code() >= limit || cell.is_occupied() {
            return false;
        }
        !cell.has_player() || self.ship.altitude > robot.top()
    }

    /// Directions a robot can step in right now.
    #[must_use]
    pub fn movable_directions(&self, id: RobotId) -> DirectionSet {
        let Some(robot) = self.robot(id) else {
            return DirectionSet::EMPTY;
        };
        Direction::ALL
            .into_iter()
            .filter(|d| {
                let (dx, dy) = d.delta();
                self.can_enter(robot, robot.x + dx, robot.y + dy)
            })
            .collect()
    }

    /// Move a robot one cell. Returns `false` (and changes nothing) if blocked.
    ///
    /// Advance and retreat distances shrink on steps along the heading and
    /// grow on steps against it; reaching zero ends the order. Directly
    /// controlled robots leave their order argument alone.
    pub fn advance(&mut self, id: RobotId, direction: Direction) -> bool {
        if !self.movable_directions(id).contains(direction) {
            return false;
        }
        let Some(robot) = self.robot(id) else {
            return false;
        };
        let (dx, dy) = direction.delta();
        let (from, to) = ((robot.x, robot.y), (robot.x + dx, robot.y + dy));
        let altitude = self.map.terrain_height(to.0, to.1);

        self.map.set_occupied(from.0, from.1, false);
        self.map.set_occupied(to.0, to.1, true);

        let Some(robot) = self.robot_mut(id) else {
            return false;
        };
        robot.x = to.0;
        robot.y = to.1;
        robot.altitude = altitude;
        if let Some(chassis) = robot.pieces.chassis() {
            robot.cooldown = activation_interval(chassis, altitude);
        }
        if robot.control != ControlMode::DirectControl {
            update_distance(robot, id.faction, dx);
        }
        true
    }

    /// Turn towards `desired`, or step if already facing it.
    pub(crate) fn turn_or_step(&mut self, id: RobotId, desired: Direction) -> StepResult {
        let Some(robot) = self.robot_mut(id) else {
            return StepResult::Blocked;
        };
        if robot.facing != desired {
            robot.facing = robot.facing.turn_toward(desired);
            return StepResult::Turned;
        }
        if self.advance(id, desired) {
            StepResult::Moved
        } else {
            StepResult::Blocked
        }
    }

    /// Add a robot to a faction's first free slot without paying for it.
    ///
    /// Used for scenario setup and tools; normal play builds robots through
    /// [`Simulation::construct_robot`] and the computer strategy.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPieces`] without a chassis,
    /// [`EngineError::EntranceBlocked`] when the cell cannot be entered, or
    /// [`EngineError::NoFreeSlot`].
    pub fn spawn_robot(&mut self, faction: Faction, robot: Robot) -> Result<RobotId> {
        if robot.pieces.chassis().is_none() {
            return Err(EngineError::InvalidPieces(format!(
                "{:#010b} has no chassis",
                robot.pieces.bits()
            )));
        }
        if !self.can_enter(&robot, robot.x, robot.y) {
            return Err(EngineError::EntranceBlocked);
        }
        let slot = self.robots[faction.index()]
            .first_free_in(0..ROBOTS_PER_FACTION)
            .ok_or(EngineError::NoFreeSlot("robot"))?;
        let id = self.place_robot(faction, slot, robot);
        tracing::debug!(robot = %id, "Robot spawned");
        Ok(id)
    }

    /// Put a robot into a free slot and onto the map.
    ///
    /// The caller has checked that the slot and the cell are free.
    pub(crate) fn place_robot(&mut self, faction: Faction, slot: usize, mut robot: Robot) -> RobotId {
        robot.altitude = self.map.terrain_height(robot.x, robot.y);
        if let Some(chassis) = robot.pieces.chassis() {
            robot.cooldown = activation_interval(chassis, robot.altitude);
        }
        let (x, y) = robot.position();
        if self.robots[faction.index()].insert_at(slot, robot) {
            self.map.set_occupied(x, y, true);
        } else {
            tracing::warn!(?faction, slot, "Robot slot already taken");
        }
        RobotId::new(faction, slot as u8)
    }

    /// Take a robot off the map and free its slot.
    pub(crate) fn remove_robot(&mut self, id: RobotId) -> Option<Robot> {
        let robot = self.robots[id.faction.index()].remove(id.slot as usize)?;
        self.map.set_occupied(robot.x, robot.y, false);
        if self.ship.landed_on == Some(id) {
            self.ship.landed_on = None;
        }
        Some(robot)
    }
}

fn update_distance(robot: &mut Robot, faction: Faction, dx: i16) {
    if !robot.order.is_distance() {
        return;
    }
    let OrderArgument::Distance(remaining) = robot.argument else {
        return;
    };
    let sign = robot.order.heading_sign(faction);
    if dx == sign {
        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            robot.order = Order::StopAndDefend;
            robot.argument = OrderArgument::None;
            robot.desired = None;
        } else {
            robot.argument = OrderArgument::Distance(remaining);
        }
    } else if dx == -sign {
        robot.argument = OrderArgument::Distance(remaining.saturating_add(1));
    }
}
