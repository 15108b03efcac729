//! The player ship and the commands the human player can give.
//!
//! The ship hovers over the battlefield. Flying into something taller than
//! the ship makes it climb instead of moving; with no input it sinks back
//! down until it rests on whatever is below. Resting on one of the player's
//! own robots lands on it, which pauses the robot and unlocks orders and
//! direct control. Resting on a player warbase entrance unlocks construction.

use serde::{Deserialize, Serialize};

use crate::buildings::BuildingKind;
use crate::direction::Direction;
use crate::economy::BorrowPolicy;
use crate::error::{EngineError, Result};
use crate::factions::Faction;
use crate::interfaces::{InputState, SoundEvent};
use crate::map::{MAP_WIDTH, MAX_ROBOT_X, MIN_ROBOT_X};
use crate::orders::{Order, OrderArgument, DEFAULT_ORDER_DISTANCE};
use crate::pieces::PieceSet;
use crate::registry::{ControlMode, Robot, RobotId};
use crate::render::VIEW_COLUMNS;
use crate::simulation::{Simulation, TickEvents};

/// Highest altitude the ship can reach.
pub const MAX_SHIP_ALTITUDE: u8 = 60;

/// Altitude gained per blocked move.
pub const CLIMB_RATE: u8 = 4;

/// Columns between the left screen edge and the ship.
const SCROLL_LEAD: i16 = 8;

/// The player's avatar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerShip {
    /// Map column.
    pub x: i16,
    /// Map row.
    pub y: i16,
    /// Height above the map floor.
    pub altitude: u8,
    /// Robot the ship rests on.
    pub landed_on: Option<RobotId>,
    /// Robot under direct control.
    pub controlling: Option<RobotId>,
}

impl PlayerShip {
    /// Ship at rest at a cell.
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self {
            x,
            y,
            altitude: 0,
            landed_on: None,
            controlling: None,
        }
    }
}

impl Simulation {
    /// Whether the ship rests on the floor of its cell.
    #[must_use]
    pub fn ship_grounded(&self) -> bool {
        self.ship.altitude <= self.altitude_at(self.ship.x, self.ship.y)
    }

    /// First visible map column.
    #[must_use]
    pub fn viewport_scroll(&self) -> i16 {
        (self.ship.x - SCROLL_LEAD).clamp(0, MAP_WIDTH - VIEW_COLUMNS)
    }

    /// Move, climb or sink the ship, then handle landing.
    ///
    /// The ship's map bit is cleared and set again every tick. While a robot
    /// is under direct control the directional input steers the robot and the
    /// ship stays put.
    pub(crate) fn apply_player_input(&mut self, input: &InputState, _events: &mut TickEvents) {
        self.map.set_player(self.ship.x, self.ship.y, false);

        if self.ship.controlling.is_none() {
            match input.direction() {
                Some(direction) => self.fly_ship(direction),
                None => self.sink(),
            }
            self.update_landing();
        }

        self.map.set_player(self.ship.x, self.ship.y, true);
    }

    fn fly_ship(&mut self, direction: Direction) {
        self.lift_off();
        let (dx, dy) = direction.delta();
        let (nx, ny) = (self.ship.x + dx, self.ship.y + dy);
        if !(MIN_ROBOT_X..=MAX_ROBOT_X).contains(&nx) || !(0..crate::map::MAP_HEIGHT).contains(&ny)
        {
            return;
        }
        if self.altitude_at(nx, ny) >= self.ship.altitude {
            self.ship.altitude = (self.ship.altitude + CLIMB_RATE).min(MAX_SHIP_ALTITUDE);
        } else {
            self.ship.x = nx;
            self.ship.y = ny;
        }
    }

    fn sink(&mut self) {
        let floor = self.altitude_at(self.ship.x, self.ship.y);
        if self.ship.altitude > floor {
            self.ship.altitude -= 1;
        } else {
            self.ship.altitude = floor;
        }
    }

    fn lift_off(&mut self) {
        if let Some(id) = self.ship.landed_on.take() {
            if let Some(robot) = self.robot_mut(id) {
                if robot.control == ControlMode::PlayerLanded {
                    robot.control = ControlMode::Auto;
                }
            }
        }
    }

    fn update_landing(&mut self) {
        if self.ship.landed_on.is_some() || !self.ship_grounded() {
            return;
        }
        let Some(id) = self.robot_at(self.ship.x, self.ship.y) else {
            return;
        };
        if id.faction != Faction::Player {
            return;
        }
        if let Some(robot) = self.robot_mut(id) {
            if robot.is_alive() && robot.control == ControlMode::Auto {
                robot.control = ControlMode::PlayerLanded;
                self.ship.landed_on = Some(id);
                tracing::trace!(robot = %id, "Ship landed on robot");
            }
        }
    }

    /// Keep the ship over the directly controlled robot, and drop control
    /// when that robot is gone.
    pub(crate) fn follow_direct_control(&mut self) {
        let Some(id) = self.ship.controlling else {
            return;
        };
        let target = self
            .robot(id)
            .filter(|r| r.is_alive() && r.control == ControlMode::DirectControl)
            .map(|r| (r.x, r.y, r.top()));
        self.map.set_player(self.ship.x, self.ship.y, false);
        match target {
            Some((x, y, top)) => {
                self.ship.x = x;
                self.ship.y = y;
                self.ship.altitude = top;
            }
            None => {
                self.ship.controlling = None;
                self.ship.landed_on = None;
            }
        }
        self.map.set_player(self.ship.x, self.ship.y, true);
    }

    /// Player warbase whose entrance the ship rests on.
    fn landed_warbase(&self) -> Option<usize> {
        if !self.ship_grounded() {
            return None;
        }
        self.buildings.iter().position(|b| {
            b.kind() == BuildingKind::Warbase
                && b.owner() == Some(Faction::Player)
                && b.capture_tile() == (self.ship.x, self.ship.y)
        })
    }

    /// Build a robot at the warbase entrance the ship rests on.
    ///
    /// Category stock is used first and any shortfall is borrowed from the
    /// general reserve without limit. Refusals beep and change nothing.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPieces`], [`EngineError::NotLanded`],
    /// [`EngineError::EntranceBlocked`], [`EngineError::NoFreeSlot`] or
    /// [`EngineError::InsufficientResources`].
    pub fn construct_robot(&mut self, pieces: PieceSet) -> Result<RobotId> {
        let result = self.try_construct(pieces);
        if let Err(ref error) = result {
            self.pending.sounds.push(SoundEvent::ErrorBeep);
            tracing::debug!(%error, "Construction refused");
        }
        result
    }

    fn try_construct(&mut self, pieces: PieceSet) -> Result<RobotId> {
        if !pieces.is_buildable() {
            return Err(EngineError::InvalidPieces(format!(
                "{:#010b} needs one chassis and one other piece",
                pieces.bits()
            )));
        }
        let warbase = self.landed_warbase().ok_or(EngineError::NotLanded)?;
        let (x, y) = self.buildings[warbase].capture_tile();
        if self.map.is_occupied(x, y) {
            return Err(EngineError::EntranceBlocked);
        }
        let slot = self.robots[Faction::Player.index()]
            .first_free_in(0..crate::registry::ROBOTS_PER_FACTION)
            .ok_or(EngineError::NoFreeSlot("robot"))?;
        let payment = self.resources[Faction::Player.index()]
            .plan_payment(pieces, BorrowPolicy::Unlimited)?;
        self.resources[Faction::Player.index()].apply_payment(&payment);

        let robot = Robot::new(x, y, pieces, Direction::Right, ControlMode::PlayerLanded);
        let id = self.place_robot(Faction::Player, slot, robot);
        self.ship.landed_on = Some(id);
        self.ship.altitude = self.altitude_at(x, y);
        self.pending.robots_built.push(id);
        tracing::debug!(robot = %id, pieces = pieces.bits(), "Player built robot");
        Ok(id)
    }

    fn player_robot(&self, id: RobotId) -> Result<&Robot> {
        if id.faction != Faction::Player {
            return Err(EngineError::NotPlayerRobot(id));
        }
        self.robot(id)
            .filter(|r| r.is_alive())
            .ok_or(EngineError::InvalidRobot(id))
    }

    /// Give a player robot a new order.
    ///
    /// `distance` applies to advance and retreat and defaults to
    /// [`DEFAULT_ORDER_DISTANCE`]. Target orders resolve their target lazily.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotPlayerRobot`] or [`EngineError::InvalidRobot`].
    pub fn issue_order(&mut self, id: RobotId, order: Order, distance: Option<u8>) -> Result<()> {
        self.player_robot(id)?;
        let argument = if order.is_distance() {
            OrderArgument::Distance(distance.unwrap_or(DEFAULT_ORDER_DISTANCE).max(1))
        } else {
            OrderArgument::None
        };
        if let Some(robot) = self.robot_mut(id) {
            robot.order = order;
            robot.argument = argument;
            robot.desired = None;
            robot.walk_steps = 0;
        }
        self.pending.sounds.push(SoundEvent::MenuMove);
        tracing::debug!(robot = %id, ?order, "Order issued");
        Ok(())
    }

    /// Take direct control of the robot the ship has landed on.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotLanded`] when the ship is not resting on a robot.
    pub fn take_direct_control(&mut self) -> Result<RobotId> {
        let id = self.ship.landed_on.ok_or(EngineError::NotLanded)?;
        self.player_robot(id)?;
        if let Some(robot) = self.robot_mut(id) {
            robot.control = ControlMode::DirectControl;
            robot.desired = None;
        }
        self.ship.controlling = Some(id);
        Ok(id)
    }

    /// Return the controlled robot to its orders.
    ///
    /// The ship stays landed on it.
    pub fn release_direct_control(&mut self) {
        let Some(id) = self.ship.controlling.take() else {
            return;
        };
        if let Some(robot) = self.robot_mut(id) {
            if robot.control == ControlMode::DirectControl {
                robot.control = ControlMode::PlayerLanded;
                robot.desired = None;
            }
        }
        self.ship.landed_on = Some(id);
    }

    /// Set off a player robot's nuclear warhead.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingEquipment`] when the robot has no warhead.
    pub fn detonate_nuclear(&mut self, id: RobotId) -> Result<()> {
        if !self.player_robot(id)?.pieces.has_nuclear() {
            self.pending.sounds.push(SoundEvent::ErrorBeep);
            return Err(EngineError::MissingEquipment(id));
        }
        let mut events = TickEvents::default();
        self.detonate(id, &mut events);
        self.pending.merge(events);
        Ok(())
    }
}
