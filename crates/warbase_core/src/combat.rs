//! Line of sight, firing, bullet flight, damage and nuclear strikes.
//!
//! # Damage
//!
//! A hit removes `max(60 - top, 0) / 4 × multiplier` strength, where `top` is
//! the target's height plus altitude. Tall robots and robots on high ground
//! are harder to hurt. When strength drops to zero or below the robot is
//! marked with [`DESTROYED_STRENGTH`] and blinks for sixteen ticks before its
//! slot is freed.

use crate::direction::Direction;
use crate::interfaces::SoundEvent;
use crate::map::{Element, Map};
use crate::pieces::Weapon;
use crate::registry::{
    Bullet, BulletClass, ControlMode, RobotId, BULLET_ALTITUDE, DESTROYED_STRENGTH,
};
use crate::simulation::{Simulation, TickEvents};

/// Sight distance in a direction the robot is not facing.
pub const SIGHT_RANGE: i16 = 8;

/// Sight distance in the facing direction.
pub const FACING_SIGHT_RANGE: i16 = 10;

/// Sight distance in the facing direction with electronics.
pub const ELECTRONICS_SIGHT_RANGE: i16 = 12;

/// Half-width of the blast window.
pub const BLAST_HALF_WIDTH: i16 = 4;

/// Top height at or above which hits do no damage.
const DAMAGE_CEILING: i16 = 60;

/// Damage dealt by a weapon to a target whose top is at `target_top`.
#[must_use]
pub fn damage(weapon: Weapon, target_top: u8) -> i16 {
    let base = (DAMAGE_CEILING - i16::from(target_top)).max(0) >> 2;
    base * weapon.damage_multiplier()
}

/// Bullet range for a weapon, with the electronics bonus.
#[must_use]
pub const fn bullet_range(weapon: Weapon, electronics: bool) -> u8 {
    weapon.base_range() + electronics as u8
}

/// How far a robot sees in `direction`.
#[must_use]
pub const fn sight_range(facing: Direction, direction: Direction, electronics: bool) -> i16 {
    if facing.index() != direction.index() {
        SIGHT_RANGE
    } else if electronics {
        ELECTRONICS_SIGHT_RANGE
    } else {
        FACING_SIGHT_RANGE
    }
}

impl Simulation {
    /// Whether a live opposing robot is the first thing a robot sees in
    /// `direction`.
    ///
    /// The ray checks the cell on its axis, then the two cells beside it,
    /// at each distance. The first occupied cell ends the search; outside the
    /// grid ends it with no sighting.
    #[must_use]
    pub fn line_of_sight(&self, id: RobotId, direction: Direction) -> bool {
        let Some(robot) = self.robot(id) else {
            return false;
        };
        let range = sight_range(robot.facing, direction, robot.pieces.has_electronics());
        let (dx, dy) = direction.delta();
        let (px, py) = direction.perpendicular()[0].delta();

        for distance in 1..=range {
            let (cx, cy) = (robot.x + dx * distance, robot.y + dy * distance);
            if !Map::in_bounds(cx, cy) {
                return false;
            }
            for lateral in [0, -1, 1] {
                let (x, y) = (cx + px * lateral, cy + py * lateral);
                if !Map::in_bounds(x, y) || !self.map.is_occupied(x, y) {
                    continue;
                }
                return self.robot_at(x, y).is_some_and(|other| {
                    other.faction != id.faction
                        && self.robot(other).is_some_and(|r| r.is_alive())
                });
            }
        }
        false
    }

    /// Bullet pool a robot's shots come from.
    fn bullet_class(&self, id: RobotId) -> BulletClass {
        match self.robot(id).map(|r| r.control) {
            Some(ControlMode::DirectControl) => BulletClass::Direct,
            Some(ControlMode::EnemyAi) => BulletClass::Enemy,
            _ => BulletClass::Friendly,
        }
    }

    /// Whether the robot's bullet pool has a free slot.
    #[must_use]
    pub fn can_fire(&self, id: RobotId) -> bool {
        self.bullets.first_free_in(self.bullet_class(id).slots()).is_some()
    }

    /// Fire a weapon in the robot's facing direction.
    ///
    /// Returns the bullet slot used, or `None` when the robot lacks the
    /// weapon or its pool is full. The bullet moves one cell at once, so a
    /// point-blank hit resolves inside this call and frees the slot again.
    pub fn fire(&mut self, id: RobotId, weapon: Weapon, events: &mut TickEvents) -> Option<usize> {
        let robot = self.robot(id)?;
        if !robot.pieces.has_weapon(weapon) {
            return None;
        }
        let slot = self.bullets.first_free_in(self.bullet_class(id).slots())?;
        let bullet = Bullet {
            x: robot.x,
            y: robot.y,
            direction: robot.facing,
            range: bullet_range(weapon, robot.pieces.has_electronics()),
            weapon,
            shooter: id.faction,
        };
        events.sounds.push(SoundEvent::WeaponFired);
        tracing::trace!(robot = %id, ?weapon, slot, "Weapon fired");
        if let Some(bullet) = self.fly(bullet, events) {
            self.map.set_occupied(bullet.x, bullet.y, true);
            self.bullets.insert_at(slot, bullet);
        }
        Some(slot)
    }

    /// Move every bullet one cell.
    pub(crate) fn update_bullets(&mut self, events: &mut TickEvents) {
        for slot in 0..self.bullets.capacity() {
            let Some(bullet) = self.bullets.remove(slot) else {
                continue;
            };
            self.map.set_occupied(bullet.x, bullet.y, false);
            if let Some(bullet) = self.fly(bullet, events) {
                self.map.set_occupied(bullet.x, bullet.y, true);
                self.bullets.insert_at(slot, bullet);
            }
        }
    }

    /// Advance a bullet one cell. Returns it if still in flight.
    fn fly(&mut self, mut bullet: Bullet, events: &mut TickEvents) -> Option<Bullet> {
        if bullet.range == 0 {
            return None;
        }
        let (dx, dy) = bullet.direction.delta();
        let (x, y) = (bullet.x + dx, bullet.y + dy);
        if !Map::in_bounds(x, y) {
            return None;
        }
        if self.map.is_occupied(x, y) {
            if let Some(target) = self.robot_at(x, y) {
                self.hit(target, bullet.weapon, events);
            }
            return None;
        }
        if self.altitude_at(x, y) > BULLET_ALTITUDE {
            return None;
        }
        bullet.x = x;
        bullet.y = y;
        bullet.range -= 1;
        (bullet.range > 0).then_some(bullet)
    }

    /// Apply a weapon hit to a robot.
    pub(crate) fn hit(&mut self, target: RobotId, weapon: Weapon, events: &mut TickEvents) {
        let Some(robot) = self.robot_mut(target) else {
            return;
        };
        if !robot.is_alive() {
            return;
        }
        let amount = damage(weapon, robot.top());
        robot.strength -= amount;
        if robot.strength <= 0 {
            robot.strength = DESTROYED_STRENGTH;
            events.sounds.push(SoundEvent::RobotDestroyed);
            events.robots_destroyed.push(target);
            tracing::debug!(robot = %target, ?weapon, "Robot destroyed");
        }
    }

    /// Building a warhead at the robot's position would destroy.
    ///
    /// The nearest intact building inside its blast radius, measured by
    /// summed axis distance; ties go to the lower index.
    #[must_use]
    pub fn nuclear_target(&self, id: RobotId) -> Option<usize> {
        let robot = self.robot(id)?;
        self.buildings
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_destroyed())
            .filter_map(|(index, b)| {
                let dx = (b.x - robot.x).abs();
                let dy = (b.y - robot.y).abs();
                let (axis, total) = b.blast_radius();
                (dx <= axis && dy <= axis && dx + dy <= total).then_some((dx + dy, index))
            })
            .min()
            .map(|(_, index)| index)
    }

    /// Set off a robot's warhead.
    ///
    /// Ruins at most one building, removes every robot in the 9×9 window
    /// around the robot (the robot itself included), flattens natural
    /// terrain there into rubble and invalidates the radar.
    pub(crate) fn detonate(&mut self, id: RobotId, events: &mut TickEvents) {
        let Some((cx, cy)) = self.robot(id).map(|r| r.position()) else {
            return;
        };

        if let Some(index) = self.nuclear_target(id) {
            self.ruin_building(index);
            events.buildings_destroyed.push(index);
        }

        let victims: Vec<RobotId> = self
            .robots
            .iter()
            .enumerate()
            .flat_map(|(f, slots)| {
                let faction = crate::factions::Faction::ALL[f];
                slots
                    .iter()
                    .filter(|(_, r)| {
                        (r.x - cx).abs() <= BLAST_HALF_WIDTH && (r.y - cy).abs() <= BLAST_HALF_WIDTH
                    })
                    .map(move |(slot, _)| RobotId::new(faction, slot as u8))
            })
            .collect();
        for victim in victims {
            if self.remove_robot(victim).is_some() {
                events.robots_destroyed.push(victim);
            }
        }

        for x in cx - BLAST_HALF_WIDTH..=cx + BLAST_HALF_WIDTH {
            for y in cy - BLAST_HALF_WIDTH..=cy + BLAST_HALF_WIDTH {
                let Some(cell) = self.map.cell(x, y) else {
                    continue;
                };
                if cell.is_anchor() && cell.element().is_blast_eligible() {
                    self.map.set_element(x, y, Element::Rubble);
                }
            }
        }

        self.invalidate_radar();
        events.nuclear_flash = true;
        events.sounds.push(SoundEvent::NuclearExplosion);
        tracing::debug!(robot = %id, x = cx, y = cy, "Nuclear detonation");
    }

    /// Turn a building into ruins and drop its decorations.
    pub(crate) fn ruin_building(&mut self, index: usize) {
        let Some(building) = self.buildings.get_mut(index) else {
            return;
        };
        building.destroy();
        let building = building.clone();
        building.stamp(&mut self.map);
        self.sync_decorations(index);
        tracing::debug!(building = index, "Building destroyed");
    }
}
