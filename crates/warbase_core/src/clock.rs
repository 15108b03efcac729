//! Game clock, daily income, building capture and the victory check.

use serde::{Deserialize, Serialize};

use crate::buildings::Holdings;
use crate::factions::Faction;
use crate::registry::DecorationKind;
use crate::simulation::{CaptureEvent, Outcome, Simulation, TickEvents};

/// Minutes added per tick.
pub const MINUTES_PER_TICK: u8 = 5;

/// Day/hour/minute counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clock {
    /// Day number, starting at 1.
    pub day: u16,
    /// Hour 0–23.
    pub hour: u8,
    /// Minute 0–55 in steps of five.
    pub minute: u8,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            day: 1,
            hour: 0,
            minute: 0,
        }
    }
}

impl Clock {
    /// Advance one tick. Returns `true` when a new day starts.
    pub fn advance(&mut self) -> bool {
        self.minute += MINUTES_PER_TICK;
        if self.minute < 60 {
            return false;
        }
        self.minute -= 60;
        self.hour += 1;
        if self.hour < 24 {
            return false;
        }
        self.hour = 0;
        self.day = self.day.saturating_add(1);
        true
    }
}

impl std::fmt::Display for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Day {} {:02}:{:02}", self.day, self.hour, self.minute)
    }
}

impl Simulation {
    /// Advance the clock, paying income on a day rollover.
    pub(crate) fn advance_clock(&mut self, events: &mut TickEvents) {
        if !self.clock.advance() {
            return;
        }
        events.day_rollover = true;
        for faction in Faction::ALL {
            let holdings = Holdings::of(&self.buildings, faction);
            self.resources[faction.index()].collect_income(holdings.warbases, &holdings.factories);
        }
        tracing::debug!(day = self.clock.day, "Day rollover, income collected");
    }

    /// Run the capture timers of all buildings.
    ///
    /// A timer counts while a live robot not owned by the building's owner
    /// stands on the capture tile and resets the moment nobody qualifies.
    pub(crate) fn update_captures(&mut self, events: &mut TickEvents) {
        for index in 0..self.buildings.len() {
            let building = &self.buildings[index];
            if building.is_destroyed() {
                continue;
            }
            let (x, y) = building.capture_tile();
            let owner = building.owner();
            let occupant = self
                .robot_at(x, y)
                .filter(|id| id.faction != owner.unwrap_or(id.faction.opponent()))
                .filter(|id| self.robot(*id).is_some_and(|r| r.is_alive()));

            let Some(capturer) = occupant else {
                self.buildings[index].capture_timer = 0;
                continue;
            };

            let building = &mut self.buildings[index];
            building.capture_timer = building.capture_timer.saturating_add(1);
            if building.capture_timer >= self.config.capture_ticks {
                building.set_owner(capturer.faction);
                self.sync_decorations(index);
                events.captures.push(CaptureEvent {
                    building: index,
                    faction: capturer.faction,
                });
                tracing::debug!(building = index, faction = ?capturer.faction, "Building captured");
            }
        }
    }

    /// Decide the game once a faction holds nothing.
    pub(crate) fn check_victory(&mut self, events: &mut TickEvents) {
        if self.outcome.is_some() {
            return;
        }
        let loser = Faction::ALL
            .into_iter()
            .find(|&faction| Holdings::of(&self.buildings, faction).total() == 0);
        if let Some(loser) = loser {
            let outcome = Outcome {
                winner: loser.opponent(),
            };
            self.outcome = Some(outcome);
            events.outcome = Some(outcome);
            tracing::info!(winner = ?outcome.winner, day = self.clock.day, "Game over");
        }
    }

    /// Number of flag decorations showing `faction`.
    #[must_use]
    pub fn flag_count(&self, faction: Faction) -> usize {
        self.decorations
            .iter()
            .filter(|(_, d)| d.kind == DecorationKind::Flag(faction))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_roll_into_hours() {
        let mut clock = Clock::default();
        for _ in 0..11 {
            assert!(!clock.advance());
        }
        assert_eq!((clock.hour, clock.minute), (0, 55));
        clock.advance();
        assert_eq!((clock.hour, clock.minute), (1, 0));
    }

    #[test]
    fn test_day_rolls_after_288_ticks() {
        let mut clock = Clock::default();
        let rollovers = (0..288).filter(|_| clock.advance()).count();
        assert_eq!(rollovers, 1);
        assert_eq!(clock, Clock { day: 2, hour: 0, minute: 0 });
    }

    #[test]
    fn test_display() {
        let clock = Clock {
            day: 3,
            hour: 7,
            minute: 5,
        };
        assert_eq!(clock.to_string(), "Day 3 07:05");
    }
}
