//! Core simulation state and the per-tick step.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, Holdings};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::economy::Resources;
use crate::factions::Faction;
use crate::interfaces::{InputState, SoundEvent};
use crate::map::Map;
use crate::map_generation::{generate_battlefield, Battlefield};
use crate::player::PlayerShip;
use crate::random::GameRng;
use crate::registry::{
    Bullet, Decoration, Robot, RobotId, Slots, BULLET_SLOTS, DECORATION_SLOTS, ROBOTS_PER_FACTION,
};

/// A building changing hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    /// Building index.
    pub building: usize,
    /// New owner.
    pub faction: Faction,
}

/// End of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// The faction still holding buildings.
    pub winner: Faction,
}

/// Events generated during a simulation tick.
///
/// The game layer turns these into sounds, HUD updates and effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Sound requests in emission order.
    pub sounds: Vec<SoundEvent>,
    /// Robots created this tick.
    pub robots_built: Vec<RobotId>,
    /// Robots whose strength ran out or that were vaporised.
    pub robots_destroyed: Vec<RobotId>,
    /// Buildings that changed owner.
    pub captures: Vec<CaptureEvent>,
    /// Buildings turned to ruins.
    pub buildings_destroyed: Vec<usize>,
    /// A nuclear flash should be shown.
    pub nuclear_flash: bool,
    /// A new day started and income was paid.
    pub day_rollover: bool,
    /// Set on the tick the game ends.
    pub outcome: Option<Outcome>,
}

impl TickEvents {
    /// Fold another batch of events into this one.
    pub fn merge(&mut self, mut other: Self) {
        self.sounds.append(&mut other.sounds);
        self.robots_built.append(&mut other.robots_built);
        self.robots_destroyed.append(&mut other.robots_destroyed);
        self.captures.append(&mut other.captures);
        self.buildings_destroyed.append(&mut other.buildings_destroyed);
        self.nuclear_flash |= other.nuclear_flash;
        self.day_rollover |= other.day_rollover;
        self.outcome = self.outcome.or(other.outcome);
    }
}

/// The whole game state.
///
/// All mutable state lives here: the map, the entity slot arrays, buildings,
/// stockpiles, the clock, the ship and the random source. Nothing is global.
///
/// # Tick order
///
/// 1. Player input (ship movement, landing)
/// 2. Computer strategy
/// 3. Robots, player array then computer array, in slot order
/// 4. Bullets in slot order
/// 5. Clock and income
/// 6. Capture timers
/// 7. Victory check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub(crate) tick: u64,
    pub(crate) config: EngineConfig,
    pub(crate) map: Map,
    pub(crate) robots: [Slots<Robot>; 2],
    pub(crate) bullets: Slots<Bullet>,
    pub(crate) buildings: Vec<Building>,
    pub(crate) decorations: Slots<Decoration>,
    pub(crate) resources: [Resources; 2],
    pub(crate) clock: Clock,
    pub(crate) ship: PlayerShip,
    pub(crate) rng: GameRng,
    pub(crate) radar_generation: u32,
    pub(crate) outcome: Option<Outcome>,
    /// Events raised outside `step` (player commands), reported with the next tick.
    #[serde(skip)]
    pub(crate) pending: TickEvents,
}

impl Simulation {
    /// Start a game on the standard battlefield.
    ///
    /// # Example
    ///
    /// ```
    /// use warbase_core::config::EngineConfig;
    /// use warbase_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new(EngineConfig::default());
    /// assert_eq!(sim.tick(), 0);
    /// assert_eq!(sim.buildings().len(), 28);
    /// ```
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let battlefield = generate_battlefield(&config.battlefield);
        Self::from_battlefield(config, battlefield)
    }

    /// Start a game on a prepared battlefield.
    #[must_use]
    pub fn from_battlefield(config: EngineConfig, battlefield: Battlefield) -> Self {
        let Battlefield { map, buildings } = battlefield;
        let ship = PlayerShip::new(config.player_start_x, crate::map_generation::WARBASE_ROW);
        let mut sim = Self {
            tick: 0,
            rng: GameRng::seeded(config.seed),
            resources: [config.player_resources, config.enemy_resources],
            config,
            map,
            robots: [
                Slots::new(ROBOTS_PER_FACTION),
                Slots::new(ROBOTS_PER_FACTION),
            ],
            bullets: Slots::new(BULLET_SLOTS),
            buildings,
            decorations: Slots::new(DECORATION_SLOTS),
            clock: Clock::default(),
            ship,
            radar_generation: 0,
            outcome: None,
            pending: TickEvents::default(),
        };
        for index in 0..sim.buildings.len() {
            sim.sync_decorations(index);
        }
        sim.ship.altitude = sim.altitude_at(sim.ship.x, sim.ship.y);
        sim.map.set_player(sim.ship.x, sim.ship.y, true);
        sim
    }

    /// Swap in a different random source (scripted scenarios).
    pub fn set_rng(&mut self, rng: GameRng) {
        self.rng = rng;
    }

    /// Advance the simulation by one tick.
    ///
    /// Once the game is decided further calls change nothing and report the
    /// outcome again.
    pub fn step(&mut self, input: &InputState) -> TickEvents {
        let mut events = std::mem::take(&mut self.pending);
        if let Some(outcome) = self.outcome {
            events.outcome = Some(outcome);
            return events;
        }

        self.apply_player_input(input, &mut events);
        if self.config.enemy_ai_enabled {
            self.update_enemy_ai(&mut events);
        }
        self.update_robots(input, &mut events);
        self.update_bullets(&mut events);
        self.follow_direct_control();
        self.advance_clock(&mut events);
        self.update_captures(&mut events);
        self.check_victory(&mut events);

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        #[cfg(feature = "debug-validation")]
        for faction in Faction::ALL {
            for (slot, robot) in self.robots[faction.index()].iter() {
                debug_assert!(
                    self.map.is_occupied(robot.x, robot.y),
                    "{faction:?} robot {slot} lost its occupancy bit at ({}, {})",
                    robot.x,
                    robot.y
                );
            }
        }

        events
    }

    /// Highest point at a cell: terrain, a robot's top or a decoration.
    ///
    /// Bullets do not contribute. Outside the grid this is the fence height.
    #[must_use]
    pub fn altitude_at(&self, x: i16, y: i16) -> u8 {
        let terrain = self.map.terrain_height(x, y);
        if !Map::in_bounds(x, y) || !self.map.is_occupied(x, y) {
            return terrain;
        }
        let robot = self
            .robot_at(x, y)
            .and_then(|id| self.robot(id))
            .map_or(0, Robot::top);
        let decoration = self
            .decoration_at(x, y)
            .and_then(|i| self.decorations.get(i))
            .map_or(0, |d| d.kind.altitude());
        terrain.max(robot).max(decoration)
    }

    /// Robot standing on a cell.
    #[must_use]
    pub fn robot_at(&self, x: i16, y: i16) -> Option<RobotId> {
        Faction::ALL.into_iter().find_map(|faction| {
            self.robots[faction.index()]
                .iter()
                .find(|(_, r)| r.x == x && r.y == y)
                .map(|(slot, _)| RobotId::new(faction, slot as u8))
        })
    }

    /// Bullet slot occupying a cell.
    #[must_use]
    pub fn bullet_at(&self, x: i16, y: i16) -> Option<usize> {
        self.bullets
            .iter()
            .find(|(_, b)| b.x == x && b.y == y)
            .map(|(slot, _)| slot)
    }

    /// Decoration slot occupying a cell.
    #[must_use]
    pub fn decoration_at(&self, x: i16, y: i16) -> Option<usize> {
        self.decorations
            .iter()
            .find(|(_, d)| d.x == x && d.y == y)
            .map(|(slot, _)| slot)
    }

    /// Rebuild a building's decorations from its current state.
    pub(crate) fn sync_decorations(&mut self, building: usize) {
        let stale: Vec<usize> = self
            .decorations
            .iter()
            .filter(|(_, d)| d.building == building)
            .map(|(slot, _)| slot)
            .collect();
        for slot in stale {
            if let Some(old) = self.decorations.remove(slot) {
                self.map.set_occupied(old.x, old.y, false);
            }
        }

        let Some(record) = self.buildings.get(building) else {
            return;
        };
        for (x, y, kind) in record.decorations() {
            let decoration = Decoration { x, y, kind, building };
            if self.decorations.insert(decoration).is_some() {
                self.map.set_occupied(x, y, true);
            } else {
                tracing::warn!(building, ?kind, "No free decoration slot");
            }
        }
    }

    /// Mark the radar terrain layer as stale.
    pub(crate) fn invalidate_radar(&mut self) {
        self.radar_generation = self.radar_generation.wrapping_add(1);
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.map.hash(&mut hasher);
        self.robots.hash(&mut hasher);
        self.bullets.hash(&mut hasher);
        self.buildings.hash(&mut hasher);
        self.decorations.hash(&mut hasher);
        self.resources.hash(&mut hasher);
        self.clock.hash(&mut hasher);
        self.ship.hash(&mut hasher);
        self.rng.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        hasher.finish()
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Settings the game was started with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The battlefield grid.
    #[must_use]
    pub const fn map(&self) -> &Map {
        &self.map
    }

    /// Robot slots of one faction.
    #[must_use]
    pub fn robots(&self, faction: Faction) -> &Slots<Robot> {
        &self.robots[faction.index()]
    }

    /// A single robot.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots[id.faction.index()].get(id.slot as usize)
    }

    pub(crate) fn robot_mut(&mut self, id: RobotId) -> Option<&mut Robot> {
        self.robots[id.faction.index()].get_mut(id.slot as usize)
    }

    /// Bullet slots.
    #[must_use]
    pub const fn bullets(&self) -> &Slots<Bullet> {
        &self.bullets
    }

    /// Building records.
    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Decoration slots.
    #[must_use]
    pub const fn decorations(&self) -> &Slots<Decoration> {
        &self.decorations
    }

    /// A faction's stockpile.
    #[must_use]
    pub const fn resources(&self, faction: Faction) -> &Resources {
        &self.resources[faction.index()]
    }

    /// Mutable stockpile, for scenarios and cheats.
    pub fn resources_mut(&mut self, faction: Faction) -> &mut Resources {
        &mut self.resources[faction.index()]
    }

    /// The clock.
    #[must_use]
    pub const fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The player ship.
    #[must_use]
    pub const fn ship(&self) -> &PlayerShip {
        &self.ship
    }

    /// What a faction owns.
    #[must_use]
    pub fn holdings(&self, faction: Faction) -> Holdings {
        Holdings::of(&self.buildings, faction)
    }

    /// Live robots of a faction (blinking wrecks excluded).
    #[must_use]
    pub fn census(&self, faction: Faction) -> usize {
        self.robots[faction.index()]
            .iter()
            .filter(|(_, r)| r.is_alive())
            .count()
    }

    /// Radar invalidation counter.
    #[must_use]
    pub const fn radar_generation(&self) -> u32 {
        self.radar_generation
    }

    /// Result, once decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Element;
    use crate::map_generation::BattlefieldConfig;
    use crate::registry::DecorationKind;

    fn open_config() -> EngineConfig {
        EngineConfig {
            battlefield: BattlefieldConfig {
                terrain_patches: 0,
                ..BattlefieldConfig::default()
            },
            enemy_ai_enabled: false,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_new_game_decorations() {
        let sim = Simulation::new(open_config());
        // 4 H markers, 24 roofs, 2 flags.
        assert_eq!(sim.decorations().len(), 30);
        assert_eq!(sim.flag_count(Faction::Player), 1);
        assert_eq!(sim.flag_count(Faction::Enemy), 1);
        for (_, d) in sim.decorations().iter() {
            assert!(sim.map().is_occupied(d.x, d.y));
        }
    }

    #[test]
    fn test_altitude_includes_decoration() {
        let sim = Simulation::new(open_config());
        let (slot, marker) = sim
            .decorations()
            .iter()
            .find(|(_, d)| d.kind == DecorationKind::HMarker)
            .unwrap();
        assert_eq!(sim.decoration_at(marker.x, marker.y), Some(slot));
        assert_eq!(sim.altitude_at(marker.x, marker.y), 36);
        assert_eq!(sim.map().element_at(marker.x, marker.y), Element::WarbaseCore);
    }

    #[test]
    fn test_altitude_out_of_bounds_is_fence() {
        let sim = Simulation::new(open_config());
        assert_eq!(sim.altitude_at(-1, 0), Element::Fence.height());
        assert_eq!(sim.altitude_at(0, 16), Element::Fence.height());
    }

    #[test]
    fn test_step_advances_tick_and_clock() {
        let mut sim = Simulation::new(open_config());
        sim.step(&InputState::IDLE);
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.clock().minute, 5);
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let a = Simulation::new(open_config());
        let mut b = a.clone();
        assert_eq!(a.state_hash(), b.state_hash());
        b.step(&InputState::IDLE);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_ship_bit_set_on_start() {
        let sim = Simulation::new(open_config());
        assert_eq!(sim.map().player_cells(), vec![(sim.ship().x, sim.ship().y)]);
    }

    #[test]
    fn test_merge_events() {
        let mut a = TickEvents::default();
        let b = TickEvents {
            sounds: vec![SoundEvent::ErrorBeep],
            nuclear_flash: true,
            ..TickEvents::default()
        };
        a.merge(b);
        assert_eq!(a.sounds, vec![SoundEvent::ErrorBeep]);
        assert!(a.nuclear_flash);
    }
}
