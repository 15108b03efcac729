//! Radar mini-map.
//!
//! The whole battlefield at four map columns per pixel, row 0 at the back.
//! The terrain layer is only rebuilt when the view scrolls or the simulation
//! reports changed terrain. Each faction has its own composed buffer, and
//! the one shown alternates by tick, so the two sides' robots flicker.

use crate::factions::Faction;
use crate::map::{Element, MAP_HEIGHT, MAP_WIDTH};
use crate::render::VIEW_COLUMNS;
use crate::simulation::Simulation;

/// Radar pixels across.
pub const RADAR_WIDTH: usize = 128;

/// Radar pixels down.
pub const RADAR_HEIGHT: usize = MAP_HEIGHT as usize;

/// Map columns per radar pixel.
pub const COLUMNS_PER_PIXEL: i16 = MAP_WIDTH / RADAR_WIDTH as i16;

/// Terrain at least this high shows on the radar.
const RADAR_TERRAIN_HEIGHT: u8 = 8;

/// A 1bpp radar image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarView {
    bytes: Vec<u8>,
}

impl Default for RadarView {
    fn default() -> Self {
        Self {
            bytes: vec![0; RADAR_WIDTH / 8 * RADAR_HEIGHT],
        }
    }
}

impl RadarView {
    /// Whether a radar pixel is lit.
    #[must_use]
    pub fn pixel(&self, x: usize, row: usize) -> bool {
        if x >= RADAR_WIDTH || row >= RADAR_HEIGHT {
            return false;
        }
        self.bytes[row * RADAR_WIDTH / 8 + x / 8] & (0x80 >> (x % 8)) != 0
    }

    /// Raw bytes, row by row.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Light the pixel covering a map cell.
    pub fn plot(&mut self, map_x: i16, map_y: i16) {
        let (Ok(x), Ok(y)) = (usize::try_from(map_x / COLUMNS_PER_PIXEL), usize::try_from(map_y)) else {
            return;
        };
        if map_x < 0 || x >= RADAR_WIDTH || y >= RADAR_HEIGHT {
            return;
        }
        let row = RADAR_HEIGHT - 1 - y;
        self.bytes[row * RADAR_WIDTH / 8 + x / 8] |= 0x80 >> (x % 8);
    }

    /// Number of lit pixels.
    #[must_use]
    pub fn lit(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }
}

/// Radar state kept between frames.
#[derive(Debug, Clone, Default)]
pub struct Radar {
    terrain: RadarView,
    views: [RadarView; 2],
    shown: usize,
    built_for: Option<(u32, i16)>,
    rebuilds: u32,
}

impl Radar {
    /// Bring the radar up to date for this tick.
    pub fn update(&mut self, sim: &Simulation, scroll: i16) {
        let key = (sim.radar_generation(), scroll);
        if self.built_for != Some(key) {
            self.rebuild_terrain(sim, scroll);
            self.built_for = Some(key);
        }

        for faction in Faction::ALL {
            let view = &mut self.views[faction.index()];
            view.clone_from(&self.terrain);
            for (_, robot) in sim.robots(faction).iter() {
                if robot.is_alive() {
                    view.plot(robot.x, robot.y);
                }
            }
            view.plot(sim.ship().x, sim.ship().y);
        }
        self.shown = (sim.tick() % 2) as usize;
    }

    fn rebuild_terrain(&mut self, sim: &Simulation, scroll: i16) {
        let mut terrain = RadarView::default();
        for (x, y, cell) in sim.map().iter() {
            let element = cell.element();
            if element != Element::Fence && element.height() >= RADAR_TERRAIN_HEIGHT {
                terrain.plot(x, y);
            }
        }
        // Brackets at the window edges, top and bottom rows.
        for x in [scroll, scroll + VIEW_COLUMNS - 1] {
            terrain.plot(x, 0);
            terrain.plot(x, MAP_HEIGHT - 1);
        }
        self.terrain = terrain;
        self.rebuilds += 1;
        tracing::trace!(scroll, rebuilds = self.rebuilds, "Radar terrain rebuilt");
    }

    /// View to show this tick.
    #[must_use]
    pub fn view(&self) -> &RadarView {
        &self.views[self.shown]
    }

    /// A faction's composed view.
    #[must_use]
    pub fn faction_view(&self, faction: Faction) -> &RadarView {
        &self.views[faction.index()]
    }

    /// Times the terrain layer has been rebuilt.
    #[must_use]
    pub const fn rebuilds(&self) -> u32 {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::interfaces::InputState;
    use crate::map_generation::BattlefieldConfig;

    fn open() -> Simulation {
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
    fn test_plot_flips_rows_and_scales_columns() {
        let mut view = RadarView::default();
        view.plot(511, 0);
        assert!(view.pixel(127, 15));
        view.plot(7, 15);
        assert!(view.pixel(1, 0));
        view.plot(-1, 3);
        view.plot(512, 3);
        assert_eq!(view.lit(), 2);
    }

    #[test]
    fn test_terrain_rebuilt_only_on_change() {
        let mut sim = open();
        let mut radar = Radar::default();
        radar.update(&sim, 12);
        radar.update(&sim, 12);
        assert_eq!(radar.rebuilds(), 1);
        radar.update(&sim, 13);
        assert_eq!(radar.rebuilds(), 2);
        sim.invalidate_radar();
        radar.update(&sim, 13);
        assert_eq!(radar.rebuilds(), 3);
    }

    #[test]
    fn test_views_alternate_by_tick() {
        let mut sim = open();
        let mut radar = Radar::default();
        radar.update(&sim, 12);
        let even = radar.view().clone();
        assert_eq!(&even, radar.faction_view(Faction::Player));
        sim.step(&InputState::IDLE);
        radar.update(&sim, 12);
        assert_eq!(radar.view(), radar.faction_view(Faction::Enemy));
        // The ship shows in both.
        let (x, y) = (sim.ship().x, sim.ship().y);
        let px = (x / COLUMNS_PER_PIXEL) as usize;
        let row = RADAR_HEIGHT - 1 - y as usize;
        assert!(radar.faction_view(Faction::Player).pixel(px, row));
        assert!(radar.faction_view(Faction::Enemy).pixel(px, row));
    }
}
