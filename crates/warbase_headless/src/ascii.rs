//! ASCII views for terminal review.
//!
//! [`AsciiDisplay`] is a display sink that keeps the last frame and radar as
//! text. [`render_map`] draws a top-down strip of the battlefield straight
//! from the simulation state.

use std::fmt::Write as _;

use warbase_core::factions::Faction;
use warbase_core::framebuffer::{Framebuffer, FRAME_LINES, FRAME_WIDTH};
use warbase_core::interfaces::DisplaySink;
use warbase_core::map::{Element, MAP_HEIGHT, MAP_WIDTH};
use warbase_core::radar::{RadarView, RADAR_HEIGHT, RADAR_WIDTH};
use warbase_core::simulation::Simulation;

/// Frame pixels folded into one character, horizontally.
const CELL_WIDTH: usize = 4;

/// Frame lines folded into one character.
const CELL_HEIGHT: usize = 8;

/// Shades by ink coverage, lightest first.
const SHADES: [char; 5] = [' ', '.', ':', '+', '#'];

/// ASCII view configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiConfig {
    /// Keep a text copy of every presented frame, not only the last.
    pub keep_history: bool,
    /// Append the radar below the frame.
    pub show_radar: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            keep_history: false,
            show_radar: true,
        }
    }
}

/// Display sink that turns frames into text.
#[derive(Debug, Clone, Default)]
pub struct AsciiDisplay {
    config: AsciiConfig,
    frames: u64,
    last: String,
    history: Vec<String>,
}

impl AsciiDisplay {
    /// Display with the given configuration.
    #[must_use]
    pub fn new(config: AsciiConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Frames presented so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Text of the last frame.
    #[must_use]
    pub fn last(&self) -> &str {
        &self.last
    }

    /// Every frame, when history is kept.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl DisplaySink for AsciiDisplay {
    fn present(&mut self, frame: &Framebuffer, radar: &RadarView) {
        let mut text = render_frame(frame);
        if self.config.show_radar {
            text.push_str(&render_radar(radar));
        }
        if self.config.keep_history {
            self.history.push(text.clone());
        }
        self.last = text;
        self.frames += 1;
    }
}

/// Shade a frame into text, [`CELL_WIDTH`] × [`CELL_HEIGHT`] pixels per
/// character.
#[must_use]
pub fn render_frame(frame: &Framebuffer) -> String {
    let columns = FRAME_WIDTH / CELL_WIDTH;
    let rows = FRAME_LINES / CELL_HEIGHT;
    let area = CELL_WIDTH * CELL_HEIGHT;
    let mut out = String::with_capacity((columns + 1) * rows);
    for row in 0..rows {
        for column in 0..columns {
            let ink = (0..CELL_HEIGHT)
                .flat_map(|dy| (0..CELL_WIDTH).map(move |dx| (dx, dy)))
                .filter(|&(dx, dy)| frame.pixel(column * CELL_WIDTH + dx, row * CELL_HEIGHT + dy))
                .count();
            let shade = (ink * (SHADES.len() - 1)).div_ceil(area);
            out.push(SHADES[shade]);
        }
        out.push('\n');
    }
    out
}

/// Radar as text, two pixels per character, boxed.
#[must_use]
pub fn render_radar(radar: &RadarView) -> String {
    let width = RADAR_WIDTH / 2;
    let mut out = String::new();
    let _ = writeln!(out, "+{}+", "-".repeat(width));
    for row in 0..RADAR_HEIGHT {
        out.push('|');
        for column in 0..width {
            let lit = radar.pixel(column * 2, row) || radar.pixel(column * 2 + 1, row);
            out.push(if lit { '*' } else { ' ' });
        }
        out.push_str("|\n");
    }
    let _ = writeln!(out, "+{}+", "-".repeat(width));
    out
}

fn element_char(element: Element) -> char {
    match element {
        Element::Empty => '.',
        Element::Rough | Element::Rubble | Element::Crater => ',',
        Element::HillLow | Element::HillMid | Element::HillHigh | Element::Ridge => 'n',
        Element::Rocks | Element::RocksHigh => 'o',
        Element::Cliff | Element::CliffHigh => '/',
        Element::Mountain | Element::MountainHigh | Element::Peak => '^',
        Element::Fence => '|',
        Element::Wall => '=',
        Element::WarbaseWall | Element::WarbaseCore => 'W',
        Element::FactoryWall | Element::FactoryBody => 'F',
        Element::Ruins => 'x',
    }
}

/// Top-down map strip of `width` columns from `first`, back row first.
///
/// Robots show as `P`/`E` (lower case while blinking out), bullets as `*`
/// and the ship as `@`.
#[must_use]
pub fn render_map(sim: &Simulation, first: i16, width: i16) -> String {
    let first = first.clamp(0, MAP_WIDTH - 1);
    let last = first.saturating_add(width).min(MAP_WIDTH);
    let mut out = String::new();
    for y in (0..MAP_HEIGHT).rev() {
        for x in first..last {
            out.push(map_char(sim, x, y));
        }
        out.push('\n');
    }
    out
}

fn map_char(sim: &Simulation, x: i16, y: i16) -> char {
    let ship = sim.ship();
    if (ship.x, ship.y) == (x, y) {
        return '@';
    }
    if let Some(robot) = sim.robot_at(x, y).and_then(|id| sim.robot(id).map(|r| (id, r))) {
        let (id, robot) = robot;
        let c = match id.faction {
            Faction::Player => 'P',
            Faction::Enemy => 'E',
        };
        return if robot.is_alive() { c } else { c.to_ascii_lowercase() };
    }
    if sim.bullet_at(x, y).is_some() {
        return '*';
    }
    element_char(sim.map().element_at(x, y))
}
