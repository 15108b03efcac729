//! Isometric view of the battlefield.
//!
//! A window of [`VIEW_COLUMNS`] map columns around the ship is projected onto
//! the frame. Cells are visited back to front; each visit draws the cell's
//! static piece if it is an anchor, then the objects the [`RenderPlan`]
//! scheduled there, then the ship when its turn comes.

use crate::framebuffer::Framebuffer;
use crate::map::{Map, MAP_HEIGHT};
use crate::occlusion::{scan_key, Occupant, RenderPlan};
use crate::radar::{Radar, RadarView};
use crate::registry::BULLET_ALTITUDE;
use crate::simulation::Simulation;
use crate::sprites::{SpriteBank, LINES_PER_STEP};

/// Map columns in the view window.
pub const VIEW_COLUMNS: i16 = 16;

/// Frame line of the ground baseline for window column 0, row 0.
pub const HORIZON_LINE: i16 = 108;

/// Frame column and baseline line of a window cell at `altitude`.
#[must_use]
pub const fn project(wx: i16, y: i16, altitude: i16) -> (i16, i16) {
    (wx + y - 2, (wx - y) * LINES_PER_STEP as i16 + HORIZON_LINE - altitude)
}

/// What the last frame contained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Static pieces drawn.
    pub pieces: usize,
    /// Robots, bullets and decorations drawn.
    pub objects: usize,
    /// Objects drawn on a later cell than their own.
    pub deferred: usize,
    /// Whether the ship was drawn.
    pub ship: bool,
}

/// Owns the sprite bank, the frame and the radar.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    sprites: SpriteBank,
    frame: Framebuffer,
    radar: Radar,
    stats: FrameStats,
}

impl Renderer {
    /// Renderer with a blank frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered frame.
    #[must_use]
    pub const fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    /// Radar view for the last rendered tick.
    #[must_use]
    pub fn radar_view(&self) -> &RadarView {
        self.radar.view()
    }

    /// Counters from the last frame.
    #[must_use]
    pub const fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Draw the current state into the frame and refresh the radar.
    pub fn render(&mut self, sim: &Simulation) -> &Framebuffer {
        let scroll = sim.viewport_scroll();
        self.frame.clear();
        self.stats = FrameStats::default();

        // One extra column on the left so pieces anchored just outside the
        // window still show their right half.
        let first = scroll - 1;
        let last = scroll + VIEW_COLUMNS;
        let plan = RenderPlan::build(sim, first..last);
        self.stats.deferred = plan.deferred();

        let mut cells: Vec<(i16, i16)> = (first..last)
            .flat_map(|x| (0..MAP_HEIGHT).map(move |y| (x, y)))
            .collect();
        cells.sort_by_key(|&(x, y)| scan_key(x, y));

        for (x, y) in cells {
            let wx = x - scroll;
            self.draw_piece(sim.map(), x, y, wx);
            for draw in plan.at((x, y)) {
                self.draw_object(sim, draw.occupant, draw.origin, scroll);
            }
            if plan.ship_cell() == Some((x, y)) {
                let ship = sim.ship();
                let (column, baseline) = project(ship.x - scroll, ship.y, i16::from(ship.altitude));
                self.frame.blit(self.sprites.ship(), column, baseline);
                self.stats.ship = true;
            }
        }

        self.radar.update(sim, scroll);
        tracing::trace!(tick = sim.tick(), stats = ?self.stats, "Frame rendered");
        &self.frame
    }

    fn draw_piece(&mut self, map: &Map, x: i16, y: i16, wx: i16) {
        let Some(cell) = map.cell(x, y) else {
            return;
        };
        if !cell.is_anchor() || cell.element_code() == 0 {
            return;
        }
        let Some(sprite) = self.sprites.element(cell.element()) else {
            return;
        };
        // Bottom row sits on the front cell's baseline.
        let (column, baseline) = project(wx, y, 0);
        self.frame.blit(sprite, column, baseline + LINES_PER_STEP as i16);
        self.stats.pieces += 1;
    }

    fn draw_object(&mut self, sim: &Simulation, occupant: Occupant, origin: (i16, i16), scroll: i16) {
        let (x, y) = origin;
        let wx = x - scroll;
        match occupant {
            Occupant::Robot(id) => {
                let Some(robot) = sim.robot(id) else {
                    return;
                };
                // Wrecks flash on alternate ticks.
                if robot.strength < 0 && robot.strength % 2 != 0 {
                    return;
                }
                let sprite = self.sprites.robot(robot.pieces, robot.facing);
                let (column, baseline) = project(wx, y, i16::from(robot.altitude));
                self.frame.blit(&sprite, column, baseline);
            }
            Occupant::Bullet(_) => {
                let (column, baseline) = project(wx, y, i16::from(BULLET_ALTITUDE));
                self.frame.blit(self.sprites.bullet(), column, baseline);
            }
            Occupant::Decoration(slot) => {
                let Some(decoration) = sim.decorations().get(slot) else {
                    return;
                };
                let sprite = self.sprites.decoration(decoration.kind);
                let ground = i16::from(sim.map().terrain_height(x, y));
                let (column, baseline) = project(wx, y, ground);
                self.frame.blit(&sprite, column, baseline);
            }
        }
        self.stats.objects += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::framebuffer::FRAME_LINES;
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
    fn test_projection_corners_fit_frame() {
        let (column, line) = project(0, 15, 0);
        assert_eq!(column, 13);
        assert_eq!(line, 48);
        let (column, line) = project(15, 0, 0);
        assert_eq!(column, 13);
        assert_eq!(line, 168);
        assert!((line as usize) < FRAME_LINES);
        assert_eq!(project(0, 0, 0), (-2, 108));
    }

    #[test]
    fn test_home_view_draws_warbase() {
        let sim = open();
        let mut renderer = Renderer::new();
        renderer.render(&sim);
        let stats = renderer.stats();
        // Columns 11..28 hold the player warbase's five pieces and the
        // last fence piece.
        assert!(stats.pieces >= 5, "{stats:?}");
        // The flag and the H marker; the ship is counted separately.
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.deferred, 2);
        assert!(stats.ship);
        assert!(renderer.frame().ink_count() > 0);
    }

    #[test]
    fn test_render_is_pure() {
        let mut sim = open();
        for _ in 0..5 {
            sim.step(&InputState::IDLE);
        }
        let before = sim.state_hash();
        let mut renderer = Renderer::new();
        let first = renderer.render(&sim).clone();
        let second = renderer.render(&sim).clone();
        assert_eq!(first, second);
        assert_eq!(sim.state_hash(), before);
    }
}
