//! Draw-order planning for dynamic objects.
//!
//! Static pieces are drawn when the scan reaches their anchor cell. Anything
//! standing on a piece cell that the scan visits before the anchor would be
//! painted over by its own piece, so it is moved to the anchor and drawn
//! straight after the piece. The move happens in a per-frame plan; logical
//! positions are never touched.

use std::collections::BTreeMap;

use crate::map::Map;
use crate::registry::RobotId;
use crate::simulation::Simulation;

/// Painter's order key: rows of `x - y` back to front, then left to right.
#[must_use]
pub const fn scan_key(x: i16, y: i16) -> (i16, i16) {
    (x - y, x)
}

/// Cell whose turn in the scan an object at `(x, y)` is drawn on.
///
/// The four cells that could anchor a 2×2 piece covering `(x, y)` are
/// probed; if the covering piece's anchor comes later in the scan, the
/// object waits for it.
#[must_use]
pub fn render_cell(map: &Map, x: i16, y: i16) -> (i16, i16) {
    match map.anchor_of(x, y) {
        Some((ax, ay)) if scan_key(ax, ay) > scan_key(x, y) => (ax, ay),
        _ => (x, y),
    }
}

/// A dynamic object to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    /// Decoration slot.
    Decoration(usize),
    /// Robot, including a blinking wreck.
    Robot(RobotId),
    /// Bullet slot.
    Bullet(usize),
}

/// One planned draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    /// Logical position.
    pub origin: (i16, i16),
    /// Object to draw.
    pub occupant: Occupant,
}

/// Per-frame draw schedule for the visible window.
#[derive(Debug, Clone, Default)]
pub struct RenderPlan {
    by_cell: BTreeMap<(i16, i16), Vec<Draw>>,
    ship: Option<(i16, i16)>,
}

impl RenderPlan {
    /// Plan every object whose column lies in `columns`.
    #[must_use]
    pub fn build(sim: &Simulation, columns: std::ops::Range<i16>) -> Self {
        let mut draws: Vec<Draw> = Vec::new();
        let visible = |x: i16| columns.contains(&x);

        draws.extend(
            sim.decorations()
                .iter()
                .filter(|(_, d)| visible(d.x))
                .map(|(slot, d)| Draw {
                    origin: (d.x, d.y),
                    occupant: Occupant::Decoration(slot),
                }),
        );
        for faction in crate::factions::Faction::ALL {
            draws.extend(
                sim.robots(faction)
                    .iter()
                    .filter(|(_, r)| visible(r.x))
                    .map(|(slot, r)| Draw {
                        origin: (r.x, r.y),
                        occupant: Occupant::Robot(RobotId::new(faction, slot as u8)),
                    }),
            );
        }
        draws.extend(
            sim.bullets()
                .iter()
                .filter(|(_, b)| visible(b.x))
                .map(|(slot, b)| Draw {
                    origin: (b.x, b.y),
                    occupant: Occupant::Bullet(slot),
                }),
        );

        let map = sim.map();
        let mut plan = Self::default();
        for draw in draws {
            let (x, y) = draw.origin;
            let cell = render_cell(map, x, y);
            plan.by_cell.entry(cell).or_default().push(draw);
        }
        for list in plan.by_cell.values_mut() {
            list.sort_by_key(|d| scan_key(d.origin.0, d.origin.1));
        }

        let ship = sim.ship();
        if visible(ship.x) {
            plan.ship = Some(render_cell(map, ship.x, ship.y));
        }
        plan
    }

    /// Objects drawn on the scan's visit to `cell`, in order.
    pub fn at(&self, cell: (i16, i16)) -> impl Iterator<Item = &Draw> {
        self.by_cell.get(&cell).into_iter().flatten()
    }

    /// Cell the ship is drawn on, if visible.
    #[must_use]
    pub const fn ship_cell(&self) -> Option<(i16, i16)> {
        self.ship
    }

    /// Number of objects moved off their own cell.
    #[must_use]
    pub fn deferred(&self) -> usize {
        self.by_cell
            .iter()
            .map(|(cell, list)| list.iter().filter(|d| d.origin != *cell).count())
            .sum()
    }

    /// Total planned objects, the ship excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_cell.values().map(Vec::len).sum()
    }

    /// Whether nothing but the ship is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }
}
