//! Standard battlefield generation.
//!
//! Produces the fenced 512×16 strip with four warbases, twenty-four factories
//! and scattered natural terrain. Buildings sit at fixed positions; only the
//! terrain depends on the seed. Terrain never touches a building footprint or
//! the row in front of a building bay, so every entrance stays reachable.

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BUILDING_COUNT, FACTORY_COUNT};
use crate::economy::ResourceCategory;
use crate::factions::Faction;
use crate::map::{Element, Map, MAP_HEIGHT, MAP_WIDTH, MAX_ROBOT_X, MIN_ROBOT_X};
use crate::random::{RandomSource, SeededRandom};

/// Anchor columns of the four warbases, left to right.
pub const WARBASE_COLUMNS: [i16; 4] = [18, 172, 316, 470];

/// Anchor row shared by all warbases.
pub const WARBASE_ROW: i16 = 6;

/// Column of the first factory.
const FACTORY_FIRST_COLUMN: i16 = 40;

/// Column spacing between consecutive factories.
const FACTORY_SPACING: i16 = 18;

/// Factory rows alternate between these two.
const FACTORY_ROWS: [i16; 2] = [2, 10];

/// Cells kept clear around every building.
const BUILDING_MARGIN: i16 = 2;

/// Natural elements drawn for terrain patches; repeats weight the draw.
const TERRAIN_TABLE: [Element; 16] = [
    Element::Rough,
    Element::Rough,
    Element::HillLow,
    Element::HillLow,
    Element::HillMid,
    Element::HillMid,
    Element::HillHigh,
    Element::Ridge,
    Element::Rocks,
    Element::RocksHigh,
    Element::Cliff,
    Element::CliffHigh,
    Element::Mountain,
    Element::MountainHigh,
    Element::Peak,
    Element::Wall,
];

/// Battlefield generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlefieldConfig {
    /// Seed for terrain placement.
    pub seed: u64,
    /// Terrain patches attempted.
    pub terrain_patches: u16,
}

impl Default for BattlefieldConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            terrain_patches: 420,
        }
    }
}

impl BattlefieldConfig {
    /// Same layout with a different seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Output of [`generate_battlefield`].
#[derive(Debug, Clone)]
pub struct Battlefield {
    /// Terrain and structures.
    pub map: Map,
    /// Building records: four warbases then twenty-four factories.
    pub buildings: Vec<Building>,
}

/// Fixed building layout with starting ownership applied.
#[must_use]
pub fn standard_buildings() -> Vec<Building> {
    let mut buildings = Vec::with_capacity(BUILDING_COUNT);
    for &x in &WARBASE_COLUMNS {
        buildings.push(Building::warbase(x, WARBASE_ROW));
    }
    for i in 0..FACTORY_COUNT {
        let x = FACTORY_FIRST_COLUMN + FACTORY_SPACING * i as i16;
        let y = FACTORY_ROWS[i % 2];
        let category = ResourceCategory::ALL[i % ResourceCategory::ALL.len()];
        buildings.push(Building::factory(x, y, category));
    }
    buildings[0].set_owner(Faction::Player);
    buildings[3].set_owner(Faction::Enemy);
    buildings
}

/// Generate the standard battlefield.
#[must_use]
pub fn generate_battlefield(config: &BattlefieldConfig) -> Battlefield {
    let mut rng = SeededRandom::from_seed(config.seed);
    let mut map = Map::new();
    let buildings = standard_buildings();

    place_fences(&mut map);
    for building in &buildings {
        building.stamp(&mut map);
    }
    let placed = scatter_terrain(&mut map, &buildings, config.terrain_patches, &mut rng);

    tracing::debug!(seed = config.seed, patches = placed, "Generated battlefield");
    Battlefield { map, buildings }
}

fn place_fences(map: &mut Map) {
    for y in (0..MAP_HEIGHT).step_by(2) {
        for x in (0..MIN_ROBOT_X).step_by(2) {
            map.set_element(x, y, Element::Fence);
        }
        for x in ((MAX_ROBOT_X + 1)..MAP_WIDTH).step_by(2) {
            map.set_element(x, y, Element::Fence);
        }
    }
}

fn scatter_terrain(
    map: &mut Map,
    buildings: &[Building],
    attempts: u16,
    rng: &mut impl RandomSource,
) -> usize {
    // Even anchors inside the robot columns.
    let columns = ((MAX_ROBOT_X - MIN_ROBOT_X) / 2) as u16;
    let rows = (MAP_HEIGHT / 2) as u8;
    let mut placed = 0;

    for _ in 0..attempts {
        let hi = u16::from(rng.next_byte());
        let lo = u16::from(rng.next_byte());
        let x = MIN_ROBOT_X + 2 * ((hi << 8 | lo) % columns) as i16;
        let y = 2 * i16::from(rng.below(rows));
        let element = TERRAIN_TABLE[rng.below(TERRAIN_TABLE.len() as u8) as usize];

        if is_reserved(buildings, x, y) || !is_free(map, x, y) {
            continue;
        }
        map.set_element(x, y, element);
        placed += 1;
    }
    placed
}

fn is_free(map: &Map, x: i16, y: i16) -> bool {
    [(0, 0), (1, 0), (0, 1), (1, 1)]
        .iter()
        .all(|&(dx, dy)| map.element_at(x + dx, y + dy) == Element::Empty)
}

fn is_reserved(buildings: &[Building], x: i16, y: i16) -> bool {
    buildings.iter().any(|b| {
        let left = b.x - BUILDING_MARGIN;
        let right = b.x + b.width() + BUILDING_MARGIN;
        let bottom = b.y - BUILDING_MARGIN;
        let top = b.y + b.depth() + BUILDING_MARGIN;
        x + 1 >= left && x < right && y + 1 >= bottom && y < top
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::{BuildingKind, Ownership, WARBASE_COUNT};

    #[test]
    fn test_building_layout() {
        let buildings = standard_buildings();
        assert_eq!(buildings.len(), BUILDING_COUNT);
        assert!(buildings[..WARBASE_COUNT].iter().all(Building::is_warbase));
        assert_eq!(buildings[0].ownership(), Ownership::Owned(Faction::Player));
        assert_eq!(buildings[3].ownership(), Ownership::Owned(Faction::Enemy));
        assert_eq!(buildings[1].ownership(), Ownership::Neutral);
        assert!(buildings[WARBASE_COUNT..]
            .iter()
            .all(|b| b.ownership() == Ownership::Neutral));
    }

    #[test]
    fn test_four_factories_per_category() {
        let buildings = standard_buildings();
        for category in ResourceCategory::ALL {
            let count = buildings
                .iter()
                .filter(|b| b.kind() == BuildingKind::Factory(category))
                .count();
            assert_eq!(count, 4, "{category:?}");
        }
    }

    #[test]
    fn test_footprints_do_not_overlap() {
        let buildings = standard_buildings();
        for (i, a) in buildings.iter().enumerate() {
            for b in &buildings[i + 1..] {
                let overlap = (0..a.width())
                    .flat_map(|dx| (0..a.depth()).map(move |dy| (a.x + dx, a.y + dy)))
                    .any(|(x, y)| b.covers(x, y));
                assert!(!overlap, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_fences_outside_robot_columns() {
        let field = generate_battlefield(&BattlefieldConfig::default());
        for y in 0..MAP_HEIGHT {
            assert_eq!(field.map.element_at(MIN_ROBOT_X - 1, y), Element::Fence);
            assert_eq!(field.map.element_at(MAX_ROBOT_X + 1, y), Element::Fence);
            assert_ne!(field.map.element_at(MIN_ROBOT_X, y), Element::Fence);
        }
    }

    #[test]
    fn test_entrances_stay_clear() {
        let field = generate_battlefield(&BattlefieldConfig::default());
        for b in &field.buildings {
            let (x, y) = b.capture_tile();
            assert_eq!(field.map.element_at(x, y), Element::Empty);
            assert_eq!(field.map.element_at(x, y - 1), Element::Empty);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_battlefield(&BattlefieldConfig::default().with_seed(9));
        let b = generate_battlefield(&BattlefieldConfig::default().with_seed(9));
        let c = generate_battlefield(&BattlefieldConfig::default().with_seed(10));
        assert_eq!(a.map, b.map);
        assert_ne!(a.map, c.map);
    }

    #[test]
    fn test_terrain_is_placed() {
        let field = generate_battlefield(&BattlefieldConfig::default());
        let natural = field
            .map
            .iter()
            .filter(|(_, _, c)| c.is_anchor() && c.element().is_blast_eligible())
            .count();
        assert!(natural > 50, "only {natural} natural pieces");
    }
}
