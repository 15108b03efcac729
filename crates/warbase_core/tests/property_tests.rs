//! Property-based tests for warbase_core.

use proptest::prelude::*;
use warbase_core::buildings::OWNER_MASK;
use warbase_core::config::EngineConfig;
use warbase_core::factions::Faction;
use warbase_core::map::{MAX_ROBOT_X, MIN_ROBOT_X};
use warbase_core::simulation::Simulation;
use warbase_core::snapshot::{decode, encode};
use warbase_test_utils::determinism::{run_script, verify_determinism};
use warbase_test_utils::strategies::{arb_cell, arb_input_script, arb_seed};

fn seeded(seed: u64) -> Simulation {
    let mut config = EngineConfig::default().with_seed(seed);
    config.battlefield = config.battlefield.with_seed(seed);
    Simulation::new(config)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Reading the altitude never changes the answer.
    #[test]
    fn prop_altitude_is_idempotent(seed in arb_seed(), cells in prop::collection::vec(arb_cell(), 1..64)) {
        let mut sim = seeded(seed);
        run_script(&mut sim, 50, &[]);
        for (x, y) in cells {
            prop_assert_eq!(sim.altitude_at(x, y), sim.altitude_at(x, y));
        }
    }

    /// A building is neutral, owned by one side, or ruined; never two at once.
    #[test]
    fn prop_building_flags_exclusive(seed in arb_seed(), script in arb_input_script(16)) {
        let mut sim = seeded(seed);
        run_script(&mut sim, 400, &script);
        for building in sim.buildings() {
            prop_assert!((building.flags() & OWNER_MASK).count_ones() <= 1);
        }
    }

    /// Snapshots restore the exact state.
    #[test]
    fn prop_snapshot_round_trip(seed in arb_seed(), ticks in 0u64..300) {
        let mut sim = seeded(seed);
        run_script(&mut sim, ticks, &[]);
        let restored = decode(&encode(&sim).unwrap()).unwrap();
        prop_assert_eq!(restored.state_hash(), sim.state_hash());
        prop_assert_eq!(restored, sim);
    }

    /// Robots stay inside the columns between the fences.
    #[test]
    fn prop_robots_stay_in_bounds(seed in arb_seed(), script in arb_input_script(16)) {
        let mut sim = seeded(seed);
        for _ in 0..10 {
            run_script(&mut sim, 100, &script);
            for faction in Faction::ALL {
                for (_, robot) in sim.robots(faction).iter() {
                    prop_assert!((MIN_ROBOT_X..=MAX_ROBOT_X).contains(&robot.x));
                    prop_assert!((0..16).contains(&robot.y));
                }
            }
        }
    }

    /// Same seed and inputs, same game.
    #[test]
    fn prop_replay_is_deterministic(seed in arb_seed(), script in arb_input_script(8)) {
        let result = verify_determinism(
            2,
            1,
            || {
                let mut sim = seeded(seed);
                run_script(&mut sim, 200, &script);
                sim
            },
            |_| {},
            Simulation::state_hash,
        );
        prop_assert!(result.is_deterministic);
    }
}
