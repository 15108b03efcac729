//! End-to-end headless workflows: scripted run, snapshot, verify, batch.

use warbase_core::config::EngineConfig;
use warbase_headless::{
    parse_script, run_batch, run_game, verify_snapshot, BatchConfig, BatchResults, HeadlessError,
    RunConfig,
};

fn engine(seed: u64) -> EngineConfig {
    let mut engine = EngineConfig::default().with_seed(seed);
    engine.battlefield = engine.battlefield.with_seed(seed);
    engine
}

#[test]
fn test_scripted_run_snapshot_then_verify() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saves").join("game.wbs");
    let script = parse_script("# fly right then climb\n20*R\n5*U\n").unwrap();

    let config = RunConfig {
        engine: engine(7),
        cycles: 120,
        script,
        snapshot: Some(path.clone()),
        save_at_end: true,
        ..RunConfig::default()
    };
    let (report, _) = run_game(&config).unwrap();
    assert_eq!(report.snapshot.as_deref(), Some(path.as_path()));

    let checked = verify_snapshot(&path).unwrap();
    assert_eq!(checked.state.tick, report.state.tick);
    assert_eq!(checked.state.state_hash, report.state.state_hash);
}

#[test]
fn test_resume_continues_from_saved_tick() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.wbs");
    let first = RunConfig {
        engine: engine(11),
        cycles: 60,
        snapshot: Some(path.clone()),
        save_at_end: true,
        ..RunConfig::default()
    };
    let (saved, _) = run_game(&first).unwrap();

    let second = RunConfig {
        cycles: 10,
        resume: true,
        save_at_end: false,
        ..first
    };
    let (resumed, _) = run_game(&second).unwrap();
    assert!(resumed.state.tick > saved.state.tick);
}

#[test]
fn test_verify_rejects_garbage_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.wbs");
    std::fs::write(&path, b"not a snapshot at all").unwrap();
    let err = verify_snapshot(&path).unwrap_err();
    assert!(matches!(err, HeadlessError::Engine(_)));
    assert_ne!(err.exit_code(), 0);
}

#[test]
fn test_batch_results_survive_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.json");
    let config = BatchConfig::new(2).with_seed(3).with_max_ticks(300);
    let results = run_batch(config).unwrap();
    results.save(&path).unwrap();

    let loaded = BatchResults::load(&path).unwrap();
    assert_eq!(loaded.games.len(), 2);
    assert_eq!(loaded.summary.total_games, 2);
    let seeds: Vec<u64> = loaded.games.iter().map(|g| g.seed).collect();
    assert!(seeds.contains(&3) && seeds.contains(&4));
}
