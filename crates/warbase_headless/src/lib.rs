//! Headless runner for scripted play and CI verification.
//!
//! Drives the warbase core without a screen: input comes from a script,
//! frames go to an ASCII sink, sounds are recorded, snapshots land in files.
//!
//! - [`runner`] - one game through the core game loop
//! - [`batch`] - many seeded games in parallel, JSON results
//! - [`verify`] - snapshot file validation
//! - [`ascii`] - text views of frames, the radar and the map
//!
//! # Example
//!
//! ```bash
//! # Play 500 cycles from an input script, print the final map strip
//! cargo run -p warbase_headless -- run --cycles 500 --script demo.txt --map
//!
//! # Run 64 seeds and check each replays identically
//! cargo run -p warbase_headless -- batch --count 64 --check-determinism
//!
//! # Save after 2000 cycles, then validate the file
//! cargo run -p warbase_headless -- snapshot --cycles 2000 --output game.wbs
//! cargo run -p warbase_headless -- verify game.wbs
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii;
pub mod batch;
pub mod error;
pub mod runner;
pub mod script;
pub mod store;
pub mod verify;

pub use ascii::{render_frame, render_map, render_radar, AsciiConfig, AsciiDisplay};
pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary, GameResult};
pub use error::{HeadlessError, Result};
pub use runner::{run_game, RunConfig, RunReport, StateSummary};
pub use script::{load_script, parse_script};
pub use store::{FileStore, Store};
pub use verify::{verify_snapshot, SnapshotReport};
