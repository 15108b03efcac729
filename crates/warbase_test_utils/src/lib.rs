//! # Warbase Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Fixture arenas and robot placement
//! - Scripted randomness for forcing AI decisions
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;

pub use determinism::strategies;

pub use warbase_core::random::ScriptedRandom;
