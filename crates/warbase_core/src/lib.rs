//! # Warbase Core
//!
//! Deterministic robot-war simulation and isometric renderer.
//!
//! This crate contains **only** deterministic logic:
//! - No IO beyond handing snapshot bytes in and out
//! - No system randomness
//! - No threads
//!
//! Two factions field up to 24 robots each on a 512×16 battlefield and fight
//! over 4 warbases and 24 factories. The player flies a ship, builds robots
//! and gives orders; the computer runs a simple strategic AI.
//!
//! ## Crate Structure
//!
//! - [`map`] - Cell grid, 2×2 pieces and occupancy flags
//! - [`registry`] - Robot, bullet and decoration slot arrays
//! - [`movement`] / [`combat`] - Collision, walking, bullets and warheads
//! - [`robot_ai`] / [`enemy_ai`] - Per-robot decisions and computer strategy
//! - [`simulation`] - Game state and the per-tick step
//! - [`render`] - Isometric renderer, with [`occlusion`] and [`radar`]
//! - [`interfaces`] / [`game_loop`] - Collaborator traits and the cycle driver
//! - [`snapshot`] - Save-game encoding

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod buildings;
pub mod clock;
pub mod combat;
pub mod config;
pub mod direction;
pub mod economy;
pub mod enemy_ai;
pub mod error;
pub mod factions;
pub mod framebuffer;
pub mod game_loop;
pub mod interfaces;
pub mod map;
pub mod map_generation;
pub mod movement;
pub mod occlusion;
pub mod orders;
pub mod pieces;
pub mod player;
pub mod radar;
pub mod random;
pub mod registry;
pub mod render;
pub mod robot_ai;
pub mod simulation;
pub mod snapshot;
pub mod sprites;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buildings::{Building, BuildingKind, Holdings, Ownership};
    pub use crate::config::EngineConfig;
    pub use crate::direction::{Direction, DirectionSet};
    pub use crate::economy::{ResourceCategory, Resources};
    pub use crate::error::{EngineError, Result, SnapshotError};
    pub use crate::factions::Faction;
    pub use crate::game_loop::{Collaborators, Cycle, GameLoop, RunSummary};
    pub use crate::interfaces::{
        DisplaySink, InputSource, InputState, SnapshotStore, SoundEvent, SoundSink, TickSource,
    };
    pub use crate::map::{Element, Map, MAP_HEIGHT, MAP_WIDTH};
    pub use crate::orders::{Order, OrderArgument};
    pub use crate::pieces::{Chassis, Piece, PieceSet, Weapon};
    pub use crate::random::{GameRng, RandomSource};
    pub use crate::registry::{ControlMode, Robot, RobotId};
    pub use crate::render::Renderer;
    pub use crate::simulation::{Outcome, Simulation, TickEvents};
}
