//! Tankwave arena combat engine.
//!
//! The live simulation: an hecs world of enemies, bullets, structures, and
//! pickups driven by a fixed-step [`engine::GameEngine`] context, plus the
//! persistence layer that snapshots and reconstructs it. All tunable
//! behavior math lives in `tankwave-logic`; this crate owns state and
//! orchestration.

pub mod components;
pub mod engine;
pub mod persistence;
pub mod spatial;
pub mod stats;
pub mod systems;
pub mod worldgen;

pub use engine::GameEngine;
pub use persistence::{FileSlot, MemorySlot, SaveError, SaveSlot};
