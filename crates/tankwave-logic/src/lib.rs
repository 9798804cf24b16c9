//! Pure simulation logic for Tankwave.
//!
//! This crate contains all game logic that is independent of the ECS world,
//! storage, and rendering. Functions take plain data and return results,
//! making them unit-testable and portable between the engine crate and the
//! headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`achievements`] | Stat merge policies and tiered threshold evaluation |
//! | [`constants`] | All named tuning constants (AI, world, waves, player) |
//! | [`geometry`] | Vec2/Rect math, segment intersection, line-of-sight rays |
//! | [`steering`] | Separation, strafing, dodging, detour and retreat vectors |
//! | [`targeting`] | Auto-aim target priority and auto-fire resource gates |
//! | [`tiers`] | Static enemy tier table and boss stat block |
//! | [`waves`] | Wave scaling, completion predicate, reward rolls |

pub mod achievements;
pub mod constants;
pub mod geometry;
pub mod steering;
pub mod targeting;
pub mod tiers;
pub mod waves;
