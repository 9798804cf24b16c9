//! ECS components and the player resource record.
//!
//! Every entity kind is a tagged struct with explicit defaults; nothing in
//! the behavior code checks for "maybe missing" fields.

mod actors;
mod combat;
mod common;
mod player;
mod world;

pub use actors::*;
pub use combat::*;
pub use common::*;
pub use player::*;
pub use world::*;
