//! Simulation systems, run in a fixed order each tick by the engine:
//! enemy AI, combat, boss, waves, pickups.

pub mod boss;
pub mod combat;
pub mod enemy_ai;
pub mod pickups;
pub mod waves;

use tankwave_logic::geometry::Vec2;
use tankwave_logic::waves::{ItemKind, WaveReward};

use crate::components::StructureKind;

/// Events emitted by systems and routed by the engine to wave accounting,
/// stats, drops, and the notification surface.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EnemyKilled { tier: u8, pos: Vec2 },
    BossPhaseChanged { phase: u8 },
    BossKilled { pos: Vec2 },
    StructureDestroyed { kind: StructureKind, pos: Vec2 },
    PlayerDamaged { amount: f32 },
    PlayerDied,
    ShotFired { auto_aimed: bool },
    PickupCollected { item: ItemKind },
    WaveCompleted { reward: WaveReward },
    WaveStarted { wave: u32 },
    BossActivated,
}
