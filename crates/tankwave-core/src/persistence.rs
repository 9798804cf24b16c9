//! Save/load for the run state.
//!
//! A save is one JSON record in a [`SaveSlot`] under [`SAVE_KEY`]. Records
//! are single-use: a successful load deletes the record, and a record that
//! fails to parse is cleared so it cannot wedge every later launch. All
//! restored numbers pass a sanitize step first; a hand-edited or truncated
//! record degrades to defaults instead of spreading NaN through the sim.

use std::collections::HashMap;
use std::path::PathBuf;

use hecs::World;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tankwave_logic::constants::{boss as bc, world as wc};
use tankwave_logic::geometry::Vec2;
use tankwave_logic::tiers;
use tankwave_logic::waves::{enemies_per_wave, ItemKind};

use crate::components::{
    Boss, Bullet, Enemy, Health, Pickup, Player, Position, Structure, UltimateState, Velocity,
};
use crate::systems::waves::WaveState;

/// Bump when the record layout changes; older records are rejected.
const SAVE_VERSION: u32 = 1;

pub const SAVE_KEY: &str = "tankwave.save";
pub const STATS_KEY: &str = "tankwave.stats";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Keyed string storage for save records. The game talks to storage only
/// through this trait; tests use [`MemorySlot`], shipping builds use
/// [`FileSlot`] or a platform-specific adapter.
pub trait SaveSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SaveError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError>;
    fn delete(&mut self, key: &str) -> Result<(), SaveError>;
}

/// In-memory slot for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), SaveError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Slot backed by one file per key inside a directory.
#[derive(Debug)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SaveSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SaveError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), SaveError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedStructure {
    pub structure: Structure,
    pub hp: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedEnemy {
    pub enemy: Enemy,
    pub pos: Vec2,
    pub hp: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedPickup {
    pub item: ItemKind,
    pub pos: Vec2,
    pub life: f32,
}

/// The boss mid-fight. Its position is derived from `hover_angle`, so only
/// the component and hp are stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedBoss {
    pub boss: Boss,
    pub hp: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedBullet {
    pub bullet: Bullet,
    pub pos: Vec2,
}

/// Full JSON snapshot of a run. Particles, track marks, and notifications
/// are transient and deliberately absent; live projectiles are not, since
/// a loaded game must resume mid-exchange.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub score: u64,
    pub elapsed_secs: f32,
    pub camera: Vec2,
    pub player: Player,
    pub wave: WaveState,
    pub boss: Option<SavedBoss>,
    pub structures: Vec<SavedStructure>,
    pub enemies: Vec<SavedEnemy>,
    pub bullets: Vec<SavedBullet>,
    pub pickups: Vec<SavedPickup>,
}

/// Capture the live world into a record.
pub fn snapshot(
    world: &World,
    player: &Player,
    wave: &WaveState,
    camera: Vec2,
    score: u64,
    elapsed_secs: f32,
) -> SaveData {
    let mut structures = Vec::new();
    for (_, (structure, health)) in world.query::<(&Structure, &Health)>().iter() {
        structures.push(SavedStructure {
            structure: *structure,
            hp: health.hp,
        });
    }
    let mut enemies = Vec::new();
    for (_, (enemy, pos, health)) in world.query::<(&Enemy, &Position, &Health)>().iter() {
        enemies.push(SavedEnemy {
            enemy: enemy.clone(),
            pos: pos.0,
            hp: health.hp,
        });
    }
    let boss = world
        .query::<(&Boss, &Health)>()
        .iter()
        .next()
        .map(|(_, (boss, health))| SavedBoss {
            boss: boss.clone(),
            hp: health.hp,
        });
    let mut bullets = Vec::new();
    for (_, (bullet, pos)) in world.query::<(&Bullet, &Position)>().iter() {
        bullets.push(SavedBullet {
            bullet: *bullet,
            pos: pos.0,
        });
    }
    let mut pickups = Vec::new();
    for (_, (pickup, pos)) in world.query::<(&Pickup, &Position)>().iter() {
        pickups.push(SavedPickup {
            item: pickup.item,
            pos: pos.0,
            life: pickup.life,
        });
    }
    SaveData {
        version: SAVE_VERSION,
        score,
        elapsed_secs,
        camera,
        player: player.clone(),
        wave: wave.clone(),
        boss,
        structures,
        enemies,
        bullets,
        pickups,
    }
}

pub fn write_save(slot: &mut dyn SaveSlot, data: &SaveData) -> Result<(), SaveError> {
    let json = serde_json::to_string(data)?;
    slot.write(SAVE_KEY, &json)?;
    info!("game saved ({} bytes)", json.len());
    Ok(())
}

pub fn has_save(slot: &dyn SaveSlot) -> bool {
    matches!(slot.read(SAVE_KEY), Ok(Some(_)))
}

/// Read, validate, and consume the save record. A record that fails to
/// parse or carries the wrong version is deleted before the error returns.
pub fn take_save(slot: &mut dyn SaveSlot) -> Result<Option<SaveData>, SaveError> {
    let Some(json) = slot.read(SAVE_KEY)? else {
        return Ok(None);
    };
    let parsed: Result<SaveData, _> = serde_json::from_str(&json);
    let data = match parsed {
        Ok(d) => d,
        Err(e) => {
            warn!("clearing unreadable save record: {e}");
            slot.delete(SAVE_KEY)?;
            return Err(e.into());
        }
    };
    if data.version != SAVE_VERSION {
        warn!(
            "clearing save record with version {} (expected {})",
            data.version, SAVE_VERSION
        );
        slot.delete(SAVE_KEY)?;
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    slot.delete(SAVE_KEY)?;
    Ok(Some(data))
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

fn sane_pos(v: Vec2, fallback: Vec2) -> Vec2 {
    if v.is_finite() {
        Vec2::new(
            v.x.clamp(0.0, wc::WORLD_WIDTH),
            v.y.clamp(0.0, wc::WORLD_HEIGHT),
        )
    } else {
        fallback
    }
}

/// Coerce every restored number into a usable range. Applied once, here,
/// so behavior code never has to defend against a poisoned record.
pub fn sanitize(data: &mut SaveData) {
    let center = crate::worldgen::world_center();

    let p = &mut data.player;
    p.pos = sane_pos(p.pos, center);
    p.vel = if p.vel.is_finite() { p.vel } else { Vec2::ZERO };
    p.heading = finite_or(p.heading, 0.0);
    p.turret_angle = finite_or(p.turret_angle, 0.0);
    p.hp = finite_or(p.hp, p.max_hp).clamp(0.0, p.max_hp);
    p.energy = finite_or(p.energy, p.max_energy).clamp(0.0, p.max_energy);
    p.temperature = finite_or(p.temperature, 0.0).clamp(0.0, p.max_temperature);
    p.fire_cooldown = finite_or(p.fire_cooldown, 0.0).max(0.0);
    p.turbo_cooldown = finite_or(p.turbo_cooldown, 0.0).max(0.0);
    p.ultimate_cooldown = finite_or(p.ultimate_cooldown, 0.0).max(0.0);
    p.streak_timer = finite_or(p.streak_timer, 0.0).max(0.0);
    p.passives.damage = finite_or(p.passives.damage, 1.0).clamp(0.5, 5.0);
    p.passives.critical = finite_or(p.passives.critical, 0.05).clamp(0.0, 0.5);
    p.passives.lifesteal = finite_or(p.passives.lifesteal, 0.0).clamp(0.0, 0.35);
    p.passives.cooling = finite_or(p.passives.cooling, 1.0).clamp(0.5, 3.0);

    data.score = data.score.min(u64::MAX / 2);
    data.elapsed_secs = finite_or(data.elapsed_secs, 0.0).max(0.0);
    data.camera = sane_pos(data.camera, p.pos);
    data.wave.wave = data.wave.wave.max(1);
    data.wave.spawn_timer = finite_or(data.wave.spawn_timer, 0.0).max(0.0);

    if let Some(b) = &mut data.boss {
        b.hp = finite_or(b.hp, bc::MAX_HP).clamp(1.0, bc::MAX_HP);
        b.boss.hover_angle = finite_or(b.boss.hover_angle, 0.0);
        b.boss.hover_dir = if b.boss.hover_dir < 0.0 { -1.0 } else { 1.0 };
        for t in &mut b.boss.turrets {
            t.max_energy = finite_or(t.max_energy, bc::TURRET_MAX_ENERGY).max(1.0);
            t.energy = finite_or(t.energy, t.max_energy).clamp(0.0, t.max_energy);
            t.cooldown = finite_or(t.cooldown, 0.0).max(0.0);
        }
        b.boss.ultimate = match b.boss.ultimate {
            UltimateState::Idle => UltimateState::Idle,
            UltimateState::Charging { remaining } => UltimateState::Charging {
                remaining: finite_or(remaining, 0.0).max(0.0),
            },
            UltimateState::Firing { remaining } => UltimateState::Firing {
                remaining: finite_or(remaining, 0.0).max(0.0),
            },
            UltimateState::Cooldown { remaining } => UltimateState::Cooldown {
                remaining: finite_or(remaining, 0.0).max(0.0),
            },
        };
    }

    // A poisoned projectile is dropped, not repaired.
    data.bullets
        .retain(|b| b.pos.is_finite() && b.bullet.vel.is_finite());
    for b in &mut data.bullets {
        b.pos = sane_pos(b.pos, center);
        b.bullet.life = finite_or(b.bullet.life, 0.1).clamp(0.05, 10.0);
        b.bullet.damage = finite_or(b.bullet.damage, 1.0).clamp(0.0, 1000.0);
    }

    for s in &mut data.structures {
        let max = s.structure.max_hp();
        s.hp = finite_or(s.hp, max).clamp(1.0, max);
    }
    for e in &mut data.enemies {
        e.pos = sane_pos(e.pos, center);
        let max = tiers::tier(e.enemy.tier).max_hp;
        e.hp = finite_or(e.hp, max).clamp(1.0, max);
        e.enemy.heading = finite_or(e.enemy.heading, 0.0);
        e.enemy.turret_angle = finite_or(e.enemy.turret_angle, 0.0);
        e.enemy.fire_cooldown = finite_or(e.enemy.fire_cooldown, 0.0).max(0.0);
    }
    for pk in &mut data.pickups {
        pk.pos = sane_pos(pk.pos, center);
        pk.life = finite_or(pk.life, 1.0).clamp(0.1, tankwave_logic::constants::pickups::LIFETIME);
    }
}

/// A restored run, staged so the engine can swap it in atomically.
pub struct LoadedGame {
    pub world: World,
    pub player: Player,
    pub wave: WaveState,
    pub camera: Vec2,
    pub score: u64,
    pub elapsed_secs: f32,
    /// Set when the record held no structures; the engine must regenerate
    /// the arena before play resumes.
    pub regenerate_structures: bool,
}

/// Rebuild a world from a (sanitized) record. Structures go in first so
/// the spatial grid sees them on its next rebuild, then enemies forced
/// combat-ready, then the boss if one was captured, then bullets and
/// pickups.
pub fn restore(mut data: SaveData) -> LoadedGame {
    sanitize(&mut data);

    let mut world = World::new();
    let regenerate_structures = data.structures.is_empty();
    for s in data.structures {
        let max = s.structure.max_hp();
        world.spawn((
            s.structure,
            Health {
                hp: s.hp,
                max_hp: max,
            },
        ));
    }

    let mut wave = data.wave;
    let live = data.enemies.len() as u32;
    for mut e in data.enemies {
        e.enemy.make_combat_ready(data.player.pos);
        e.enemy.prev_pos = e.pos;
        let max = tiers::tier(e.enemy.tier).max_hp;
        world.spawn((
            e.enemy,
            Position(e.pos),
            Velocity(Vec2::ZERO),
            Health {
                hp: e.hp,
                max_hp: max,
            },
        ));
    }

    // Spawn accounting cannot be trusted across the gap: with live enemies
    // the wave is treated as fully spawned (it ends when they die), with
    // none it restarts spawning from scratch.
    if live > 0 {
        wave.total_spawned = enemies_per_wave(wave.wave);
        wave.killed_this_wave = wave.total_spawned.saturating_sub(live);
    } else {
        wave.total_spawned = 0;
        wave.killed_this_wave = 0;
    }
    wave.completed = false;

    // The boss flag must stay in lockstep with the entity; the record's
    // flag alone is not trusted.
    match data.boss {
        Some(b) => {
            let pos = crate::worldgen::world_center()
                + Vec2::from_angle(b.boss.hover_angle) * bc::HOVER_RADIUS;
            world.spawn((
                b.boss,
                Position(pos),
                Health {
                    hp: b.hp,
                    max_hp: bc::MAX_HP,
                },
            ));
            wave.boss_active = true;
        }
        None => wave.boss_active = false,
    }

    for mut b in data.bullets {
        // No sweep across the gap; the first tick starts a fresh segment.
        b.bullet.prev_pos = b.pos;
        world.spawn((Position(b.pos), b.bullet));
    }

    for pk in data.pickups {
        world.spawn((
            Position(pk.pos),
            Pickup {
                item: pk.item,
                life: pk.life,
                float_phase: 0.0,
            },
        ));
    }

    LoadedGame {
        world,
        player: data.player,
        wave,
        camera: data.camera,
        score: data.score,
        elapsed_secs: data.elapsed_secs,
        regenerate_structures,
    }
}
