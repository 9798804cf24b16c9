//! Game engine: owns the world and resources, runs systems in a fixed
//! order each tick, and routes system events into score, stats, drops,
//! and notifications.

use hecs::World;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tankwave_logic::achievements::StatDelta;
use tankwave_logic::constants::{combat as cc, player as plc, world as wc};
use tankwave_logic::geometry::Vec2;
use tankwave_logic::tiers;
use tankwave_logic::waves::{ItemKind, WaveReward};

use crate::components::{InputIntent, Player, StructureKind};
use crate::persistence::{self, SaveError, SaveSlot};
use crate::spatial::SpatialGrid;
use crate::stats::StatsTracker;
use crate::systems::pickups::{pickup_system, spawn_kill_drop, spawn_pickup};
use crate::systems::waves::{boss_wave_cleared, wave_system, WaveState};
use crate::systems::{boss, combat, enemy_ai, GameEvent};
use crate::worldgen;

/// Longest frame delta the simulation will integrate; anything above is
/// clamped so a background tab or debugger pause cannot teleport entities.
const MAX_FRAME_DT: f32 = 0.05;
/// Seconds between periodic autosaves while a run is active.
const AUTOSAVE_INTERVAL: f32 = 20.0;
/// Score bonus for destroying the boss.
const BOSS_KILL_SCORE: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Menu,
    Running,
    Paused,
    GameOver,
}

/// Short-lived visual effect. Never persisted; a loaded game starts with
/// an empty effect queue.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
}

/// Tread imprint left behind a moving tank. Transient, like particles.
#[derive(Debug, Clone, Copy)]
pub struct TrackMark {
    pub pos: Vec2,
    pub angle: f32,
    pub life: f32,
}

pub struct GameEngine {
    pub world: World,
    pub player: Player,
    pub wave: WaveState,
    pub grid: SpatialGrid,
    pub stats: StatsTracker,
    pub phase: GamePhase,
    pub score: u64,
    pub elapsed_secs: f32,
    pub camera: Vec2,
    pub particles: Vec<Particle>,
    pub track_marks: Vec<TrackMark>,
    /// UI banner queue; drained by the presentation layer.
    pub notifications: Vec<String>,
    rng: StdRng,
    tick: u64,
    autosave_timer: f32,
    track_timer: f32,
}

impl GameEngine {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            player: Player::new(worldgen::world_center()),
            wave: WaveState::new(),
            grid: SpatialGrid::new(),
            stats: StatsTracker::new(),
            phase: GamePhase::Menu,
            score: 0,
            elapsed_secs: 0.0,
            camera: worldgen::world_center(),
            particles: Vec::new(),
            track_marks: Vec::new(),
            notifications: Vec::new(),
            rng: StdRng::from_entropy(),
            tick: 0,
            autosave_timer: AUTOSAVE_INTERVAL,
            track_timer: 0.0,
        }
    }

    /// Begin a fresh run. A fixed seed reproduces arena layout and every
    /// later roll, which the headless tests rely on.
    pub fn start(&mut self, seed: u64) {
        self.world = World::new();
        self.rng = StdRng::seed_from_u64(seed);
        let placed = worldgen::generate_world(&mut self.world, &mut self.rng);
        info!("new run: seed {seed}, {placed} structures");
        self.grid.invalidate();
        self.player = Player::new(worldgen::world_center());
        self.wave = WaveState::new();
        self.score = 0;
        self.elapsed_secs = 0.0;
        self.tick = 0;
        self.camera = self.player.pos;
        self.particles.clear();
        self.track_marks.clear();
        self.notifications.clear();
        self.autosave_timer = AUTOSAVE_INTERVAL;
        self.stats.begin_session();
        self.phase = GamePhase::Running;
        self.notifications.push("Wave 1".to_string());
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Paused;
        }
    }

    /// Resume after a pause. The dt clamp in [`GameEngine::update`] absorbs
    /// the wall-clock gap, so no timer rewinding is needed here.
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Running;
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Advance one frame. No-op unless running.
    pub fn update(&mut self, dt: f32, intent: &InputIntent) {
        if self.phase != GamePhase::Running {
            return;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.tick += 1;
        self.elapsed_secs += dt;
        self.autosave_timer -= dt;

        self.grid.ensure_built(&self.world);

        let mut events: Vec<GameEvent> = Vec::new();

        enemy_ai::enemy_ai_system(
            &mut self.world,
            &self.grid,
            &self.player,
            &mut self.rng,
            dt,
        );

        self.move_player(intent, dt);

        let aim = combat::resolve_auto_aim(&self.world, &self.grid, &self.player);
        combat::player_fire_system(
            &mut self.world,
            &mut self.player,
            intent,
            aim,
            &mut self.rng,
            &mut events,
        );

        combat::bullet_system(
            &mut self.world,
            &mut self.grid,
            &mut self.player,
            &mut self.rng,
            &mut events,
            dt,
        );
        // Structure destruction dirties the grid; spawn placement below
        // needs it current again.
        self.grid.ensure_built(&self.world);

        boss::boss_system(
            &mut self.world,
            &self.player,
            &mut self.rng,
            &mut events,
            dt,
        );

        wave_system(
            &mut self.world,
            &mut self.wave,
            &self.grid,
            self.player.pos,
            &mut self.rng,
            &mut events,
            dt,
        );

        pickup_system(&mut self.world, &mut self.player, &mut events, dt);

        self.route_events(events);

        self.player.tick_resources(dt);
        self.tick_effects(dt);

        // Camera eases toward the player.
        self.camera = self.camera + (self.player.pos - self.camera) * (6.0 * dt).min(1.0);
    }

    fn move_player(&mut self, intent: &InputIntent, dt: f32) {
        let mut speed = plc::MOVE_SPEED;
        if intent.turbo && self.player.turbo_cooldown <= 0.0 && self.player.energy > 5.0 {
            speed *= plc::TURBO_MULTIPLIER;
            self.player.energy = (self.player.energy - 25.0 * dt).max(0.0);
            if self.player.energy <= 5.0 {
                self.player.turbo_cooldown = plc::TURBO_COOLDOWN;
            }
        }
        let desired = intent.move_dir.clamp_length(1.0) * speed;
        self.player.vel = desired;
        if desired.length_squared() > 1.0 {
            self.player.heading = desired.angle();
        }

        // Axis-separated slide against structures.
        let mut pos = self.player.pos;
        let step = desired * dt;
        let try_x = Vec2::new(pos.x + step.x, pos.y);
        if !self.blocked_at(try_x) {
            pos = try_x;
        }
        let try_y = Vec2::new(pos.x, pos.y + step.y);
        if !self.blocked_at(try_y) {
            pos = try_y;
        }
        self.player.pos = Vec2::new(
            pos.x.clamp(cc::PLAYER_RADIUS, wc::WORLD_WIDTH - cc::PLAYER_RADIUS),
            pos.y.clamp(cc::PLAYER_RADIUS, wc::WORLD_HEIGHT - cc::PLAYER_RADIUS),
        );

        self.track_timer -= dt;
        if desired.length_squared() > 1.0 && self.track_timer <= 0.0 {
            self.track_timer = 0.08;
            self.track_marks.push(TrackMark {
                pos: self.player.pos,
                angle: self.player.heading,
                life: 4.0,
            });
        }
    }

    fn blocked_at(&self, pos: Vec2) -> bool {
        self.grid
            .query_circle(pos, cc::PLAYER_RADIUS)
            .iter()
            .any(|e| e.rect.overlaps_circle(pos, cc::PLAYER_RADIUS))
    }

    fn route_events(&mut self, events: Vec<GameEvent>) {
        let mut delta = StatDelta::default();

        for event in events {
            match event {
                GameEvent::EnemyKilled { tier, pos } => {
                    self.wave.record_kill();
                    self.player.bump_streak();
                    let base = tiers::tier(tier).score as u64;
                    self.score += (base as f32 * self.streak_multiplier()) as u64;
                    delta.kills_added += 1;
                    self.burst_particles(pos, 10);
                    if let Some(item) = spawn_kill_drop(&mut self.world, pos, &mut self.rng) {
                        log::debug!("kill drop: {item:?}");
                    }
                }
                GameEvent::BossPhaseChanged { phase } => {
                    self.notifications.push(format!("Boss phase {phase}"));
                }
                GameEvent::BossKilled { pos } => {
                    self.score += BOSS_KILL_SCORE;
                    delta.boss_killed = true;
                    self.burst_particles(pos, 40);
                    self.notifications.push("Boss destroyed!".to_string());
                }
                GameEvent::StructureDestroyed { kind, pos } => {
                    if kind == StructureKind::Crate {
                        delta.crates_added += 1;
                    }
                    self.burst_particles(pos, 6);
                }
                GameEvent::PlayerDamaged { amount: _ } => {
                    self.wave.flawless = false;
                }
                GameEvent::PlayerDied => {
                    self.handle_player_death();
                }
                GameEvent::ShotFired { auto_aimed: _ } => {
                    delta.shots_added += 1;
                }
                GameEvent::PickupCollected { item } => {
                    delta.pickups_added += 1;
                    self.notifications.push(format!("Picked up {item:?}"));
                }
                GameEvent::WaveCompleted { reward } => {
                    delta.wave = reward.wave;
                    delta.flawless_wave = self.wave.flawless;
                    self.grant_wave_reward(reward);
                }
                GameEvent::WaveStarted { wave } => {
                    self.notifications.push(format!("Wave {wave}"));
                }
                GameEvent::BossActivated => {
                    self.notifications.push("The boss has arrived".to_string());
                }
            }
        }

        // Boss wave completion is detected here, not in the wave system,
        // because the kill lands mid-tick in the bullet pass.
        if boss_wave_cleared(&self.world, &self.wave) {
            self.wave.boss_active = false;
            self.wave.completed = true;
            self.wave.intermission_remaining =
                tankwave_logic::constants::waves::INTERMISSION_TICKS;
            let reward =
                tankwave_logic::waves::wave_reward(self.wave.wave, self.rng.gen::<f32>());
            delta.wave = reward.wave;
            delta.flawless_wave = self.wave.flawless;
            self.grant_wave_reward(reward);
        }

        delta.streak = self.player.streak;
        delta.score = self.score;
        delta.survival_secs = self.elapsed_secs as f64;
        delta.wave = delta.wave.max(self.wave.wave);

        for unlock in self.stats.apply(&delta) {
            self.notifications
                .push(format!("Achievement: {} {}", unlock.id, unlock.tier_name));
        }
    }

    fn streak_multiplier(&self) -> f32 {
        1.0 + (self.player.streak.saturating_sub(1) as f32 * 0.1).min(1.0)
    }

    fn grant_wave_reward(&mut self, reward: WaveReward) {
        self.score += reward.bonus_score as u64;
        self.player.hp = (self.player.hp + reward.hp_restore).min(self.player.max_hp);
        let drop_at = self.player.pos + Vec2::new(60.0, 0.0);
        if let Some(item) = reward.rare_item {
            spawn_pickup(&mut self.world, drop_at, item);
        }
        if reward.revive_drop {
            spawn_pickup(
                &mut self.world,
                drop_at + Vec2::new(0.0, 60.0),
                ItemKind::ReviveToken,
            );
        }
        self.notifications
            .push(format!("Wave {} cleared  +{}", reward.wave, reward.bonus_score));
    }

    fn handle_player_death(&mut self) {
        if self.player.revive_tokens > 0 {
            self.player.revive_tokens -= 1;
            self.player.hp = self.player.max_hp * 0.5;
            self.player.temperature = 0.0;
            self.player.thermal_locked = false;
            self.notifications.push("Revived!".to_string());
            return;
        }
        info!(
            "run over: wave {}, score {}",
            self.wave.wave, self.score
        );
        self.phase = GamePhase::GameOver;
        self.notifications.push("Game over".to_string());
    }

    fn burst_particles(&mut self, pos: Vec2, count: u32) {
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.gen_range(40.0..180.0);
            self.particles.push(Particle {
                pos,
                vel: Vec2::from_angle(angle) * speed,
                life: self.rng.gen_range(0.3..0.9),
            });
        }
    }

    fn tick_effects(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.pos = p.pos + p.vel * dt;
            p.vel = p.vel * 0.92;
            p.life -= dt;
        }
        self.particles.retain(|p| p.life > 0.0);
        for t in &mut self.track_marks {
            t.life -= dt;
        }
        self.track_marks.retain(|t| t.life > 0.0);
        if self.notifications.len() > 8 {
            let excess = self.notifications.len() - 8;
            self.notifications.drain(0..excess);
        }
    }

    /// Write the run to the slot. Skipped outside an active run or after
    /// death, so a game-over screen can never be saved as resumable.
    pub fn save_to(&self, slot: &mut dyn SaveSlot) -> Result<bool, SaveError> {
        if self.phase != GamePhase::Running && self.phase != GamePhase::Paused {
            return Ok(false);
        }
        if self.player.is_dead() {
            return Ok(false);
        }
        let data = persistence::snapshot(
            &self.world,
            &self.player,
            &self.wave,
            self.camera,
            self.score,
            self.elapsed_secs,
        );
        persistence::write_save(slot, &data)?;
        Ok(true)
    }

    /// Resume the run stored in the slot, if any. The record is consumed;
    /// on any failure the current state is left untouched.
    pub fn load_from(&mut self, slot: &mut dyn SaveSlot) -> Result<bool, SaveError> {
        let Some(data) = persistence::take_save(slot)? else {
            return Ok(false);
        };
        let mut loaded = persistence::restore(data);
        if loaded.regenerate_structures {
            warn!("save held no structures; regenerating arena");
            worldgen::generate_world(&mut loaded.world, &mut self.rng);
        }
        self.world = loaded.world;
        self.player = loaded.player;
        self.wave = loaded.wave;
        self.score = loaded.score;
        self.elapsed_secs = loaded.elapsed_secs;
        self.grid.invalidate();
        self.particles.clear();
        self.track_marks.clear();
        self.notifications.clear();
        self.camera = loaded.camera;
        self.autosave_timer = AUTOSAVE_INTERVAL;
        self.tick = 0;
        self.phase = GamePhase::Running;
        info!(
            "run restored: wave {}, score {}",
            self.wave.wave, self.score
        );
        Ok(true)
    }

    /// Periodic autosave; call once per frame with the active slot.
    pub fn autosave(&mut self, slot: &mut dyn SaveSlot) {
        if self.autosave_timer > 0.0 {
            return;
        }
        self.autosave_timer = AUTOSAVE_INTERVAL;
        if let Err(e) = self.save_to(slot) {
            warn!("autosave failed: {e}");
        }
    }

    /// Best-effort save when the app loses visibility. Errors are logged
    /// and swallowed; there is nothing useful to do with them here.
    pub fn on_hidden(&mut self, slot: &mut dyn SaveSlot) {
        self.pause();
        if let Err(e) = self.save_to(slot) {
            warn!("save on hide failed: {e}");
        }
        if let Err(e) = self.stats.save(slot) {
            warn!("stats save on hide failed: {e}");
        }
    }

    /// Best-effort save at shutdown.
    pub fn on_unload(&mut self, slot: &mut dyn SaveSlot) {
        if let Err(e) = self.save_to(slot) {
            warn!("save on unload failed: {e}");
        }
        if let Err(e) = self.stats.save(slot) {
            warn!("stats save on unload failed: {e}");
        }
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Boss, Enemy, Health};
    use crate::persistence::MemorySlot;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn start_builds_arena_and_runs() {
        let mut engine = GameEngine::new();
        engine.start(42);
        assert!(engine.is_running());
        assert!(engine.world.query::<&crate::components::Structure>().iter().count() > 0);
        for _ in 0..120 {
            engine.update(DT, &InputIntent::default());
        }
        assert!(engine.wave.total_spawned > 0);
        assert!(engine.elapsed_secs > 1.9);
    }

    #[test]
    fn update_is_a_noop_while_paused() {
        let mut engine = GameEngine::new();
        engine.start(1);
        engine.update(DT, &InputIntent::default());
        let before = engine.elapsed_secs;
        engine.pause();
        engine.update(DT, &InputIntent::default());
        assert_eq!(engine.elapsed_secs, before);
        engine.resume();
        engine.update(DT, &InputIntent::default());
        assert!(engine.elapsed_secs > before);
    }

    #[test]
    fn huge_frame_delta_is_clamped() {
        let mut engine = GameEngine::new();
        engine.start(2);
        let before = engine.elapsed_secs;
        engine.update(10.0, &InputIntent::default());
        assert!(engine.elapsed_secs - before <= MAX_FRAME_DT + f32::EPSILON);
    }

    #[test]
    fn movement_respects_world_bounds() {
        let mut engine = GameEngine::new();
        engine.start(3);
        let intent = InputIntent {
            move_dir: Vec2::new(-1.0, 0.0),
            ..Default::default()
        };
        for _ in 0..(60 * 30) {
            engine.update(DT, &intent);
        }
        assert!(engine.player.pos.x >= cc::PLAYER_RADIUS);
    }

    #[test]
    fn save_load_roundtrip_through_engine() {
        let mut engine = GameEngine::new();
        engine.start(7);
        for _ in 0..300 {
            engine.update(DT, &InputIntent::default());
        }
        let score = engine.score;
        let wave = engine.wave.wave;
        let mut slot = MemorySlot::new();
        assert!(engine.save_to(&mut slot).unwrap());

        let mut restored = GameEngine::new();
        assert!(restored.load_from(&mut slot).unwrap());
        assert_eq!(restored.score, score);
        assert_eq!(restored.wave.wave, wave);
        assert_eq!(restored.camera, engine.camera);
        assert!(restored.is_running());
        assert!(restored.particles.is_empty());
        assert!(restored.track_marks.is_empty());
        // Single-use record.
        assert!(!restored.load_from(&mut slot).unwrap());
    }

    #[test]
    fn boss_fight_survives_save_load() {
        let mut engine = GameEngine::new();
        engine.start(19);
        let entity = boss::activate_boss(&mut engine.world);
        engine.wave.boss_active = true;
        {
            let mut health = engine.world.get::<&mut Health>(entity).unwrap();
            health.hp = health.max_hp * 0.5;
        }
        let mut slot = MemorySlot::new();
        assert!(engine.save_to(&mut slot).unwrap());

        let mut restored = GameEngine::new();
        assert!(restored.load_from(&mut slot).unwrap());
        assert!(restored.wave.boss_active);
        assert_eq!(restored.world.query::<&Boss>().iter().count(), 1);
        let (hp, max_hp) = {
            let mut query = restored.world.query::<(&Boss, &Health)>();
            let (_, (_, health)) = query.iter().next().unwrap();
            (health.hp, health.max_hp)
        };
        assert_eq!(hp, max_hp * 0.5);
        // The boss-wave-cleared check must not fire while the boss lives.
        assert!(!boss_wave_cleared(&restored.world, &restored.wave));
        restored.update(DT, &InputIntent::default());
        assert!(restored.wave.boss_active);
        assert!(!restored.wave.completed);
    }

    #[test]
    fn dead_player_cannot_be_saved() {
        let mut engine = GameEngine::new();
        engine.start(9);
        engine.player.hp = 0.0;
        let mut slot = MemorySlot::new();
        assert!(!engine.save_to(&mut slot).unwrap());
        assert!(!persistence::has_save(&slot));
    }

    #[test]
    fn revive_token_cheats_death_once() {
        let mut engine = GameEngine::new();
        engine.start(11);
        engine.player.revive_tokens = 1;
        engine.handle_player_death();
        assert!(engine.is_running());
        assert_eq!(engine.player.revive_tokens, 0);
        assert!(engine.player.hp > 0.0);
        engine.player.hp = 0.0;
        engine.handle_player_death();
        assert_eq!(engine.phase, GamePhase::GameOver);
    }

    #[test]
    fn spawn_accounting_invariant_holds_over_a_run() {
        let mut engine = GameEngine::new();
        engine.start(13);
        for _ in 0..(60 * 10) {
            engine.update(DT, &InputIntent::default());
            let live = engine.world.query::<&Enemy>().iter().count() as u32;
            assert_eq!(
                live + engine.wave.killed_this_wave,
                engine.wave.total_spawned,
                "live + killed must equal spawned"
            );
        }
    }

    #[test]
    fn kills_raise_score_and_stats() {
        let mut engine = GameEngine::new();
        engine.start(17);
        // Synthesize a kill event instead of simulating a whole firefight.
        engine.route_events(vec![GameEvent::EnemyKilled {
            tier: 0,
            pos: engine.player.pos,
        }]);
        assert!(engine.score >= tiers::tier(0).score as u64);
        assert_eq!(engine.stats.session.kills, 1);
        assert_eq!(engine.player.streak, 1);
        assert_eq!(engine.wave.killed_this_wave, 1);
    }
}
