//! Wave lifecycle: batch spawning, once-only completion, intermission,
//! and the boss-wave handoff.

use hecs::World;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use tankwave_logic::constants::waves as wc;
use tankwave_logic::geometry::Vec2;
use tankwave_logic::tiers::pick_tier;
use tankwave_logic::waves::{enemies_per_wave, is_boss_wave, wave_complete, wave_reward};

use crate::components::{Boss, Enemy, Health, Position, Velocity};
use crate::spatial::SpatialGrid;
use crate::systems::boss::activate_boss;
use crate::systems::GameEvent;
use crate::worldgen::find_spawn_position;

/// Wave progression state, owned by the engine and persisted in saves.
///
/// Accounting invariant: `live + killed_this_wave == total_spawned` at all
/// times, where `live` is the enemy count in the world. Kills are recorded
/// through [`WaveState::record_kill`] when the engine routes the kill event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveState {
    pub wave: u32,
    /// Enemies spawned so far this wave. Never decremented.
    pub total_spawned: u32,
    pub killed_this_wave: u32,
    /// Seconds until the next spawn batch.
    pub spawn_timer: f32,
    /// Ticks of intermission remaining; zero while a wave is active.
    pub intermission_remaining: u32,
    /// Set when this wave's completion reward has been granted.
    pub completed: bool,
    pub boss_active: bool,
    /// Cleared when the player takes damage during the wave.
    pub flawless: bool,
}

impl WaveState {
    pub fn new() -> Self {
        Self {
            wave: 1,
            total_spawned: 0,
            killed_this_wave: 0,
            spawn_timer: 0.0,
            intermission_remaining: 0,
            completed: false,
            boss_active: false,
            flawless: true,
        }
    }

    pub fn quota(&self) -> u32 {
        enemies_per_wave(self.wave)
    }

    pub fn in_intermission(&self) -> bool {
        self.intermission_remaining > 0
    }

    pub fn record_kill(&mut self) {
        self.killed_this_wave += 1;
    }

    fn begin_wave(&mut self, wave: u32) {
        self.wave = wave;
        self.total_spawned = 0;
        self.killed_this_wave = 0;
        self.spawn_timer = 0.0;
        self.completed = false;
        self.flawless = true;
    }
}

impl Default for WaveState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn wave_system(
    world: &mut World,
    state: &mut WaveState,
    grid: &SpatialGrid,
    player_pos: Vec2,
    rng: &mut StdRng,
    events: &mut Vec<GameEvent>,
    dt: f32,
) {
    // Intermission counts down in ticks; the next wave starts when it ends.
    if state.in_intermission() {
        state.intermission_remaining -= 1;
        if state.intermission_remaining == 0 {
            state.begin_wave(state.wave + 1);
            info!("wave {} started", state.wave);
            events.push(GameEvent::WaveStarted { wave: state.wave });
            if is_boss_wave(state.wave) && !state.boss_active {
                activate_boss(world);
                state.boss_active = true;
                events.push(GameEvent::BossActivated);
            }
        }
        return;
    }

    if state.boss_active {
        // The boss wave ends when the boss entity is gone; the engine
        // clears `boss_active` and grants the reward off BossKilled.
        return;
    }

    let quota = state.quota();

    // Batch spawning up to the wave quota.
    if state.total_spawned < quota {
        state.spawn_timer -= dt;
        if state.spawn_timer <= 0.0 {
            state.spawn_timer = wc::SPAWN_INTERVAL;
            let batch = wc::SPAWN_BATCH.min(quota - state.total_spawned);
            for _ in 0..batch {
                spawn_enemy(world, grid, state.wave, player_pos, rng);
                state.total_spawned += 1;
            }
            debug!(
                "wave {}: spawned batch of {} ({}/{})",
                state.wave, batch, state.total_spawned, quota
            );
        }
    }

    // Completion fires exactly once: quota fully spawned and none left
    // alive. Checking the quota keeps the wave open while spawns are
    // still pending, even if the player clears every live enemy.
    let live = world.query::<&Enemy>().iter().count();
    if !state.completed && wave_complete(live, state.total_spawned, quota) {
        state.completed = true;
        state.intermission_remaining = wc::INTERMISSION_TICKS;
        let reward = wave_reward(state.wave, rng.gen::<f32>());
        info!("wave {} complete", state.wave);
        events.push(GameEvent::WaveCompleted { reward });
    }
}

fn spawn_enemy(
    world: &mut World,
    grid: &SpatialGrid,
    wave: u32,
    player_pos: Vec2,
    rng: &mut StdRng,
) {
    let pos = find_spawn_position(
        grid,
        rng,
        tankwave_logic::constants::combat::ENEMY_RADIUS * 2.0,
        player_pos,
        tankwave_logic::constants::world::SPAWN_SAFE_RADIUS,
    );
    let tier = pick_tier(wave, rng.gen::<f32>());
    let enemy = Enemy::spawn(tier, pos, rng.gen::<f32>(), rng.gen::<f32>());
    let hp = tankwave_logic::tiers::tier(tier).max_hp;
    world.spawn((enemy, Position(pos), Velocity(Vec2::ZERO), Health::full(hp)));
}

/// True once the boss wave is over: flagged active but no boss entity left.
pub fn boss_wave_cleared(world: &World, state: &WaveState) -> bool {
    state.boss_active && world.query::<&Boss>().iter().count() == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn built_grid(world: &mut World) -> SpatialGrid {
        let mut grid = SpatialGrid::new();
        grid.ensure_built(world);
        grid
    }

    #[test]
    fn first_batch_spawns_immediately() {
        let mut world = World::new();
        let grid = built_grid(&mut world);
        let mut state = WaveState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut events = Vec::new();
        wave_system(
            &mut world,
            &mut state,
            &grid,
            Vec2::ZERO,
            &mut rng,
            &mut events,
            1.0 / 60.0,
        );
        assert_eq!(state.total_spawned, wc::SPAWN_BATCH);
        assert_eq!(world.query::<&Enemy>().iter().count() as u32, wc::SPAWN_BATCH);
    }

    #[test]
    fn wave_stays_open_until_quota_spawned() {
        // Kill every live enemy while spawns are pending; completion must
        // not fire early.
        let mut world = World::new();
        let grid = built_grid(&mut world);
        let mut state = WaveState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut events = Vec::new();
        wave_system(
            &mut world,
            &mut state,
            &grid,
            Vec2::ZERO,
            &mut rng,
            &mut events,
            1.0 / 60.0,
        );
        let doomed: Vec<_> = world.query::<&Enemy>().iter().map(|(e, _)| e).collect();
        for e in doomed {
            world.despawn(e).unwrap();
            state.record_kill();
        }
        wave_system(
            &mut world,
            &mut state,
            &grid,
            Vec2::ZERO,
            &mut rng,
            &mut events,
            1.0 / 60.0,
        );
        assert!(!state.completed);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::WaveCompleted { .. })));
    }

    #[test]
    fn completion_fires_once_then_intermission_starts_next_wave() {
        let mut world = World::new();
        let grid = built_grid(&mut world);
        let mut state = WaveState::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut events = Vec::new();
        let quota = state.quota();

        // Run until the full quota has spawned, killing as we go.
        while state.total_spawned < quota {
            wave_system(
                &mut world,
                &mut state,
                &grid,
                Vec2::ZERO,
                &mut rng,
                &mut events,
                1.0 / 60.0,
            );
            let doomed: Vec<_> = world.query::<&Enemy>().iter().map(|(e, _)| e).collect();
            for e in doomed {
                world.despawn(e).unwrap();
                state.record_kill();
            }
        }
        wave_system(
            &mut world,
            &mut state,
            &grid,
            Vec2::ZERO,
            &mut rng,
            &mut events,
            1.0 / 60.0,
        );
        assert!(state.completed);
        assert_eq!(state.killed_this_wave, state.total_spawned);
        let completions = events
            .iter()
            .filter(|e| matches!(e, GameEvent::WaveCompleted { .. }))
            .count();
        assert_eq!(completions, 1);

        // Intermission runs its full tick count, then wave 2 starts.
        for _ in 0..wc::INTERMISSION_TICKS {
            wave_system(
                &mut world,
                &mut state,
                &grid,
                Vec2::ZERO,
                &mut rng,
                &mut events,
                1.0 / 60.0,
            );
        }
        assert_eq!(state.wave, 2);
        assert_eq!(state.total_spawned, 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::WaveStarted { wave: 2 })));
    }

    #[test]
    fn boss_wave_activates_boss_instead_of_spawning() {
        let mut world = World::new();
        let grid = built_grid(&mut world);
        let mut state = WaveState::new();
        state.wave = wc::BOSS_WAVE - 1;
        state.completed = true;
        state.intermission_remaining = 1;
        let mut rng = StdRng::seed_from_u64(9);
        let mut events = Vec::new();
        wave_system(
            &mut world,
            &mut state,
            &grid,
            Vec2::ZERO,
            &mut rng,
            &mut events,
            1.0 / 60.0,
        );
        assert_eq!(state.wave, wc::BOSS_WAVE);
        assert!(state.boss_active);
        assert!(events.iter().any(|e| matches!(e, GameEvent::BossActivated)));
        assert_eq!(world.query::<&Boss>().iter().count(), 1);

        // No normal spawns while the boss holds the wave.
        wave_system(
            &mut world,
            &mut state,
            &grid,
            Vec2::ZERO,
            &mut rng,
            &mut events,
            1.0 / 60.0,
        );
        assert_eq!(state.total_spawned, 0);
        assert!(!boss_wave_cleared(&world, &state));
    }
}
