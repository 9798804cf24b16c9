//! Tuning constants — every named knob the behavior code reads.
//!
//! Difficulty and feel are tuned here, never by editing behavior code.
//! Distances are world units, angles are radians. AI hysteresis timers are
//! tick counts (the engine runs a fixed 60 Hz step); cooldowns and lifetimes
//! elsewhere are seconds.

pub mod world {
    /// Playable arena extent.
    pub const WORLD_WIDTH: f32 = 4000.0;
    pub const WORLD_HEIGHT: f32 = 3000.0;
    /// No structure may be placed with its rect inside this radius of the
    /// player spawn (arena center).
    pub const SPAWN_SAFE_RADIUS: f32 = 320.0;
    /// Minimum gap kept between placed structures.
    pub const STRUCTURE_MARGIN: f32 = 48.0;
    /// Placement attempts before a structure is skipped.
    pub const PLACEMENT_ATTEMPTS: u32 = 40;
    /// Attempts to find a clear entity spawn before falling back to the
    /// deterministic default near world center.
    pub const SPAWN_ATTEMPTS: u32 = 24;
    pub const WALL_COUNT: usize = 14;
    pub const CRATE_COUNT: usize = 22;
    pub const WALL_HP: f32 = 400.0;
    pub const CRATE_HP: f32 = 120.0;
    /// Spatial grid cell edge.
    pub const GRID_CELL_SIZE: f32 = 128.0;
}

pub mod ai {
    /// Distance at which a patrolling enemy aggroes regardless of vision cone.
    pub const ENEMY_CHASE_DISTANCE_THRESHOLD: f32 = 520.0;
    /// Vision cone used for the patrol -> alert check.
    pub const ENEMY_VISION_RANGE: f32 = 650.0;
    pub const ENEMY_VISION_HALF_ANGLE: f32 = 1.1;

    /// Preferred engagement distance an attacker tries to hold.
    pub const ENEMY_STANDOFF_RADIUS: f32 = 260.0;
    /// Attackers never press closer than this on purpose.
    pub const MIN_ATTACK_SPACING: f32 = 120.0;
    /// Active attack slots; everyone else holds formation.
    pub const MAX_SIMULTANEOUS_ATTACKERS: usize = 3;
    /// Radius increment per formation ring for enemies without a slot.
    pub const ENEMY_FORMATION_RADIUS_STEP: f32 = 90.0;

    /// Separation bands: gentle push inside SOFT, strong push inside HARD.
    pub const ENEMY_SOFT_SEPARATION: f32 = 110.0;
    pub const ENEMY_HARD_SEPARATION: f32 = 60.0;
    /// Pairwise repulsion gain applied inside ENEMY_MIN_DISTANCE.
    pub const ENEMY_REPULSION_STRENGTH: f32 = 1.8;
    /// No stable overlap is allowed inside this distance.
    pub const ENEMY_MIN_DISTANCE: f32 = 80.0;
    /// Blend weight of separation against pursuit.
    pub const ENEMY_SEPARATION_WEIGHT: f32 = 1.25;

    /// Bullets considered for dodging.
    pub const BULLET_DODGE_RADIUS: f32 = 180.0;
    /// Max deviation of a bullet's heading from a collision course that
    /// still triggers a dodge.
    pub const BULLET_DODGE_ANGLE: f32 = 0.5;

    /// Tangential strafe blended onto direct pursuit.
    pub const ENEMY_ARC_STRAFE_WEIGHT: f32 = 0.55;
    /// Per-enemy randomized variance of the strafe arc.
    pub const ENEMY_ARC_VARIANCE: f32 = 0.35;

    /// Retreat triggers on hp ratio; emergency variant below CRITICAL.
    pub const LOW_HP_RETREAT_THRESHOLD: f32 = 0.35;
    pub const CRITICAL_HP_THRESHOLD: f32 = 0.15;
    /// Speed multiplier while retreating.
    pub const ENEMY_RETREAT_SPEED: f32 = 1.15;
    /// Retreat ends once distance to player lands in this band.
    pub const ENEMY_RETREAT_MIN_DISTANCE: f32 = 420.0;
    pub const ENEMY_RETREAT_MAX_DISTANCE: f32 = 700.0;
    /// Cover point is recomputed every this many ticks.
    pub const ENEMY_COVER_RECALC: u32 = 45;
    /// Standoff kept between a covering enemy and its cover rect.
    pub const ENEMY_COVER_BUFFER: f32 = 40.0;

    /// Consecutive blocked ticks before entering detour.
    pub const ENEMY_PATH_FAIL_THRESHOLD: u32 = 18;
    /// A wall this close in the movement direction forces a detour.
    pub const ENEMY_WALL_DANGER_DISTANCE: f32 = 70.0;
    pub const ENEMY_DETOUR_DISTANCE: f32 = 160.0;
    pub const ENEMY_DETOUR_VARIANCE: f32 = 50.0;
    /// Detour waypoint is abandoned after this many ticks.
    pub const ENEMY_DETOUR_TIMEOUT: u32 = 90;

    /// Followers break a pursuit queue once the lead attacker is this far
    /// from the player...
    pub const ENEMY_QUEUE_DISTANCE_BREAK: f32 = 380.0;
    /// ...for this many consecutive ticks.
    pub const ENEMY_QUEUE_BREAK_TIME: u32 = 40;
    /// Minimum ticks between avoidance direction flips (zigzag lock).
    pub const ENEMY_AVOID_LOCK_FRAMES: u32 = 12;

    /// Movement below this per-tick displacement counts as stuck.
    pub const STUCK_EPSILON: f32 = 0.6;

    /// Patrol waypoint jitter radius around the guard anchor.
    pub const PATROL_RADIUS: f32 = 220.0;
    /// Patrol movement speed as a fraction of tier speed.
    pub const PATROL_SPEED_FACTOR: f32 = 0.45;

    /// Ticks after spawn during which an enemy cannot act.
    pub const SPAWN_WARMUP_TICKS: u32 = 45;
    /// Ticks after warmup during which auto-aim still ignores the enemy.
    pub const TARGET_HOLDOFF_TICKS: u32 = 30;

    /// Turret error relaxes toward its target over this many ticks, then a
    /// new target error is rolled.
    pub const TURRET_JITTER_INTERVAL: u32 = 50;
}

pub mod player {
    pub const MAX_HP: f32 = 100.0;
    pub const MAX_ENERGY: f32 = 100.0;
    pub const MAX_TEMPERATURE: f32 = 100.0;
    pub const MOVE_SPEED: f32 = 240.0;
    pub const TURBO_MULTIPLIER: f32 = 1.8;
    pub const TURBO_COOLDOWN: f32 = 6.0;
    pub const ULTIMATE_COOLDOWN: f32 = 30.0;
    pub const FIRE_COOLDOWN: f32 = 0.18;
    pub const FIRE_HEAT_COST: f32 = 6.5;
    pub const FIRE_ENERGY_COST: f32 = 2.0;
    pub const COOLING_RATE: f32 = 14.0;
    pub const ENERGY_REGEN: f32 = 9.0;
    /// Heat fraction above which the thermal lock engages until cooled.
    pub const THERMAL_LOCK_FRACTION: f32 = 1.0;
    pub const THERMAL_UNLOCK_FRACTION: f32 = 0.55;

    /// Auto-fire resource gates (fire-rate cooldown is NOT checked here).
    pub const AUTO_FIRE_MAX_HEAT_FRACTION: f32 = 0.85;
    pub const AUTO_FIRE_MIN_ENERGY_FRACTION: f32 = 0.15;
    /// Flat spread reduction applied to an auto-aimed shot.
    pub const AUTO_AIM_SPREAD_REDUCTION: f32 = 0.5;
    pub const BASE_SPREAD: f32 = 0.09;
    pub const BULLET_SPEED: f32 = 760.0;
    pub const BULLET_DAMAGE: f32 = 14.0;
    pub const BULLET_LIFE: f32 = 1.6;
}

pub mod waves {
    pub const BASE_ENEMIES: u32 = 4;
    pub const ENEMIES_PER_WAVE_GROWTH: u32 = 2;
    pub const MAX_ENEMIES_PER_WAVE: u32 = 24;
    /// Seconds between kills that keep the score streak alive.
    pub const STREAK_WINDOW: f32 = 4.0;
    /// Fixed pause between waves, in ticks.
    pub const INTERMISSION_TICKS: u32 = 180;
    /// Seconds between spawn batches within a wave.
    pub const SPAWN_INTERVAL: f32 = 1.4;
    pub const SPAWN_BATCH: u32 = 2;
    /// Wave on which the boss replaces normal spawning.
    pub const BOSS_WAVE: u32 = 10;
    /// Every Nth completed wave drops a revive token.
    pub const REVIVE_DROP_INTERVAL: u32 = 5;
    pub const RARE_DROP_CHANCE: f32 = 0.15;
}

pub mod boss {
    pub const MAX_HP: f32 = 2600.0;
    pub const PHASE2_HP_FRACTION: f32 = 0.66;
    pub const PHASE3_HP_FRACTION: f32 = 0.33;
    pub const HOVER_SPEED: f32 = 90.0;
    pub const HOVER_RADIUS: f32 = 420.0;
    pub const TURRET_COUNT: usize = 3;
    pub const TURRET_MAX_ENERGY: f32 = 60.0;
    pub const TURRET_FIRE_COST: f32 = 12.0;
    pub const TURRET_REGEN: f32 = 8.0;
    pub const TURRET_COOLDOWN: f32 = 0.9;
    pub const ULTIMATE_CHARGE: f32 = 2.2;
    pub const ULTIMATE_FIRING: f32 = 1.4;
    pub const ULTIMATE_COOLDOWN: f32 = 9.0;
    pub const ULTIMATE_BULLETS: u32 = 24;
}

pub mod combat {
    pub const PLAYER_RADIUS: f32 = 26.0;
    pub const ENEMY_RADIUS: f32 = 26.0;
    pub const BOSS_RADIUS: f32 = 80.0;
    pub const CRIT_MULTIPLIER: f32 = 2.0;
    /// Burn damage per second while the burning status is active.
    pub const BURN_DPS: f32 = 4.0;
    pub const BURN_DURATION: f32 = 2.5;
    pub const FREEZE_DURATION: f32 = 1.8;
    /// Seconds of reduced speed left behind when a freeze thaws.
    pub const CHILL_LINGER: f32 = 1.2;
    pub const STUN_DURATION: f32 = 0.6;
    /// Blast radius for area-of-effect bullets.
    pub const AOE_RADIUS: f32 = 90.0;
}

pub mod pickups {
    /// Seconds a pickup stays on the ground.
    pub const LIFETIME: f32 = 14.0;
    pub const COLLECT_RADIUS: f32 = 52.0;
    /// Chance any enemy kill drops something.
    pub const DROP_CHANCE: f32 = 0.22;
}
