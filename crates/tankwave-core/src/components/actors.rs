//! Enemy and boss components.

use serde::{Deserialize, Serialize};
use tankwave_logic::constants::{ai, boss, combat};
use tankwave_logic::geometry::Vec2;
use tankwave_logic::tiers;

/// Enemy behavior mode. Transitions are driven by distance, line-of-sight,
/// hp ratio, and elapsed timers in the AI system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AiState {
    #[default]
    Patrol,
    Alert,
    Attack,
    Retreat,
    Detour,
    StuckRecovery,
}

/// Elemental status effects as time remaining in seconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusEffects {
    pub burning: f32,
    pub frozen: f32,
    pub stunned: f32,
    pub slowed: f32,
}

impl StatusEffects {
    pub fn tick(&mut self, dt: f32) {
        self.burning = (self.burning - dt).max(0.0);
        if self.frozen > 0.0 {
            self.frozen = (self.frozen - dt).max(0.0);
            // Thawing leaves a chill before full speed returns.
            if self.frozen == 0.0 {
                self.slowed = self.slowed.max(combat::CHILL_LINGER);
            }
        }
        self.stunned = (self.stunned - dt).max(0.0);
        self.slowed = (self.slowed - dt).max(0.0);
    }

    /// Movement speed multiplier under current effects.
    pub fn speed_factor(&self) -> f32 {
        if self.stunned > 0.0 {
            0.0
        } else if self.frozen > 0.0 {
            0.45
        } else if self.slowed > 0.0 {
            0.7
        } else {
            1.0
        }
    }
}

/// Per-enemy AI and combat state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub tier: u8,
    pub state: AiState,
    pub heading: f32,
    pub turret_angle: f32,

    // Timers (ticks for AI hysteresis, seconds for weapon cooldown)
    pub fire_cooldown: f32,
    pub stuck_ticks: u32,
    pub detour_ticks: u32,
    pub turret_jitter_ticks: u32,
    pub avoid_lock_ticks: u32,
    pub queue_wait_ticks: u32,
    pub cover_recalc_ticks: u32,
    /// Remaining spawn warmup; the enemy cannot act until this hits zero.
    pub warmup_ticks: u32,
    /// Remaining post-warmup holdoff; auto-aim ignores the enemy until zero.
    pub holdoff_ticks: u32,

    // Anchors
    pub home: Vec2,
    pub guard_point: Vec2,
    pub patrol_point: Vec2,
    pub detour_target: Option<Vec2>,
    pub cover_point: Option<Vec2>,

    // Aim jitter: error relaxes toward target, re-rolled on an interval.
    pub turret_error: f32,
    pub turret_error_target: f32,

    // Persistent steering traits rolled at spawn
    pub arc_dir: f32,
    pub arc_variance: f32,
    pub avoid_side: f32,

    // Player tracking
    pub last_known_player: Option<Vec2>,
    pub time_since_seen: f32,

    pub status: StatusEffects,
    /// Previous tick position, for stuck detection.
    pub prev_pos: Vec2,
}

impl Enemy {
    /// Fresh enemy at `home`. `arc_roll` and `side_roll` in [0, 1) set the
    /// persistent steering traits.
    pub fn spawn(tier: u8, home: Vec2, arc_roll: f32, side_roll: f32) -> Self {
        Self {
            tier,
            state: AiState::Patrol,
            heading: 0.0,
            turret_angle: 0.0,
            fire_cooldown: tiers::tier(tier).fire_cooldown,
            stuck_ticks: 0,
            detour_ticks: 0,
            turret_jitter_ticks: ai::TURRET_JITTER_INTERVAL,
            avoid_lock_ticks: 0,
            queue_wait_ticks: 0,
            cover_recalc_ticks: 0,
            warmup_ticks: ai::SPAWN_WARMUP_TICKS,
            holdoff_ticks: ai::TARGET_HOLDOFF_TICKS,
            home,
            guard_point: home,
            patrol_point: home,
            detour_target: None,
            cover_point: None,
            turret_error: 0.0,
            turret_error_target: 0.0,
            arc_dir: if side_roll < 0.5 { -1.0 } else { 1.0 },
            arc_variance: arc_roll * 2.0 - 1.0,
            avoid_side: if side_roll < 0.5 { -1.0 } else { 1.0 },
            last_known_player: None,
            time_since_seen: f32::MAX,
            status: StatusEffects::default(),
            prev_pos: home,
        }
    }

    /// Force the enemy combat-ready: alerted, no spawn protection, no
    /// holdoff. Applied to every enemy restored from a save.
    pub fn make_combat_ready(&mut self, player_pos: Vec2) {
        self.state = AiState::Alert;
        self.warmup_ticks = 0;
        self.holdoff_ticks = 0;
        self.last_known_player = Some(player_pos);
        self.time_since_seen = 0.0;
    }

    pub fn warmed_up(&self) -> bool {
        self.warmup_ticks == 0
    }

    pub fn targetable(&self) -> bool {
        self.warmup_ticks == 0 && self.holdoff_ticks == 0
    }
}

/// Ultimate attack cycle. Timer is seconds remaining in the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum UltimateState {
    #[default]
    Idle,
    Charging {
        remaining: f32,
    },
    Firing {
        remaining: f32,
    },
    Cooldown {
        remaining: f32,
    },
}

/// Boss turret sub-entity with its own energy pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BossTurret {
    /// Mount angle relative to the hull.
    pub mount_angle: f32,
    pub energy: f32,
    pub max_energy: f32,
    pub cooldown: f32,
}

impl BossTurret {
    pub fn new(mount_angle: f32) -> Self {
        Self {
            mount_angle,
            energy: boss::TURRET_MAX_ENERGY,
            max_energy: boss::TURRET_MAX_ENERGY,
            cooldown: 0.0,
        }
    }
}

/// The singleton boss. Exists iff the engine's `boss_active` flag is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub phase: u8,
    /// Angle of the hover orbit around the arena center.
    pub hover_angle: f32,
    pub hover_dir: f32,
    pub turrets: Vec<BossTurret>,
    pub ultimate: UltimateState,
}

impl Boss {
    pub fn new() -> Self {
        let turrets = (0..boss::TURRET_COUNT)
            .map(|i| {
                BossTurret::new(i as f32 * std::f32::consts::PI * 2.0 / boss::TURRET_COUNT as f32)
            })
            .collect();
        Self {
            phase: 1,
            hover_angle: 0.0,
            hover_dir: 1.0,
            turrets,
            ultimate: UltimateState::Idle,
        }
    }
}

impl Default for Boss {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_enemy_is_protected_then_targetable() {
        let e = Enemy::spawn(1, Vec2::ZERO, 0.3, 0.8);
        assert!(!e.warmed_up());
        assert!(!e.targetable());
        assert_eq!(e.state, AiState::Patrol);
    }

    #[test]
    fn combat_ready_strips_all_grace() {
        let mut e = Enemy::spawn(2, Vec2::new(10.0, 10.0), 0.5, 0.1);
        e.make_combat_ready(Vec2::ZERO);
        assert_eq!(e.state, AiState::Alert);
        assert!(e.warmed_up());
        assert!(e.targetable());
        assert_eq!(e.last_known_player, Some(Vec2::ZERO));
    }

    #[test]
    fn status_effects_expire() {
        let mut s = StatusEffects {
            stunned: 0.1,
            ..Default::default()
        };
        assert_eq!(s.speed_factor(), 0.0);
        s.tick(0.2);
        assert_eq!(s.speed_factor(), 1.0);
    }

    #[test]
    fn thaw_leaves_a_lingering_chill() {
        let mut s = StatusEffects {
            frozen: 0.1,
            ..Default::default()
        };
        assert_eq!(s.speed_factor(), 0.45);
        s.tick(0.2);
        assert!(s.slowed > 0.0);
        assert_eq!(s.speed_factor(), 0.7);
        s.tick(combat::CHILL_LINGER + 1.0);
        assert_eq!(s.speed_factor(), 1.0);
    }

    #[test]
    fn boss_has_configured_turrets() {
        let b = Boss::new();
        assert_eq!(b.turrets.len(), boss::TURRET_COUNT);
        assert_eq!(b.phase, 1);
        assert_eq!(b.ultimate, UltimateState::Idle);
    }
}
