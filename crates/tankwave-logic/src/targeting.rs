//! Auto-aim target selection and auto-fire resource gating.
//!
//! Pure decision functions over candidate snapshots; the engine computes
//! line-of-sight and builds the candidate list, this module ranks it.

use crate::constants::player::*;
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};

/// One potential auto-aim target as seen this tick.
#[derive(Debug, Clone, Copy)]
pub struct TargetCandidate {
    pub pos: Vec2,
    pub tier: u8,
    pub shielded: bool,
    /// Spawn warmup finished (enemy can act).
    pub warmed_up: bool,
    /// Post-spawn holdoff finished (enemy may be targeted).
    pub targetable: bool,
    pub line_of_sight: bool,
}

/// What the auto-aim resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimTarget {
    Boss { angle: f32 },
    Enemy { angle: f32, shielded: bool },
    /// Sentinel: nothing eligible this tick. Not an error.
    None,
}

impl AimTarget {
    pub fn angle(&self) -> Option<f32> {
        match self {
            AimTarget::Boss { angle } => Some(*angle),
            AimTarget::Enemy { angle, .. } => Some(*angle),
            AimTarget::None => None,
        }
    }
}

/// Resolve the auto-aim target from the player's position.
///
/// Priority is strict: a boss with line-of-sight wins immediately; then the
/// highest-tier eligible enemy (warmed up, past holdoff, in sight,
/// unshielded), ties broken by distance; then the nearest shielded enemy;
/// otherwise `AimTarget::None`.
pub fn select_target(
    player: Vec2,
    boss: Option<(Vec2, bool)>,
    enemies: &[TargetCandidate],
) -> AimTarget {
    if let Some((boss_pos, los)) = boss {
        if los {
            return AimTarget::Boss {
                angle: (boss_pos - player).angle(),
            };
        }
    }

    let mut best: Option<&TargetCandidate> = None;
    let mut best_shielded: Option<&TargetCandidate> = None;
    for cand in enemies {
        if !cand.warmed_up || !cand.targetable || !cand.line_of_sight {
            continue;
        }
        if cand.shielded {
            let closer = best_shielded
                .map(|b| cand.pos.distance_squared(player) < b.pos.distance_squared(player))
                .unwrap_or(true);
            if closer {
                best_shielded = Some(cand);
            }
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => {
                cand.tier > b.tier
                    || (cand.tier == b.tier
                        && cand.pos.distance_squared(player) < b.pos.distance_squared(player))
            }
        };
        if better {
            best = Some(cand);
        }
    }

    if let Some(cand) = best {
        AimTarget::Enemy {
            angle: (cand.pos - player).angle(),
            shielded: false,
        }
    } else if let Some(cand) = best_shielded {
        AimTarget::Enemy {
            angle: (cand.pos - player).angle(),
            shielded: true,
        }
    } else {
        AimTarget::None
    }
}

/// Player resource state the auto-fire gate inspects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FireGate {
    pub overheated: bool,
    pub thermal_locked: bool,
    pub temperature: f32,
    pub max_temperature: f32,
    pub energy: f32,
    pub max_energy: f32,
}

/// Resource gate for auto-fire. The weapon-fire operation enforces its own
/// rate cooldown; checking it here as well would double-gate shots.
pub fn can_auto_fire(gate: &FireGate) -> bool {
    if gate.overheated || gate.thermal_locked {
        return false;
    }
    if gate.max_temperature > 0.0
        && gate.temperature >= gate.max_temperature * AUTO_FIRE_MAX_HEAT_FRACTION
    {
        return false;
    }
    if gate.max_energy > 0.0 && gate.energy <= gate.max_energy * AUTO_FIRE_MIN_ENERGY_FRACTION {
        return false;
    }
    true
}

/// Spread applied to a shot; auto-aimed shots get a flat reduction.
pub fn shot_spread(auto_aimed: bool) -> f32 {
    if auto_aimed {
        BASE_SPREAD * (1.0 - AUTO_AIM_SPREAD_REDUCTION)
    } else {
        BASE_SPREAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(x: f32, tier: u8) -> TargetCandidate {
        TargetCandidate {
            pos: Vec2::new(x, 0.0),
            tier,
            shielded: false,
            warmed_up: true,
            targetable: true,
            line_of_sight: true,
        }
    }

    #[test]
    fn boss_in_sight_wins_over_everything() {
        let enemies = [cand(10.0, 9)];
        let target = select_target(
            Vec2::ZERO,
            Some((Vec2::new(0.0, 100.0), true)),
            &enemies,
        );
        assert!(matches!(target, AimTarget::Boss { .. }));
    }

    #[test]
    fn boss_without_los_falls_through_to_enemies() {
        let enemies = [cand(10.0, 1)];
        let target = select_target(
            Vec2::ZERO,
            Some((Vec2::new(0.0, 100.0), false)),
            &enemies,
        );
        assert!(matches!(target, AimTarget::Enemy { shielded: false, .. }));
    }

    #[test]
    fn higher_tier_beats_closer_distance() {
        let enemies = [cand(10.0, 1), cand(500.0, 3)];
        let target = select_target(Vec2::ZERO, None, &enemies);
        // Tier 3 at x=500 wins; its angle is 0 (positive x).
        assert_eq!(target.angle(), Some(0.0));
        let enemies = [cand(-10.0, 2), cand(500.0, 2)];
        let target = select_target(Vec2::ZERO, None, &enemies);
        // Equal tier: nearest wins (negative x, angle PI).
        assert!((target.angle().unwrap().abs() - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn shielded_only_falls_back_to_nearest_shielded() {
        let mut near = cand(50.0, 1);
        near.shielded = true;
        let mut far = cand(-300.0, 5);
        far.shielded = true;
        let target = select_target(Vec2::ZERO, None, &[far, near]);
        match target {
            AimTarget::Enemy { angle, shielded } => {
                assert!(shielded);
                assert!(angle.abs() < 1e-5);
            }
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn warmup_and_holdoff_exclude_candidates() {
        let mut fresh = cand(10.0, 5);
        fresh.warmed_up = false;
        let mut held = cand(20.0, 5);
        held.targetable = false;
        assert_eq!(select_target(Vec2::ZERO, None, &[fresh, held]), AimTarget::None);
    }

    #[test]
    fn fire_gate_checks_resources_only() {
        let mut gate = FireGate {
            overheated: false,
            thermal_locked: false,
            temperature: 0.0,
            max_temperature: 100.0,
            energy: 100.0,
            max_energy: 100.0,
        };
        assert!(can_auto_fire(&gate));
        gate.temperature = 90.0;
        assert!(!can_auto_fire(&gate));
        gate.temperature = 0.0;
        gate.energy = 5.0;
        assert!(!can_auto_fire(&gate));
        gate.energy = 100.0;
        gate.thermal_locked = true;
        assert!(!can_auto_fire(&gate));
    }

    #[test]
    fn auto_aim_halves_spread() {
        assert!(shot_spread(true) < shot_spread(false));
        assert!((shot_spread(true) - shot_spread(false) * 0.5).abs() < 1e-6);
    }
}
