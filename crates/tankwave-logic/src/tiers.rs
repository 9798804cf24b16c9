//! Static enemy tier table and boss stat block.
//!
//! A tier is the full difficulty profile an enemy is stamped with at spawn.
//! Behavior code reads profiles through [`tier`] and never hard-codes stats.

use crate::constants::boss;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Cannon,
    TwinCannon,
    Flamer,
    CryoLauncher,
    Railgun,
}

/// Stat profile for one enemy tier.
#[derive(Debug, Clone, Copy)]
pub struct TierDef {
    pub id: u8,
    pub name: &'static str,
    pub max_hp: f32,
    pub speed: f32,
    pub fire_cooldown: f32,
    /// Max turret aim error in radians; jitter relaxes toward this bound.
    pub aim_error: f32,
    pub bullet_damage: f32,
    pub bullet_speed: f32,
    pub score: u32,
    pub shielded: bool,
    pub weapon: WeaponKind,
    pub color: &'static str,
    /// Earliest wave this tier can appear on.
    pub min_wave: u32,
}

pub const TIERS: [TierDef; 5] = [
    TierDef {
        id: 0,
        name: "scout",
        max_hp: 30.0,
        speed: 170.0,
        fire_cooldown: 1.6,
        aim_error: 0.22,
        bullet_damage: 5.0,
        bullet_speed: 420.0,
        score: 50,
        shielded: false,
        weapon: WeaponKind::Cannon,
        color: "#7ec07e",
        min_wave: 1,
    },
    TierDef {
        id: 1,
        name: "raider",
        max_hp: 55.0,
        speed: 150.0,
        fire_cooldown: 1.2,
        aim_error: 0.16,
        bullet_damage: 8.0,
        bullet_speed: 470.0,
        score: 100,
        shielded: false,
        weapon: WeaponKind::TwinCannon,
        color: "#c9a14e",
        min_wave: 2,
    },
    TierDef {
        id: 2,
        name: "pyro",
        max_hp: 80.0,
        speed: 135.0,
        fire_cooldown: 1.0,
        aim_error: 0.14,
        bullet_damage: 10.0,
        bullet_speed: 430.0,
        score: 175,
        shielded: false,
        weapon: WeaponKind::Flamer,
        color: "#d06038",
        min_wave: 4,
    },
    TierDef {
        id: 3,
        name: "cryo",
        max_hp: 95.0,
        speed: 125.0,
        fire_cooldown: 1.3,
        aim_error: 0.12,
        bullet_damage: 9.0,
        bullet_speed: 460.0,
        score: 225,
        shielded: false,
        weapon: WeaponKind::CryoLauncher,
        color: "#5aa7d6",
        min_wave: 5,
    },
    TierDef {
        id: 4,
        name: "juggernaut",
        max_hp: 180.0,
        speed: 95.0,
        fire_cooldown: 1.8,
        aim_error: 0.08,
        bullet_damage: 18.0,
        bullet_speed: 520.0,
        score: 400,
        shielded: true,
        weapon: WeaponKind::Railgun,
        color: "#8a6bb8",
        min_wave: 7,
    },
];

/// Look up a tier profile; out-of-range ids clamp to the last tier.
pub fn tier(id: u8) -> &'static TierDef {
    TIERS.get(id as usize).unwrap_or(&TIERS[TIERS.len() - 1])
}

/// Pick a tier for a spawn on `wave` from a uniform roll in [0, 1).
/// Later tiers gain weight as the wave number climbs.
pub fn pick_tier(wave: u32, roll: f32) -> u8 {
    let eligible: Vec<&TierDef> = TIERS.iter().filter(|t| t.min_wave <= wave).collect();
    let weights: Vec<f32> = eligible
        .iter()
        .map(|t| 1.0 + (wave.saturating_sub(t.min_wave)) as f32 * 0.4)
        .collect();
    let total: f32 = weights.iter().sum();
    let mut cursor = roll.clamp(0.0, 0.999_999) * total;
    for (t, w) in eligible.iter().zip(weights.iter()) {
        if cursor < *w {
            return t.id;
        }
        cursor -= w;
    }
    eligible.last().map(|t| t.id).unwrap_or(0)
}

/// Boss per-phase stat modifiers.
#[derive(Debug, Clone, Copy)]
pub struct BossPhaseDef {
    pub phase: u8,
    pub fire_rate_multiplier: f32,
    pub hover_speed_multiplier: f32,
    pub uses_ultimate: bool,
}

pub const BOSS_PHASES: [BossPhaseDef; 3] = [
    BossPhaseDef {
        phase: 1,
        fire_rate_multiplier: 1.0,
        hover_speed_multiplier: 1.0,
        uses_ultimate: false,
    },
    BossPhaseDef {
        phase: 2,
        fire_rate_multiplier: 1.4,
        hover_speed_multiplier: 1.25,
        uses_ultimate: true,
    },
    BossPhaseDef {
        phase: 3,
        fire_rate_multiplier: 1.9,
        hover_speed_multiplier: 1.5,
        uses_ultimate: true,
    },
];

/// Phase for a boss hp ratio: 1 above PHASE2, 2 above PHASE3, else 3.
pub fn boss_phase(hp_ratio: f32) -> u8 {
    if hp_ratio > boss::PHASE2_HP_FRACTION {
        1
    } else if hp_ratio > boss::PHASE3_HP_FRACTION {
        2
    } else {
        3
    }
}

pub fn boss_phase_def(phase: u8) -> &'static BossPhaseDef {
    BOSS_PHASES
        .get((phase.clamp(1, 3) - 1) as usize)
        .unwrap_or(&BOSS_PHASES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ids_match_indices() {
        for (i, t) in TIERS.iter().enumerate() {
            assert_eq!(t.id as usize, i);
        }
    }

    #[test]
    fn tier_lookup_clamps() {
        assert_eq!(tier(200).id, TIERS[TIERS.len() - 1].id);
    }

    #[test]
    fn early_waves_only_spawn_early_tiers() {
        for roll in [0.0, 0.3, 0.7, 0.99] {
            let id = pick_tier(1, roll);
            assert!(tier(id).min_wave <= 1);
        }
    }

    #[test]
    fn late_waves_can_spawn_juggernauts() {
        // Sweep rolls; at wave 12 the heavy tier must be reachable.
        let mut seen_heavy = false;
        for i in 0..100 {
            if pick_tier(12, i as f32 / 100.0) == 4 {
                seen_heavy = true;
            }
        }
        assert!(seen_heavy);
    }

    #[test]
    fn boss_phases_follow_hp_thresholds() {
        assert_eq!(boss_phase(1.0), 1);
        assert_eq!(boss_phase(0.5), 2);
        assert_eq!(boss_phase(0.1), 3);
        assert!(boss_phase_def(3).fire_rate_multiplier > boss_phase_def(1).fire_rate_multiplier);
    }
}
