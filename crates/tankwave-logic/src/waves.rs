//! Wave progression math: scaling, completion, rewards, and the item table.

use crate::constants::waves::*;
use serde::{Deserialize, Serialize};

/// Enemies the wave manager must spawn for a given wave number.
pub fn enemies_per_wave(wave: u32) -> u32 {
    (BASE_ENEMIES + wave.saturating_sub(1) * ENEMIES_PER_WAVE_GROWTH).min(MAX_ENEMIES_PER_WAVE)
}

/// Completion predicate: every scheduled enemy has been spawned and none
/// are left alive. `total_spawned` is the cumulative spawn count for the
/// current wave.
pub fn wave_complete(live_enemies: usize, total_spawned: u32, per_wave: u32) -> bool {
    live_enemies == 0 && total_spawned >= per_wave
}

/// True once normal spawning should give way to the boss.
pub fn is_boss_wave(wave: u32) -> bool {
    wave >= BOSS_WAVE
}

/// Item rarity for pickups and wave rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    RepairKit,
    EnergyCell,
    Coolant,
    DamageCore,
    CritScope,
    LifestealRig,
    ReviveToken,
}

/// Display/persistence descriptor for an item kind.
#[derive(Debug, Clone, Copy)]
pub struct ItemDef {
    pub kind: ItemKind,
    pub rarity: Rarity,
    pub short_code: &'static str,
    pub color: &'static str,
}

pub const ITEMS: [ItemDef; 7] = [
    ItemDef {
        kind: ItemKind::RepairKit,
        rarity: Rarity::Common,
        short_code: "RK",
        color: "#6fbf6f",
    },
    ItemDef {
        kind: ItemKind::EnergyCell,
        rarity: Rarity::Common,
        short_code: "EC",
        color: "#5fa8d9",
    },
    ItemDef {
        kind: ItemKind::Coolant,
        rarity: Rarity::Common,
        short_code: "CL",
        color: "#9fd4e8",
    },
    ItemDef {
        kind: ItemKind::DamageCore,
        rarity: Rarity::Rare,
        short_code: "DC",
        color: "#d9735f",
    },
    ItemDef {
        kind: ItemKind::CritScope,
        rarity: Rarity::Rare,
        short_code: "CS",
        color: "#d9b75f",
    },
    ItemDef {
        kind: ItemKind::LifestealRig,
        rarity: Rarity::Epic,
        short_code: "LR",
        color: "#b76fd9",
    },
    ItemDef {
        kind: ItemKind::ReviveToken,
        rarity: Rarity::Epic,
        short_code: "RT",
        color: "#e8e25f",
    },
];

pub fn item_def(kind: ItemKind) -> &'static ItemDef {
    ITEMS
        .iter()
        .find(|d| d.kind == kind)
        .expect("every ItemKind has a table entry")
}

/// Kill-drop roll. `roll` decides whether anything drops, `kind_roll`
/// selects what, weighted toward commons.
pub fn roll_kill_drop(roll: f32, kind_roll: f32) -> Option<ItemKind> {
    use crate::constants::pickups::DROP_CHANCE;
    if roll >= DROP_CHANCE {
        return None;
    }
    Some(if kind_roll < 0.30 {
        ItemKind::RepairKit
    } else if kind_roll < 0.55 {
        ItemKind::EnergyCell
    } else if kind_roll < 0.78 {
        ItemKind::Coolant
    } else if kind_roll < 0.90 {
        ItemKind::DamageCore
    } else {
        ItemKind::CritScope
    })
}

/// Reward summary issued on wave completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveReward {
    pub wave: u32,
    pub bonus_score: u32,
    pub hp_restore: f32,
    pub rare_item: Option<ItemKind>,
    /// Revive token on designated milestone waves.
    pub revive_drop: bool,
}

/// Compute the completion reward for `wave`. `rare_roll` in [0, 1) decides
/// the optional rare-item drop.
pub fn wave_reward(wave: u32, rare_roll: f32) -> WaveReward {
    let rare_item = if rare_roll < RARE_DROP_CHANCE {
        Some(if rare_roll < RARE_DROP_CHANCE * 0.25 {
            ItemKind::LifestealRig
        } else if rare_roll < RARE_DROP_CHANCE * 0.6 {
            ItemKind::CritScope
        } else {
            ItemKind::DamageCore
        })
    } else {
        None
    };
    WaveReward {
        wave,
        bonus_score: 250 * wave,
        hp_restore: 15.0 + wave as f32 * 1.5,
        rare_item,
        revive_drop: wave % REVIVE_DROP_INTERVAL == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_wave_count_scales_and_caps() {
        assert_eq!(enemies_per_wave(1), BASE_ENEMIES);
        assert_eq!(
            enemies_per_wave(2),
            BASE_ENEMIES + ENEMIES_PER_WAVE_GROWTH
        );
        assert_eq!(enemies_per_wave(500), MAX_ENEMIES_PER_WAVE);
    }

    #[test]
    fn completion_requires_full_spawn_and_zero_live() {
        let per_wave = enemies_per_wave(1);
        assert!(!wave_complete(0, per_wave - 1, per_wave)); // not all spawned
        assert!(!wave_complete(2, per_wave, per_wave)); // still alive
        assert!(wave_complete(0, per_wave, per_wave));
    }

    #[test]
    fn milestone_waves_drop_revives() {
        assert!(wave_reward(REVIVE_DROP_INTERVAL, 0.99).revive_drop);
        assert!(!wave_reward(REVIVE_DROP_INTERVAL + 1, 0.99).revive_drop);
    }

    #[test]
    fn rare_roll_gates_rare_item() {
        assert!(wave_reward(3, 0.0).rare_item.is_some());
        assert!(wave_reward(3, 0.999).rare_item.is_none());
    }

    #[test]
    fn no_drop_above_drop_chance() {
        assert!(roll_kill_drop(0.99, 0.5).is_none());
        assert!(roll_kill_drop(0.0, 0.0).is_some());
    }

    #[test]
    fn item_table_covers_every_kind() {
        for kind in [
            ItemKind::RepairKit,
            ItemKind::EnergyCell,
            ItemKind::Coolant,
            ItemKind::DamageCore,
            ItemKind::CritScope,
            ItemKind::LifestealRig,
            ItemKind::ReviveToken,
        ] {
            assert_eq!(item_def(kind).kind, kind);
        }
    }
}
