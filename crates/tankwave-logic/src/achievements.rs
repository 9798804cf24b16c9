//! Data-driven achievement engine: stat aggregation and tier unlocking.
//!
//! Achievements are rows in a static table; each defines a metric over the
//! aggregated stats and an ascending threshold ladder. Unlock state lives
//! outside this crate (persisted per player); [`evaluate`] only reports the
//! tiers newly crossed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregated stats an achievement metric can read. Most fields reset per
/// session; `lifetime_kills` is merged in from the lifetime record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub kills: u64,
    pub shots_fired: u64,
    pub damage_dealt: f64,
    pub best_streak: u32,
    pub best_wave: u32,
    pub score: u64,
    pub survival_secs: f64,
    pub boss_killed: bool,
    pub flawless_waves: u32,
    pub crates_destroyed: u64,
    pub pickups_collected: u64,
    pub lifetime_kills: u64,
}

/// One batch of stat changes from the simulation.
///
/// Merge policy per field: counters are summed, records are max-of,
/// one-shot flags are boolean-OR, score/time overwrite only when greater.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatDelta {
    pub kills_added: u64,
    pub shots_added: u64,
    pub damage_added: f64,
    pub streak: u32,
    pub wave: u32,
    pub score: u64,
    pub survival_secs: f64,
    pub boss_killed: bool,
    pub flawless_wave: bool,
    pub crates_added: u64,
    pub pickups_added: u64,
}

/// Merge a delta into cumulative stats using the per-field policy.
pub fn merge(stats: &mut SessionStats, delta: &StatDelta) {
    stats.kills += delta.kills_added;
    stats.lifetime_kills += delta.kills_added;
    stats.shots_fired += delta.shots_added;
    stats.damage_dealt += delta.damage_added;
    stats.crates_destroyed += delta.crates_added;
    stats.pickups_collected += delta.pickups_added;
    stats.best_streak = stats.best_streak.max(delta.streak);
    stats.best_wave = stats.best_wave.max(delta.wave);
    stats.score = stats.score.max(delta.score);
    if delta.survival_secs > stats.survival_secs {
        stats.survival_secs = delta.survival_secs;
    }
    stats.boss_killed |= delta.boss_killed;
    if delta.flawless_wave {
        stats.flawless_waves += 1;
    }
}

/// Static achievement definition.
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub metric: fn(&SessionStats) -> u64,
    /// Ascending thresholds; tier N (1-based) unlocks at thresholds[N-1].
    pub thresholds: &'static [u64],
    pub tier_names: &'static [&'static str],
}

impl AchievementDef {
    pub fn tier_count(&self) -> u32 {
        self.thresholds.len() as u32
    }
}

pub const ACHIEVEMENTS: [AchievementDef; 9] = [
    AchievementDef {
        id: "first_blood",
        title: "First Blood",
        metric: |s| s.kills,
        thresholds: &[1, 25, 60],
        tier_names: &["Blooded", "Slayer", "Reaper"],
    },
    AchievementDef {
        id: "wave_rider",
        title: "Wave Rider",
        metric: |s| s.best_wave as u64,
        thresholds: &[3, 6, 10],
        tier_names: &["Contender", "Veteran", "Finalist"],
    },
    AchievementDef {
        id: "high_score",
        title: "High Score",
        metric: |s| s.score,
        thresholds: &[10_000, 50_000, 150_000],
        tier_names: &["Scorer", "Ace", "Legend"],
    },
    AchievementDef {
        id: "streaker",
        title: "Kill Streak",
        metric: |s| s.best_streak as u64,
        thresholds: &[5, 10, 20],
        tier_names: &["Hot", "Blazing", "Unstoppable"],
    },
    AchievementDef {
        id: "demolitionist",
        title: "Demolitionist",
        metric: |s| s.crates_destroyed,
        thresholds: &[10, 50, 150],
        tier_names: &["Wrecker", "Breaker", "Leveler"],
    },
    AchievementDef {
        id: "survivor",
        title: "Survivor",
        metric: |s| s.survival_secs as u64,
        thresholds: &[120, 600, 1800],
        tier_names: &["Steady", "Enduring", "Immortal"],
    },
    AchievementDef {
        id: "boss_slayer",
        title: "Boss Slayer",
        metric: |s| s.boss_killed as u64,
        thresholds: &[1],
        tier_names: &["Giantkiller"],
    },
    AchievementDef {
        id: "scavenger",
        title: "Scavenger",
        metric: |s| s.pickups_collected,
        thresholds: &[10, 40, 100],
        tier_names: &["Collector", "Hoarder", "Magpie"],
    },
    AchievementDef {
        id: "veteran",
        title: "Veteran",
        metric: |s| s.lifetime_kills,
        thresholds: &[100, 500, 2000],
        tier_names: &["Regular", "Hardened", "Warborn"],
    },
];

pub fn achievement(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// One tier crossing, emitted once per tier gained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlock {
    pub id: String,
    pub tier: u32,
    pub tier_name: String,
}

/// Scan every achievement from its currently unlocked tier forward and
/// report each newly crossed tier. A single stat update can unlock several
/// tiers of the same achievement; one `Unlock` is emitted per tier so the
/// notification layer shows them all. Callers apply the highest tier per id
/// back to their unlocked map.
pub fn evaluate(stats: &SessionStats, unlocked: &HashMap<String, u32>) -> Vec<Unlock> {
    let mut unlocks = Vec::new();
    for def in &ACHIEVEMENTS {
        let current = unlocked.get(def.id).copied().unwrap_or(0);
        if current >= def.tier_count() {
            continue;
        }
        let value = (def.metric)(stats);
        for tier_idx in current..def.tier_count() {
            if value >= def.thresholds[tier_idx as usize] {
                unlocks.push(Unlock {
                    id: def.id.to_string(),
                    tier: tier_idx + 1,
                    tier_name: def.tier_names[tier_idx as usize].to_string(),
                });
            } else {
                break;
            }
        }
    }
    unlocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(unlocked: &mut HashMap<String, u32>, unlocks: &[Unlock]) {
        for u in unlocks {
            let entry = unlocked.entry(u.id.clone()).or_insert(0);
            *entry = (*entry).max(u.tier);
        }
    }

    #[test]
    fn merge_policies() {
        let mut stats = SessionStats::default();
        merge(
            &mut stats,
            &StatDelta {
                kills_added: 3,
                streak: 4,
                score: 100,
                ..Default::default()
            },
        );
        merge(
            &mut stats,
            &StatDelta {
                kills_added: 2,
                streak: 2,
                score: 50,
                boss_killed: true,
                ..Default::default()
            },
        );
        assert_eq!(stats.kills, 5); // summed
        assert_eq!(stats.best_streak, 4); // max-of
        assert_eq!(stats.score, 100); // overwrite-if-greater
        assert!(stats.boss_killed); // boolean-OR
        assert_eq!(stats.lifetime_kills, 5);
    }

    #[test]
    fn first_blood_multi_tier_jump() {
        // Jumping from 0 to 30 kills unlocks tiers 1 and 2 in one call.
        let mut stats = SessionStats::default();
        let mut unlocked = HashMap::new();
        merge(
            &mut stats,
            &StatDelta {
                kills_added: 30,
                ..Default::default()
            },
        );
        let unlocks = evaluate(&stats, &unlocked);
        let fb: Vec<&Unlock> = unlocks.iter().filter(|u| u.id == "first_blood").collect();
        assert_eq!(fb.len(), 2);
        assert_eq!(fb[0].tier, 1);
        assert_eq!(fb[1].tier, 2);
        apply(&mut unlocked, &unlocks);
        assert_eq!(unlocked["first_blood"], 2);
    }

    #[test]
    fn tiers_are_monotonic_and_bounded() {
        let mut unlocked = HashMap::new();
        let mut stats = SessionStats::default();
        let mut previous: HashMap<String, u32> = HashMap::new();
        for kills in [0u64, 1, 10, 30, 100, 5] {
            // Note: merge only ever grows stats, so feed cumulative deltas.
            merge(
                &mut stats,
                &StatDelta {
                    kills_added: kills,
                    ..Default::default()
                },
            );
            let unlocks = evaluate(&stats, &unlocked);
            apply(&mut unlocked, &unlocks);
            for def in &ACHIEVEMENTS {
                let tier = unlocked.get(def.id).copied().unwrap_or(0);
                assert!(tier <= def.tier_count());
                assert!(tier >= previous.get(def.id).copied().unwrap_or(0));
                previous.insert(def.id.to_string(), tier);
            }
        }
    }

    #[test]
    fn already_unlocked_tiers_are_not_reemitted() {
        let mut stats = SessionStats::default();
        let mut unlocked = HashMap::new();
        merge(
            &mut stats,
            &StatDelta {
                kills_added: 2,
                ..Default::default()
            },
        );
        let unlocks = evaluate(&stats, &unlocked);
        apply(&mut unlocked, &unlocks);
        assert_eq!(unlocked["first_blood"], 1);
        // Same stats again: no new unlocks.
        assert!(evaluate(&stats, &unlocked)
            .iter()
            .all(|u| u.id != "first_blood"));
    }

    #[test]
    fn table_rows_are_well_formed() {
        for def in &ACHIEVEMENTS {
            assert_eq!(def.thresholds.len(), def.tier_names.len());
            assert!(def
                .thresholds
                .windows(2)
                .all(|w| w[0] < w[1]), "{} thresholds not ascending", def.id);
        }
    }

    #[test]
    fn one_shot_achievement_unlocks_once() {
        let mut stats = SessionStats::default();
        let mut unlocked = HashMap::new();
        merge(
            &mut stats,
            &StatDelta {
                boss_killed: true,
                ..Default::default()
            },
        );
        let unlocks = evaluate(&stats, &unlocked);
        assert!(unlocks.iter().any(|u| u.id == "boss_slayer" && u.tier == 1));
        apply(&mut unlocked, &unlocks);
        assert!(evaluate(&stats, &unlocked).is_empty() || evaluate(&stats, &unlocked).iter().all(|u| u.id != "boss_slayer"));
    }
}
