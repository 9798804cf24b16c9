//! Session stat tracking and the persistent achievement record.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use tankwave_logic::achievements::{evaluate, merge, SessionStats, StatDelta, Unlock};

use crate::persistence::{SaveError, SaveSlot, STATS_KEY};

/// Stats that outlive a single run, stored as their own JSON record so a
/// run save and the lifetime record never invalidate each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifetimeRecord {
    pub lifetime_kills: u64,
    pub best_score: u64,
    /// Highest unlocked tier per achievement id.
    pub unlocked: HashMap<String, u32>,
}

/// Aggregates stat deltas for the current run and reports tier crossings.
#[derive(Debug, Default)]
pub struct StatsTracker {
    pub session: SessionStats,
    pub record: LifetimeRecord,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session on top of the lifetime record.
    pub fn begin_session(&mut self) {
        self.session = SessionStats {
            lifetime_kills: self.record.lifetime_kills,
            ..Default::default()
        };
    }

    /// Merge a delta and return any newly crossed achievement tiers. The
    /// returned unlocks are already applied to the lifetime record.
    pub fn apply(&mut self, delta: &StatDelta) -> Vec<Unlock> {
        merge(&mut self.session, delta);
        self.record.lifetime_kills = self.record.lifetime_kills.max(self.session.lifetime_kills);
        self.record.best_score = self.record.best_score.max(self.session.score);

        let unlocks = evaluate(&self.session, &self.record.unlocked);
        for u in &unlocks {
            let entry = self.record.unlocked.entry(u.id.clone()).or_insert(0);
            *entry = (*entry).max(u.tier);
        }
        unlocks
    }

    pub fn unlocked_tier(&self, id: &str) -> u32 {
        self.record.unlocked.get(id).copied().unwrap_or(0)
    }

    /// Load the lifetime record. A missing or unreadable record starts
    /// fresh rather than blocking play.
    pub fn load(&mut self, slot: &dyn SaveSlot) {
        match slot.read(STATS_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(record) => self.record = record,
                Err(e) => {
                    warn!("ignoring unreadable stats record: {e}");
                    self.record = LifetimeRecord::default();
                }
            },
            Ok(None) => {}
            Err(e) => warn!("stats record read failed: {e}"),
        }
        self.begin_session();
    }

    pub fn save(&self, slot: &mut dyn SaveSlot) -> Result<(), SaveError> {
        let json = serde_json::to_string(&self.record)?;
        slot.write(STATS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemorySlot;

    #[test]
    fn unlocks_persist_across_sessions() {
        let mut slot = MemorySlot::new();
        let mut tracker = StatsTracker::new();
        tracker.load(&slot);
        let unlocks = tracker.apply(&StatDelta {
            kills_added: 30,
            ..Default::default()
        });
        assert!(unlocks.iter().any(|u| u.id == "first_blood" && u.tier == 2));
        tracker.save(&mut slot).unwrap();

        let mut next = StatsTracker::new();
        next.load(&slot);
        assert_eq!(next.unlocked_tier("first_blood"), 2);
        assert_eq!(next.session.lifetime_kills, 30);
        // Session counters reset; crossing tier 1 again emits nothing.
        assert_eq!(next.session.kills, 0);
        let repeat = next.apply(&StatDelta {
            kills_added: 2,
            ..Default::default()
        });
        assert!(repeat.iter().all(|u| u.id != "first_blood"));
    }

    #[test]
    fn lifetime_kills_accumulate_toward_veteran() {
        let mut tracker = StatsTracker::new();
        tracker.record.lifetime_kills = 95;
        tracker.begin_session();
        let unlocks = tracker.apply(&StatDelta {
            kills_added: 5,
            ..Default::default()
        });
        assert!(unlocks.iter().any(|u| u.id == "veteran" && u.tier == 1));
    }

    #[test]
    fn corrupt_stats_record_starts_fresh() {
        let mut slot = MemorySlot::new();
        slot.write(STATS_KEY, "###").unwrap();
        let mut tracker = StatsTracker::new();
        tracker.load(&slot);
        assert_eq!(tracker.record.lifetime_kills, 0);
        assert!(tracker.record.unlocked.is_empty());
    }

    #[test]
    fn best_score_only_grows() {
        let mut tracker = StatsTracker::new();
        tracker.apply(&StatDelta {
            score: 5000,
            ..Default::default()
        });
        tracker.apply(&StatDelta {
            score: 300,
            ..Default::default()
        });
        assert_eq!(tracker.record.best_score, 5000);
    }
}
