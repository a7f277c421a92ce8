//! Slot and round scheduling rules.

use crate::config::AuctionSettings;
use crate::domain::Slot;
use crate::error::AuctionError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partition slots by round, each round ordered by close time ascending.
pub fn group_by_round(slots: impl IntoIterator<Item = Slot>) -> BTreeMap<i64, Vec<Slot>> {
    let mut rounds: BTreeMap<i64, Vec<Slot>> = BTreeMap::new();
    for slot in slots {
        rounds.entry(slot.round).or_default().push(slot);
    }
    for slots in rounds.values_mut() {
        slots.sort_by_key(|s| (s.closes_at, s.id));
    }
    rounds
}

/// Whether a manager with `nominations_in_round` nominations may add another.
///
/// The normal cap applies until `urgent_threshold` before the round's
/// earliest close, after which the urgent cap applies so slots don't go unused.
pub fn can_nominate(
    nominations_in_round: i64,
    earliest_close: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    settings: &AuctionSettings,
) -> bool {
    if nominations_in_round < settings.max_nominations_normal {
        return true;
    }
    match earliest_close {
        Some(close) => {
            nominations_in_round < settings.max_nominations_urgent
                && now >= close - settings.urgent_threshold()
        }
        None => false,
    }
}

/// Most slots a single round may hold.
pub const MAX_SLOTS_PER_ROUND: i64 = 500;
/// Widest gap allowed between consecutive slot closes: one week.
pub const MAX_SPACING_MINUTES: i64 = 7 * 24 * 60;

/// Admin request describing a new round of evenly spaced slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundPlan {
    pub round: i64,
    pub first_close_at: DateTime<Utc>,
    pub num_slots: i64,
    pub spacing_minutes: i64,
    pub nomination_opens_at: DateTime<Utc>,
    pub nomination_closes_at: DateTime<Utc>,
}

impl RoundPlan {
    pub fn validate(&self) -> Result<(), AuctionError> {
        if self.num_slots <= 0 {
            return Err(AuctionError::validation(
                "Number of slots must be a positive integer.",
            ));
        }
        if self.num_slots > MAX_SLOTS_PER_ROUND {
            return Err(AuctionError::validation(format!(
                "A round can hold at most {} slots.",
                MAX_SLOTS_PER_ROUND
            )));
        }
        if self.spacing_minutes < 0 {
            return Err(AuctionError::validation(
                "Time between slots must not be negative.",
            ));
        }
        if self.spacing_minutes > MAX_SPACING_MINUTES {
            return Err(AuctionError::validation(format!(
                "Time between slots must be at most {} minutes.",
                MAX_SPACING_MINUTES
            )));
        }
        if self.nomination_opens_at >= self.nomination_closes_at {
            return Err(AuctionError::validation(
                "Nomination period must open before it closes.",
            ));
        }
        if self.nomination_closes_at > self.first_close_at {
            return Err(AuctionError::validation(
                "Nomination period must close before the first auction closes.",
            ));
        }
        Ok(())
    }

    /// Close time of every slot. Call after [`RoundPlan::validate`].
    pub fn close_times(&self) -> Result<Vec<DateTime<Utc>>, AuctionError> {
        (0..self.num_slots)
            .map(|i| {
                self.spacing_minutes
                    .checked_mul(i)
                    .and_then(Duration::try_minutes)
                    .and_then(|offset| self.first_close_at.checked_add_signed(offset))
                    .ok_or_else(|| AuctionError::validation("Slot close time is out of range."))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SlotId;
    use chrono::TimeZone;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, hour, 0, 0).unwrap()
    }

    fn slot(id: i64, round: i64, closes_at: DateTime<Utc>) -> Slot {
        Slot {
            id: SlotId::new(id),
            round,
            closes_at,
            nomination_opens_at: closes_at - Duration::days(3),
            nomination_closes_at: closes_at - Duration::days(1),
        }
    }

    #[test]
    fn test_group_by_round_sorts_by_close() {
        let rounds = group_by_round(vec![
            slot(1, 2, t(12)),
            slot(2, 1, t(18)),
            slot(3, 1, t(14)),
            slot(4, 2, t(10)),
        ]);
        let keys: Vec<_> = rounds.keys().copied().collect();
        assert_eq!(keys, vec![1, 2]);
        let round_one: Vec<_> = rounds[&1].iter().map(|s| s.id.as_i64()).collect();
        assert_eq!(round_one, vec![3, 2]);
        let round_two: Vec<_> = rounds[&2].iter().map(|s| s.id.as_i64()).collect();
        assert_eq!(round_two, vec![4, 1]);
    }

    #[test]
    fn test_can_nominate_under_normal_cap() {
        let settings = AuctionSettings::default();
        assert!(can_nominate(0, Some(t(20)), t(0), &settings));
        assert!(can_nominate(1, Some(t(20)), t(0), &settings));
    }

    #[test]
    fn test_can_nominate_urgent_window() {
        let settings = AuctionSettings {
            urgent_threshold_hours: 6,
            ..AuctionSettings::default()
        };
        // normal cap 2 reached, urgent cap 3
        assert!(!can_nominate(2, Some(t(20)), t(13), &settings));
        assert!(can_nominate(2, Some(t(20)), t(14), &settings));
        assert!(!can_nominate(3, Some(t(20)), t(19), &settings));
    }

    #[test]
    fn test_can_nominate_without_slots() {
        let settings = AuctionSettings::default();
        assert!(!can_nominate(2, None, t(0), &settings));
    }

    #[test]
    fn test_round_plan_close_times() {
        let plan = RoundPlan {
            round: 1,
            first_close_at: t(12),
            num_slots: 3,
            spacing_minutes: 30,
            nomination_opens_at: t(0),
            nomination_closes_at: t(6),
        };
        plan.validate().unwrap();
        let times = plan.close_times().unwrap();
        assert_eq!(times.len(), 3);
        assert_eq!(times[2], t(13));
    }

    #[test]
    fn test_round_plan_rejects_window_after_close() {
        let plan = RoundPlan {
            round: 1,
            first_close_at: t(12),
            num_slots: 1,
            spacing_minutes: 0,
            nomination_opens_at: t(0),
            nomination_closes_at: t(13),
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_round_plan_rejects_oversized_rounds() {
        let base = RoundPlan {
            round: 1,
            first_close_at: t(12),
            num_slots: 3,
            spacing_minutes: 30,
            nomination_opens_at: t(0),
            nomination_closes_at: t(6),
        };

        let wide = RoundPlan {
            spacing_minutes: i64::MAX / 100,
            ..base.clone()
        };
        assert!(wide.validate().is_err());
        assert!(wide.close_times().is_err());

        let crowded = RoundPlan {
            num_slots: i64::MAX,
            ..base.clone()
        };
        assert!(crowded.validate().is_err());

        let edge = RoundPlan {
            num_slots: MAX_SLOTS_PER_ROUND,
            spacing_minutes: MAX_SPACING_MINUTES,
            ..base
        };
        edge.validate().unwrap();
        assert_eq!(edge.close_times().unwrap().len(), MAX_SLOTS_PER_ROUND as usize);
    }
}
