use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SlotId;

/// A discrete auction window belonging to a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub round: i64,
    pub closes_at: DateTime<Utc>,
    pub nomination_opens_at: DateTime<Utc>,
    pub nomination_closes_at: DateTime<Utc>,
}

impl Slot {
    /// Bidding stays open up to and including `closes_at`.
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.closes_at
    }

    pub fn nomination_window_contains(&self, now: DateTime<Utc>) -> bool {
        self.nomination_opens_at <= now && now <= self.nomination_closes_at
    }
}
