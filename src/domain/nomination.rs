use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{ManagerId, NominationId, PlayerId, SlotId};

/// Lifecycle state of a nomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NominationState {
    /// Bidding is (or was, until the sweep reaches it) open.
    Open,
    /// Closed with a leader, waiting on the match-right holder.
    PendingMatch,
    /// Terminal: a winner owns the player.
    Resolved,
}

impl NominationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NominationState::Open => "open",
            NominationState::PendingMatch => "pending_match",
            NominationState::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for NominationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NominationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(NominationState::Open),
            "pending_match" => Ok(NominationState::PendingMatch),
            "resolved" => Ok(NominationState::Resolved),
            other => Err(format!("unknown nomination state: {}", other)),
        }
    }
}

/// Binding of one player to one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nomination {
    pub id: NominationId,
    pub player_id: PlayerId,
    pub slot_id: SlotId,
    pub nominator_id: ManagerId,
    pub state: NominationState,
    pub winner_id: Option<ManagerId>,
    pub winning_value: Option<i64>,
    /// Set while pending a match decision.
    pub match_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One manager's bid on a nomination; `None` means no current bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub manager_id: ManagerId,
    pub value: Option<i64>,
}

impl Bid {
    pub fn new(manager_id: ManagerId, value: Option<i64>) -> Self {
        Self { manager_id, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_string_round_trip() {
        for state in [
            NominationState::Open,
            NominationState::PendingMatch,
            NominationState::Resolved,
        ] {
            assert_eq!(state.as_str().parse::<NominationState>().unwrap(), state);
        }
        assert!("won".parse::<NominationState>().is_err());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&NominationState::PendingMatch).unwrap();
        assert_eq!(json, "\"pending_match\"");
    }
}
