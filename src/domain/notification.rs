//! Outbound notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of lifecycle event a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PlayerNominated,
    AuctionWon,
    MatchPending,
    MatchRetracted,
    RoundOpened,
    RoundNominationClosingSoon,
    RoundAuctionsClosingSoon,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::PlayerNominated,
        EventKind::AuctionWon,
        EventKind::MatchPending,
        EventKind::MatchRetracted,
        EventKind::RoundOpened,
        EventKind::RoundNominationClosingSoon,
        EventKind::RoundAuctionsClosingSoon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PlayerNominated => "player_nominated",
            EventKind::AuctionWon => "auction_won",
            EventKind::MatchPending => "match_pending",
            EventKind::MatchRetracted => "match_retracted",
            EventKind::RoundOpened => "round_opened",
            EventKind::RoundNominationClosingSoon => "round_nomination_closing_soon",
            EventKind::RoundAuctionsClosingSoon => "round_auctions_closing_soon",
        }
    }

    /// Emoji shortcode shared by Slack and Discord.
    pub fn emoji(&self) -> &'static str {
        match self {
            EventKind::PlayerNominated => ":mega:",
            EventKind::AuctionWon => ":moneybag:",
            EventKind::MatchPending => ":stopwatch:",
            EventKind::MatchRetracted => ":no_entry_sign:",
            EventKind::RoundOpened => ":incoming_envelope:",
            EventKind::RoundNominationClosingSoon => ":envelope:",
            EventKind::RoundAuctionsClosingSoon => ":rotating_light:",
        }
    }

    /// Round events use the round number as subject; the rest a nomination id.
    pub fn is_round_event(&self) -> bool {
        matches!(
            self,
            EventKind::RoundOpened
                | EventKind::RoundNominationClosingSoon
                | EventKind::RoundAuctionsClosingSoon
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event kind: {}", s))
    }
}

/// A notification waiting in (or already delivered from) the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub kind: EventKind,
    /// Nomination id or round number, depending on `kind`.
    pub subject: Option<i64>,
    pub title: String,
    pub body: String,
    pub send_at: DateTime<Utc>,
    pub sent: bool,
}

/// A notification about to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: EventKind,
    pub subject: Option<i64>,
    pub title: String,
    pub body: String,
    pub send_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parses_every_variant() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("auction_lost".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_round_events() {
        assert!(EventKind::RoundOpened.is_round_event());
        assert!(EventKind::RoundAuctionsClosingSoon.is_round_event());
        assert!(!EventKind::MatchPending.is_round_event());
    }
}
