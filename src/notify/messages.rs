//! Notification text for each lifecycle event.
//!
//! Titles are plain text; emitters add emoji and platform markup at send
//! time. Mentions are resolved by the caller through
//! [`NotificationEmitter::mention`](super::NotificationEmitter::mention) so
//! bodies are stored exactly as they will be posted.

use crate::domain::{EventKind, NewNotification, NominationId, Player};
use chrono::{DateTime, Duration, Utc};

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d @ %H:%M UTC").to_string()
}

pub fn round_opened(
    round: i64,
    opens_at: DateTime<Utc>,
    closes_at: DateTime<Utc>,
) -> NewNotification {
    NewNotification {
        kind: EventKind::RoundOpened,
        subject: Some(round),
        title: format!("Round {} nomination period has begun!", round),
        body: format!(
            "Round {} nomination period has begun and will last until {}. \
             Make your nominations for this round now!",
            round,
            stamp(closes_at)
        ),
        send_at: opens_at,
    }
}

pub fn round_nomination_closing(
    round: i64,
    closes_at: DateTime<Utc>,
    alert_minutes: i64,
) -> NewNotification {
    NewNotification {
        kind: EventKind::RoundNominationClosingSoon,
        subject: Some(round),
        title: format!(
            "Round {} nomination period ends in {} minutes!",
            round, alert_minutes
        ),
        body: format!(
            "Round {} nomination period ends in {} minutes. If you have not made \
             your round {} nominations, make them by {}.",
            round,
            alert_minutes,
            round,
            stamp(closes_at)
        ),
        send_at: closes_at - Duration::minutes(alert_minutes),
    }
}

pub fn round_auctions_closing(
    round: i64,
    first_close_at: DateTime<Utc>,
    alert_minutes: i64,
) -> NewNotification {
    NewNotification {
        kind: EventKind::RoundAuctionsClosingSoon,
        subject: Some(round),
        title: format!("Round {} auctions close in {} minutes!", round, alert_minutes),
        body: format!(
            "Round {} auctions will start closing in {} minutes. Get your bids in \
             and make your final adjustments before the clock runs out!",
            round, alert_minutes
        ),
        send_at: first_close_at - Duration::minutes(alert_minutes),
    }
}

pub fn player_nominated(
    nomination: NominationId,
    nominator: &str,
    player: &Player,
    round: i64,
    now: DateTime<Utc>,
) -> NewNotification {
    NewNotification {
        kind: EventKind::PlayerNominated,
        subject: Some(nomination.as_i64()),
        title: "A player has been nominated!".to_string(),
        body: format!("{} has nominated {} in round {}.", nominator, player, round),
        send_at: now,
    }
}

pub fn auction_won(
    nomination: NominationId,
    winner: &str,
    player: &Player,
    value: i64,
    now: DateTime<Utc>,
) -> NewNotification {
    NewNotification {
        kind: EventKind::AuctionWon,
        subject: Some(nomination.as_i64()),
        title: "An auction has been won!".to_string(),
        body: format!(
            "{} has won the auction for {} with a bid of ${}!",
            winner, player, value
        ),
        send_at: now,
    }
}

pub fn match_pending(
    nomination: NominationId,
    matcher: &str,
    player: &Player,
    match_time_hours: i64,
    send_at: DateTime<Utc>,
) -> NewNotification {
    NewNotification {
        kind: EventKind::MatchPending,
        subject: Some(nomination.as_i64()),
        title: "An auction has closed and is pending a match!".to_string(),
        body: format!(
            "{} has {} hours to accept or decline to match the highest bid for {}.",
            matcher, match_time_hours, player
        ),
        send_at,
    }
}

pub fn match_retracted(
    nomination: NominationId,
    player: &Player,
    now: DateTime<Utc>,
) -> NewNotification {
    NewNotification {
        kind: EventKind::MatchRetracted,
        subject: Some(nomination.as_i64()),
        title: "A pending match has been withdrawn.".to_string(),
        body: format!(
            "The match decision previously announced for {} no longer applies.",
            player
        ),
        send_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerId;
    use chrono::TimeZone;

    fn player() -> Player {
        Player {
            id: PlayerId::new(1),
            external_id: "x1".to_string(),
            name: "Sam Example".to_string(),
            team: "BOS".to_string(),
            position: "SS".to_string(),
            hometown_discount: false,
            owner: None,
            match_right_holder: None,
            contract_length: None,
            salary: None,
        }
    }

    #[test]
    fn test_round_alerts_lead_their_deadlines() {
        let close = Utc.with_ymd_and_hms(2026, 4, 2, 18, 0, 0).unwrap();
        let n = round_nomination_closing(3, close, 120);
        assert_eq!(n.send_at, close - Duration::hours(2));
        assert_eq!(n.subject, Some(3));
        assert_eq!(n.title, "Round 3 nomination period ends in 120 minutes!");
        assert!(n.body.contains("2026-04-02 @ 18:00 UTC"));

        let a = round_auctions_closing(3, close, 30);
        assert_eq!(a.send_at, close - Duration::minutes(30));
    }

    #[test]
    fn test_auction_won_body() {
        let now = Utc.with_ymd_and_hms(2026, 4, 2, 18, 0, 0).unwrap();
        let n = auction_won(NominationId::new(9), "@alice", &player(), 45, now);
        assert_eq!(n.kind, EventKind::AuctionWon);
        assert_eq!(n.subject, Some(9));
        assert_eq!(
            n.body,
            "@alice has won the auction for Sam Example (SS, BOS) with a bid of $45!"
        );
    }
}
