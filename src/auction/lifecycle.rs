//! Nomination lifecycle: nominate, bid, close, match, admin corrections.

use super::{load_manager, load_nomination, load_player, load_slot, require_admin, AuctionService};
use crate::db::repo::{managers, nominations, notifications, players, slots};
use crate::domain::{
    Bid, EventKind, ManagerId, Nomination, NominationId, NominationState, Player, PlayerId, SlotId,
};
use crate::engine::{self, bids, CloseDecision};
use crate::error::AuctionError;
use crate::notify::messages;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use tracing::info;

/// What the sweep did with a closed nomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CloseOutcome {
    Resolved {
        winner: ManagerId,
        value: i64,
        tiebreak: bool,
    },
    PendingMatch {
        matcher: ManagerId,
        deadline: DateTime<Utc>,
    },
}

impl AuctionService {
    /// Put a free agent up for auction in an open slot with the nominator's
    /// opening bid. Every registered manager gets a bid row.
    pub async fn nominate(
        &self,
        actor: ManagerId,
        player_id: PlayerId,
        slot_id: SlotId,
        bid_value: i64,
        now: DateTime<Utc>,
    ) -> Result<Nomination, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let nominator = load_manager(&mut tx, actor).await?;
        let player = load_player(&mut tx, player_id).await?;
        let slot = load_slot(&mut tx, slot_id).await?;

        if !player.is_free_agent() {
            return Err(AuctionError::validation(format!(
                "{} is not a free agent.",
                player
            )));
        }
        if nominations::find_by_player(&mut tx, player_id).await?.is_some() {
            return Err(AuctionError::conflict(format!(
                "{} has already been nominated.",
                player
            )));
        }
        if slots::is_occupied(&mut tx, slot_id).await? {
            return Err(AuctionError::conflict("Slot is already taken."));
        }
        if !slot.nomination_window_contains(now) {
            return Err(AuctionError::state(
                "Nominations are not open for this slot.",
            ));
        }

        let made = nominations::count_by_nominator_in_round(&mut tx, actor, slot.round).await?;
        let earliest = slots::earliest_close(&mut tx, slot.round).await?;
        if !engine::can_nominate(made, earliest, now, &self.settings) {
            return Err(AuctionError::state(format!(
                "No nomination slots currently available for {}.",
                nominator
            )));
        }

        let manager_ids = managers::ids(&mut tx).await?;
        let seeded = bids::seed(&manager_ids, actor, bid_value, self.settings.minimum_bid)?;

        let id = nominations::insert(&mut tx, player_id, slot_id, actor, now)
            .await
            .map_err(|e| AuctionError::from_unique(e, "Player or slot is already nominated."))?;
        nominations::insert_bids(&mut tx, id, &seeded, now).await?;

        let mention = self.emitter.mention(&nominator);
        notifications::schedule(
            &mut tx,
            &messages::player_nominated(id, &mention, &player, slot.round, now),
            now,
        )
        .await?;

        let nomination = load_nomination(&mut tx, id).await?;
        tx.commit().await?;

        info!(
            nomination_id = %id,
            nominator = %actor,
            round = slot.round,
            "Nomination of {} created by {}",
            player,
            nominator
        );
        Ok(nomination)
    }

    /// Set or clear the actor's bid while the auction is open.
    ///
    /// The closed-slot check runs inside the write transaction, so a bid
    /// racing the sweep either lands before the close or is rejected.
    pub async fn place_bid(
        &self,
        actor: ManagerId,
        nomination_id: NominationId,
        value: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Bid, AuctionError> {
        let mut tx = self.repo.begin().await?;
        load_manager(&mut tx, actor).await?;
        let nomination = load_nomination(&mut tx, nomination_id).await?;
        let slot = load_slot(&mut tx, nomination.slot_id).await?;
        let player = load_player(&mut tx, nomination.player_id).await?;

        if nomination.state == NominationState::PendingMatch
            && player.match_right_holder == Some(actor)
        {
            return Err(AuctionError::state(
                "Use the match decision to claim this player.",
            ));
        }
        if nomination.state != NominationState::Open || slot.is_closed(now) {
            return Err(AuctionError::state("Auction has closed."));
        }

        bids::validate_bid(nomination.nominator_id, actor, value, self.settings.minimum_bid)?;
        nominations::upsert_bid(&mut tx, nomination_id, actor, value, now).await?;
        tx.commit().await?;

        info!(nomination_id = %nomination_id, manager = %actor, value = ?value, "Bid updated");
        Ok(Bid::new(actor, value))
    }

    /// Settle an open nomination whose slot has closed.
    pub async fn close(
        &self,
        nomination_id: NominationId,
        now: DateTime<Utc>,
    ) -> Result<CloseOutcome, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let nomination = load_nomination(&mut tx, nomination_id).await?;
        if nomination.state != NominationState::Open {
            return Err(AuctionError::state(format!(
                "Nomination {} is already {}.",
                nomination_id, nomination.state
            )));
        }
        let slot = load_slot(&mut tx, nomination.slot_id).await?;
        if !slot.is_closed(now) {
            return Err(AuctionError::state("Auction has not closed yet."));
        }
        let player = load_player(&mut tx, nomination.player_id).await?;
        if let Some(owner) = player.owner {
            return Err(AuctionError::state(format!(
                "{} is already owned by manager {}.",
                player, owner
            )));
        }
        let ledger = nominations::bids_for(&mut tx, nomination_id).await?;
        let order = managers::tiebreaker_order(&mut tx).await?;

        let decision = engine::decide_close(&ledger, &order, player.match_right_holder)
            .ok_or_else(|| {
                AuctionError::state(format!("Nomination {} has no bids to settle.", nomination_id))
            })?;

        let outcome = match decision {
            CloseDecision::Resolve(award) => {
                let demotion = engine::demotion_for(&award, &order);
                managers::apply_rank_updates(&mut tx, &demotion).await?;
                self.award(&mut tx, &nomination, &player, award.winner, award.value, now)
                    .await?;
                CloseOutcome::Resolved {
                    winner: award.winner,
                    value: award.value,
                    tiebreak: award.decided_by_tiebreak(),
                }
            }
            CloseDecision::AwaitMatch { matcher, leader } => {
                let deadline = self
                    .await_match(&mut tx, nomination_id, &player, matcher, slot.closes_at, now)
                    .await?;
                info!(
                    nomination_id = %nomination_id,
                    matcher = %matcher,
                    leader = %leader.winner,
                    value = leader.value,
                    "Nomination pending match until {}",
                    deadline
                );
                CloseOutcome::PendingMatch { matcher, deadline }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// The match-right holder accepts (claims the player at the matched
    /// price) or declines (the rest of the field is settled without them).
    pub async fn decide_match(
        &self,
        actor: ManagerId,
        nomination_id: NominationId,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<Nomination, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let nomination = load_nomination(&mut tx, nomination_id).await?;
        let player = load_player(&mut tx, nomination.player_id).await?;

        if player.match_right_holder != Some(actor) {
            return Err(AuctionError::permission(
                "Only the match-right holder can decide this match.",
            ));
        }
        if nomination.state != NominationState::PendingMatch {
            return Err(AuctionError::state(format!(
                "Nomination {} is not pending a match.",
                nomination_id
            )));
        }

        let ledger = nominations::bids_for(&mut tx, nomination_id).await?;
        let no_bids = || AuctionError::state("There are no bids to match.");

        if accept {
            let top = bids::top_value(&ledger, Some(actor)).ok_or_else(no_bids)?;
            let value =
                engine::match_value(top, player.hometown_discount, self.settings.minimum_bid);
            nominations::upsert_bid(&mut tx, nomination_id, actor, Some(value), now).await?;
            self.award(&mut tx, &nomination, &player, actor, value, now)
                .await?;
            info!(nomination_id = %nomination_id, matcher = %actor, value, "Match accepted");
        } else {
            let order = managers::tiebreaker_order(&mut tx).await?;
            let award = engine::compute_award(&ledger, &order, Some(actor)).ok_or_else(no_bids)?;
            let demotion = engine::demotion_for(&award, &order);
            managers::apply_rank_updates(&mut tx, &demotion).await?;
            self.award(&mut tx, &nomination, &player, award.winner, award.value, now)
                .await?;
            info!(nomination_id = %nomination_id, matcher = %actor, "Match declined");
        }

        notifications::retract(&mut tx, EventKind::MatchPending, nomination_id.as_i64()).await?;

        let resolved = load_nomination(&mut tx, nomination_id).await?;
        tx.commit().await?;
        Ok(resolved)
    }

    /// Admin correction: move the nomination to `new_slot` and/or set its owner.
    ///
    /// `Some(owner)` resolves the nomination to that manager. `None` on a
    /// resolved nomination returns the player to free agency and reopens the
    /// nomination so the sweep settles it again.
    pub async fn admin_edit(
        &self,
        actor: ManagerId,
        nomination_id: NominationId,
        new_slot: SlotId,
        new_owner: Option<ManagerId>,
        now: DateTime<Utc>,
    ) -> Result<Nomination, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let admin = require_admin(&mut tx, actor).await?;
        let nomination = load_nomination(&mut tx, nomination_id).await?;
        let player = load_player(&mut tx, nomination.player_id).await?;
        let slot = load_slot(&mut tx, new_slot).await?;

        let slot_changed = new_slot != nomination.slot_id;
        if slot_changed {
            if slots::is_occupied(&mut tx, new_slot).await? {
                return Err(AuctionError::conflict("Slot is already taken."));
            }
            nominations::set_slot(&mut tx, nomination_id, new_slot).await?;
        }

        let owner_changed = match new_owner {
            Some(owner) => {
                let manager = load_manager(&mut tx, owner).await?;
                let changed = nomination.state != NominationState::Resolved
                    || nomination.winner_id != Some(owner);
                if changed {
                    let ledger = nominations::bids_for(&mut tx, nomination_id).await?;
                    let value = ledger
                        .iter()
                        .find(|b| b.manager_id == owner)
                        .and_then(|b| b.value)
                        .or(nomination.winning_value)
                        .or_else(|| bids::top_value(&ledger, None))
                        .unwrap_or(self.settings.minimum_bid);
                    players::unassign(&mut tx, player.id).await?;
                    players::set_owner(&mut tx, player.id, owner).await?;
                    nominations::mark_resolved(&mut tx, nomination_id, owner, value, now).await?;
                    info!(
                        nomination_id = %nomination_id,
                        owner = %owner,
                        "Owner of {} set to {} by {}",
                        player,
                        manager,
                        admin
                    );
                }
                changed
            }
            None if nomination.state == NominationState::Resolved => {
                players::unassign(&mut tx, player.id).await?;
                nominations::reopen(&mut tx, nomination_id).await?;
                info!(nomination_id = %nomination_id, "{} unassigned by {}", player, admin);
                true
            }
            None => false,
        };

        if slot_changed || owner_changed {
            self.withdraw_match(&mut tx, nomination_id, &player, now).await?;
        }

        let mut edited = load_nomination(&mut tx, nomination_id).await?;
        if edited.state == NominationState::PendingMatch && (slot_changed || owner_changed) {
            if let Some(matcher) = player.match_right_holder {
                self.await_match(&mut tx, nomination_id, &player, matcher, slot.closes_at, now)
                    .await?;
                edited = load_nomination(&mut tx, nomination_id).await?;
            }
        }

        tx.commit().await?;
        info!(nomination_id = %nomination_id, "Nomination updated by {}", admin);
        Ok(edited)
    }

    /// Admin removal. A won player goes back to free agency.
    pub async fn admin_delete(
        &self,
        actor: ManagerId,
        nomination_id: NominationId,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionError> {
        let mut tx = self.repo.begin().await?;
        let admin = require_admin(&mut tx, actor).await?;
        let nomination = load_nomination(&mut tx, nomination_id).await?;
        let player = load_player(&mut tx, nomination.player_id).await?;

        self.withdraw_match(&mut tx, nomination_id, &player, now).await?;
        for kind in [EventKind::PlayerNominated, EventKind::AuctionWon] {
            notifications::retract(&mut tx, kind, nomination_id.as_i64()).await?;
        }

        if nomination.state == NominationState::Resolved {
            players::unassign(&mut tx, player.id).await?;
        }
        nominations::delete(&mut tx, nomination_id).await?;
        tx.commit().await?;

        info!(nomination_id = %nomination_id, "Nomination of {} deleted by {}", player, admin);
        Ok(())
    }

    /// Resolve to `winner` and announce it.
    async fn award(
        &self,
        conn: &mut SqliteConnection,
        nomination: &Nomination,
        player: &Player,
        winner: ManagerId,
        value: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionError> {
        players::set_owner(conn, player.id, winner).await?;
        nominations::mark_resolved(conn, nomination.id, winner, value, now).await?;

        let manager = load_manager(conn, winner).await?;
        let mention = self.emitter.mention(&manager);
        notifications::schedule(
            conn,
            &messages::auction_won(nomination.id, &mention, player, value, now),
            now,
        )
        .await?;

        info!(
            nomination_id = %nomination.id,
            winner = %winner,
            value,
            "{} won by {}",
            player,
            manager
        );
        Ok(())
    }

    /// Move to PendingMatch and tell the holder how long they have.
    async fn await_match(
        &self,
        conn: &mut SqliteConnection,
        nomination_id: NominationId,
        player: &Player,
        matcher: ManagerId,
        closes_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, AuctionError> {
        let deadline = closes_at + self.settings.match_window();
        nominations::mark_pending(conn, nomination_id, deadline).await?;

        let holder = load_manager(conn, matcher).await?;
        let mention = self.emitter.mention(&holder);
        notifications::schedule(
            conn,
            &messages::match_pending(
                nomination_id,
                &mention,
                player,
                self.settings.match_time_hours,
                closes_at,
            ),
            now,
        )
        .await?;
        Ok(deadline)
    }

    /// Drop any unsent match notification. One that already went out, or is
    /// being sent right now, is followed by a retraction notice.
    async fn withdraw_match(
        &self,
        conn: &mut SqliteConnection,
        nomination_id: NominationId,
        player: &Player,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionError> {
        let subject = nomination_id.as_i64();
        let went_out = notifications::went_out(conn, EventKind::MatchPending, subject).await?;
        notifications::retract(conn, EventKind::MatchPending, subject).await?;
        if went_out {
            notifications::retract(conn, EventKind::MatchRetracted, subject).await?;
            notifications::schedule(conn, &messages::match_retracted(nomination_id, player, now), now)
                .await?;
        }
        Ok(())
    }
}
