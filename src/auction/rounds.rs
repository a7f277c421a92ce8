//! Round administration and slot availability.

use super::{load_manager, require_admin, AuctionService};
use crate::db::repo::{nominations, notifications, slots};
use crate::domain::{ManagerId, Slot};
use crate::engine::{self, RoundPlan};
use crate::error::AuctionError;
use crate::notify::messages;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Narrowing for [`AuctionService::open_slots`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotFilter {
    pub round: Option<i64>,
    /// Only slots whose nomination window contains this instant.
    pub nominatable_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDeletion {
    pub deleted: usize,
    /// Slots left in place because they are occupied or already closed.
    pub kept: usize,
}

impl AuctionService {
    /// Create a round of evenly spaced slots and schedule its announcements.
    pub async fn create_round(
        &self,
        actor: ManagerId,
        plan: &RoundPlan,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AuctionError> {
        plan.validate()?;
        let close_times = plan.close_times()?;

        let mut tx = self.repo.begin().await?;
        let admin = require_admin(&mut tx, actor).await?;
        if slots::round_exists(&mut tx, plan.round).await? {
            return Err(AuctionError::conflict(format!(
                "Round {} already exists.",
                plan.round
            )));
        }

        let mut created = Vec::with_capacity(close_times.len());
        for closes_at in close_times {
            let id = slots::insert(
                &mut tx,
                plan.round,
                closes_at,
                plan.nomination_opens_at,
                plan.nomination_closes_at,
            )
            .await?;
            created.push(Slot {
                id,
                round: plan.round,
                closes_at,
                nomination_opens_at: plan.nomination_opens_at,
                nomination_closes_at: plan.nomination_closes_at,
            });
        }

        let alert = self.settings.notification_alert_minutes;
        for notification in [
            messages::round_opened(
                plan.round,
                plan.nomination_opens_at,
                plan.nomination_closes_at,
            ),
            messages::round_nomination_closing(plan.round, plan.nomination_closes_at, alert),
            messages::round_auctions_closing(plan.round, plan.first_close_at, alert),
        ] {
            notifications::schedule(&mut tx, &notification, now).await?;
        }

        tx.commit().await?;
        info!(
            round = plan.round,
            slots = created.len(),
            "Round created by {}",
            admin
        );
        Ok(created)
    }

    /// Delete a round's open, unoccupied slots.
    ///
    /// Round announcements are retracted only when no slot of the round is
    /// left behind.
    pub async fn delete_round(
        &self,
        actor: ManagerId,
        round: i64,
        now: DateTime<Utc>,
    ) -> Result<RoundDeletion, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let admin = require_admin(&mut tx, actor).await?;
        let round_slots = slots::list(&mut tx, Some(round)).await?;
        if round_slots.is_empty() {
            return Err(AuctionError::not_found(format!("Round {}", round)));
        }

        let mut outcome = RoundDeletion {
            deleted: 0,
            kept: 0,
        };
        for slot in &round_slots {
            if slot.is_closed(now) || slots::is_occupied(&mut tx, slot.id).await? {
                outcome.kept += 1;
            } else if slots::delete(&mut tx, slot.id).await? {
                outcome.deleted += 1;
            }
        }

        if outcome.kept == 0 {
            notifications::retract_round(&mut tx, round).await?;
        }

        tx.commit().await?;
        info!(
            round,
            deleted = outcome.deleted,
            kept = outcome.kept,
            "Round slots deleted by {}",
            admin
        );
        Ok(outcome)
    }

    /// Unoccupied slots ordered by round and close time.
    pub async fn open_slots(&self, filter: SlotFilter) -> Result<Vec<Slot>, AuctionError> {
        let mut conn = self.repo.pool().acquire().await?;
        let mut open = slots::list_unoccupied(&mut conn, filter.round).await?;
        if let Some(at) = filter.nominatable_at {
            open.retain(|slot| slot.nomination_window_contains(at));
        }
        Ok(open)
    }

    /// Whether `manager` may make another nomination in `round` at `now`.
    pub async fn can_nominate(
        &self,
        manager: ManagerId,
        round: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AuctionError> {
        let mut conn = self.repo.pool().acquire().await?;
        load_manager(&mut conn, manager).await?;
        let made = nominations::count_by_nominator_in_round(&mut conn, manager, round).await?;
        let earliest = slots::earliest_close(&mut conn, round).await?;
        Ok(engine::can_nominate(made, earliest, now, &self.settings))
    }

    /// Open slots the manager could nominate into right now, grouped by round.
    pub async fn nominatable_slots(
        &self,
        manager: ManagerId,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<i64, Vec<Slot>>, AuctionError> {
        let open = self
            .open_slots(SlotFilter {
                round: None,
                nominatable_at: Some(now),
            })
            .await?;

        let mut allowed = BTreeMap::new();
        for (round, round_slots) in engine::group_by_round(open) {
            if self.can_nominate(manager, round, now).await? {
                allowed.insert(round, round_slots);
            }
        }
        Ok(allowed)
    }
}
