//! League membership, player rights and the tiebreaker order.

use super::{load_manager, load_player, require_admin, AuctionService};
use crate::db::repo::{managers, nominations, players};
use crate::domain::{Manager, ManagerId, NewManager, NewPlayer, NominationState, Player, PlayerId};
use crate::error::AuctionError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::sqlite::SqliteConnection;
use std::collections::BTreeMap;
use tracing::info;

/// Admin changes to a player's rights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEdit {
    pub owner: Option<ManagerId>,
    pub match_right_holder: Option<ManagerId>,
    #[serde(default)]
    pub hometown_discount: bool,
}

async fn check_manager_ref(
    conn: &mut SqliteConnection,
    manager: Option<ManagerId>,
) -> Result<(), AuctionError> {
    if let Some(id) = manager {
        load_manager(conn, id).await?;
    }
    Ok(())
}

impl AuctionService {
    /// Register a manager. They get an empty bid on every existing nomination.
    pub async fn register_manager(
        &self,
        new: &NewManager,
        now: DateTime<Utc>,
    ) -> Result<Manager, AuctionError> {
        if new.username.trim().is_empty() {
            return Err(AuctionError::validation("Username is required."));
        }
        if new.team_name.trim().is_empty() {
            return Err(AuctionError::validation("Team name is required."));
        }
        if matches!(new.tiebreaker_rank, Some(rank) if rank <= 0) {
            return Err(AuctionError::validation(
                "Tiebreaker order values must be positive integers.",
            ));
        }

        let mut tx = self.repo.begin().await?;
        if let Some(rank) = new.tiebreaker_rank {
            let order = managers::tiebreaker_order(&mut tx).await?;
            if order.ranked().iter().any(|&(_, r)| r == rank) {
                return Err(AuctionError::conflict(
                    "Tiebreaker order values must be unique.",
                ));
            }
        }

        let id = managers::insert(&mut tx, new, now).await.map_err(|e| {
            AuctionError::from_unique(
                e,
                format!("User {} is already registered.", new.username),
            )
        })?;
        let manager = load_manager(&mut tx, id).await?;
        tx.commit().await?;

        info!(manager_id = %id, "Registered manager {}", manager);
        Ok(manager)
    }

    pub async fn add_player(
        &self,
        actor: ManagerId,
        new: &NewPlayer,
    ) -> Result<Player, AuctionError> {
        if new.name.trim().is_empty() {
            return Err(AuctionError::validation("Player name is required."));
        }
        if new.external_id.trim().is_empty() {
            return Err(AuctionError::validation("External id is required."));
        }

        let mut tx = self.repo.begin().await?;
        let admin = require_admin(&mut tx, actor).await?;
        check_manager_ref(&mut tx, new.match_right_holder).await?;

        let id = players::insert(&mut tx, new).await.map_err(|e| {
            AuctionError::from_unique(
                e,
                format!("Player {} already exists.", new.external_id),
            )
        })?;
        let player = load_player(&mut tx, id).await?;
        tx.commit().await?;

        info!(player_id = %id, "Player {} added by {}", player, admin);
        Ok(player)
    }

    /// Admin edit of owner and match rights. A changed owner starts with no
    /// contract.
    pub async fn admin_edit_player(
        &self,
        actor: ManagerId,
        player_id: PlayerId,
        edit: &PlayerEdit,
    ) -> Result<Player, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let admin = require_admin(&mut tx, actor).await?;
        let player = load_player(&mut tx, player_id).await?;
        check_manager_ref(&mut tx, edit.owner).await?;
        check_manager_ref(&mut tx, edit.match_right_holder).await?;

        if edit.owner != player.owner {
            players::unassign(&mut tx, player_id).await?;
            if let Some(owner) = edit.owner {
                players::set_owner(&mut tx, player_id, owner).await?;
            }
        }
        players::set_rights(
            &mut tx,
            player_id,
            edit.match_right_holder,
            edit.hometown_discount,
        )
        .await?;

        let updated = load_player(&mut tx, player_id).await?;
        tx.commit().await?;

        info!(player_id = %player_id, "Player {} updated by {}", updated, admin);
        Ok(updated)
    }

    /// Put a won player under contract.
    pub async fn sign_player(
        &self,
        actor: ManagerId,
        player_id: PlayerId,
        contract_length: i64,
        salary: i64,
    ) -> Result<Player, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let manager = load_manager(&mut tx, actor).await?;
        let player = load_player(&mut tx, player_id).await?;

        let Some(owner) = player.owner else {
            return Err(AuctionError::state(format!("{} has not been won.", player)));
        };
        if owner != actor && !manager.is_league_manager {
            return Err(AuctionError::permission(
                "Only the owner can sign this player.",
            ));
        }
        let resolved = nominations::find_by_player(&mut tx, player_id)
            .await?
            .is_some_and(|n| n.state == NominationState::Resolved);
        if !resolved {
            return Err(AuctionError::state(format!(
                "The auction for {} has not been resolved.",
                player
            )));
        }
        if player.contract_length.is_some() {
            return Err(AuctionError::state(format!(
                "{} has already been signed.",
                player
            )));
        }

        if contract_length < 1 {
            return Err(AuctionError::validation(
                "Contract length must be at least one year.",
            ));
        }
        if salary < 0 {
            return Err(AuctionError::validation("Salary must not be negative."));
        }
        let total = salary
            .checked_mul(contract_length)
            .ok_or_else(|| AuctionError::validation("Total contract salary is too large."))?;
        if let Some(&minimum) = self.settings.minimum_total_salary.get(&contract_length) {
            if total < minimum {
                return Err(AuctionError::validation(format!(
                    "Minimum total salary for a {}-year contract is ${}.",
                    contract_length, minimum
                )));
            }
        }

        players::sign(&mut tx, player_id, contract_length, salary).await?;
        let signed = load_player(&mut tx, player_id).await?;
        tx.commit().await?;

        info!(
            player_id = %player_id,
            contract_length,
            salary,
            "{} signed by {}",
            signed,
            manager
        );
        Ok(signed)
    }

    /// Apply a batch of rank edits atomically and return the new order.
    pub async fn tiebreaker_reorder(
        &self,
        actor: ManagerId,
        edits: &BTreeMap<ManagerId, i64>,
    ) -> Result<Vec<Manager>, AuctionError> {
        let mut tx = self.repo.begin().await?;
        let admin = require_admin(&mut tx, actor).await?;

        let order = managers::tiebreaker_order(&mut tx).await?;
        let updates = order.reorder(edits)?;
        managers::apply_rank_updates(&mut tx, &updates)
            .await
            .map_err(|e| AuctionError::from_unique(e, "Tiebreaker order values must be unique."))?;

        let all = managers::list(&mut tx).await?;
        tx.commit().await?;

        info!(changed = updates.len(), "Tiebreaker order updated by {}", admin);
        Ok(all)
    }
}
