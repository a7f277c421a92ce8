//! Transactional auction commands.
//!
//! Every command takes the acting manager and the current time explicitly,
//! runs in a single transaction, and writes the notifications it causes to
//! the outbox in that same transaction.

use crate::config::AuctionSettings;
use crate::db::repo::{managers, nominations, players, slots};
use crate::db::Repository;
use crate::domain::{Manager, ManagerId, Nomination, NominationId, Player, PlayerId, Slot, SlotId};
use crate::error::AuctionError;
use crate::notify::NotificationEmitter;
use sqlx::sqlite::SqliteConnection;
use std::sync::Arc;

pub mod league;
pub mod lifecycle;
pub mod rounds;
pub mod sweep;

pub use league::PlayerEdit;
pub use lifecycle::CloseOutcome;
pub use rounds::{RoundDeletion, SlotFilter};
pub use sweep::{run_settlement_sweep, spawn_sweep_loop};

#[derive(Clone)]
pub struct AuctionService {
    repo: Arc<Repository>,
    settings: AuctionSettings,
    emitter: Arc<dyn NotificationEmitter>,
}

impl AuctionService {
    pub fn new(
        repo: Arc<Repository>,
        settings: AuctionSettings,
        emitter: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            repo,
            settings,
            emitter,
        }
    }

    pub fn repo(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn settings(&self) -> &AuctionSettings {
        &self.settings
    }

    pub fn emitter(&self) -> &Arc<dyn NotificationEmitter> {
        &self.emitter
    }
}

async fn load_manager(
    conn: &mut SqliteConnection,
    id: ManagerId,
) -> Result<Manager, AuctionError> {
    managers::get(conn, id)
        .await?
        .ok_or_else(|| AuctionError::not_found(format!("Manager {}", id)))
}

async fn require_admin(
    conn: &mut SqliteConnection,
    actor: ManagerId,
) -> Result<Manager, AuctionError> {
    let manager = load_manager(conn, actor).await?;
    if !manager.is_league_manager {
        return Err(AuctionError::permission(
            "Only a league manager can do that.",
        ));
    }
    Ok(manager)
}

async fn load_player(conn: &mut SqliteConnection, id: PlayerId) -> Result<Player, AuctionError> {
    players::get(conn, id)
        .await?
        .ok_or_else(|| AuctionError::not_found(format!("Player {}", id)))
}

async fn load_slot(conn: &mut SqliteConnection, id: SlotId) -> Result<Slot, AuctionError> {
    slots::get(conn, id)
        .await?
        .ok_or_else(|| AuctionError::not_found(format!("Slot {}", id)))
}

async fn load_nomination(
    conn: &mut SqliteConnection,
    id: NominationId,
) -> Result<Nomination, AuctionError> {
    nominations::get(conn, id)
        .await?
        .ok_or_else(|| AuctionError::not_found(format!("Nomination {}", id)))
}
