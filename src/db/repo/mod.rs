//! Repository layer for database operations.
//!
//! Queries are grouped by table across submodules and take a
//! `&mut SqliteConnection`, so the same function runs against a pooled
//! connection or inside a transaction:
//! - `managers.rs` - Manager rows and tiebreaker ranks
//! - `players.rs` - Player rows and settlement fields
//! - `slots.rs` - Slot schedule
//! - `nominations.rs` - Nominations and their bid rows
//! - `notifications.rs` - Notification outbox
//!
//! `Repository` owns the pool and exposes read helpers for callers that do
//! not need a transaction.

pub mod managers;
pub mod nominations;
pub mod notifications;
pub mod players;
pub mod slots;

use crate::domain::{
    Bid, Manager, ManagerId, Nomination, NominationId, Notification, Player, PlayerId, Slot,
    SlotId,
};
use crate::engine::TiebreakerOrder;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::Transaction;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn get_manager(&self, id: ManagerId) -> Result<Option<Manager>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        managers::get(&mut conn, id).await
    }

    pub async fn list_managers(&self) -> Result<Vec<Manager>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        managers::list(&mut conn).await
    }

    pub async fn tiebreaker_order(&self) -> Result<TiebreakerOrder, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        managers::tiebreaker_order(&mut conn).await
    }

    pub async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        players::get(&mut conn, id).await
    }

    pub async fn list_nominatable_players(&self) -> Result<Vec<Player>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        players::list_nominatable(&mut conn).await
    }

    pub async fn get_slot(&self, id: SlotId) -> Result<Option<Slot>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        slots::get(&mut conn, id).await
    }

    pub async fn list_slots(&self, round: Option<i64>) -> Result<Vec<Slot>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        slots::list(&mut conn, round).await
    }

    pub async fn get_nomination(
        &self,
        id: NominationId,
    ) -> Result<Option<Nomination>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        nominations::get(&mut conn, id).await
    }

    pub async fn list_nominations(&self) -> Result<Vec<Nomination>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        nominations::list(&mut conn).await
    }

    pub async fn bids_for(&self, nomination: NominationId) -> Result<Vec<Bid>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        nominations::bids_for(&mut conn, nomination).await
    }

    pub async fn due_for_close(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<NominationId>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        nominations::due_for_close(&mut conn, now).await
    }

    pub async fn stale_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Nomination>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        nominations::stale_pending(&mut conn, now).await
    }

    pub async fn due_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::due(&mut conn, now).await
    }

    pub async fn list_notifications(&self) -> Result<Vec<Notification>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::list(&mut conn).await
    }

    pub async fn claim_notification(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::claim(&mut conn, id, now).await
    }

    pub async fn release_notification(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::release(&mut conn, id).await
    }

    pub async fn mark_notification_sent(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_sent(&mut conn, id, now).await
    }
}

/// Decode a text column through `FromStr`, surfacing bad values as column errors.
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}
