//! Manager rows and the persisted tiebreaker order.

use crate::domain::{to_millis, Manager, ManagerId, NewManager};
use crate::engine::{RankUpdates, TiebreakerOrder};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const MANAGER_COLUMNS: &str = "id, username, team_name, short_team_name, tiebreaker_rank, \
     slack_id, discord_id, is_league_manager";

fn manager_from_row(row: &SqliteRow) -> Result<Manager, sqlx::Error> {
    Ok(Manager {
        id: ManagerId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        team_name: row.try_get("team_name")?,
        short_team_name: row.try_get("short_team_name")?,
        tiebreaker_rank: row.try_get("tiebreaker_rank")?,
        slack_id: row.try_get("slack_id")?,
        discord_id: row.try_get("discord_id")?,
        is_league_manager: row.try_get("is_league_manager")?,
    })
}

/// Insert a manager and give them an empty bid on every existing nomination.
pub async fn insert(
    conn: &mut SqliteConnection,
    manager: &NewManager,
    now: DateTime<Utc>,
) -> Result<ManagerId, sqlx::Error> {
    let created_at = to_millis(now);
    let result = sqlx::query(
        r#"
        INSERT INTO managers (
            username, team_name, short_team_name, tiebreaker_rank,
            slack_id, discord_id, is_league_manager, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&manager.username)
    .bind(&manager.team_name)
    .bind(&manager.short_team_name)
    .bind(manager.tiebreaker_rank)
    .bind(manager.slack_id.as_deref())
    .bind(manager.discord_id.as_deref())
    .bind(manager.is_league_manager)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;
    let id = ManagerId::new(result.last_insert_rowid());

    sqlx::query(
        r#"
        INSERT INTO bids (manager_id, nomination_id, value, updated_at)
        SELECT ?, id, NULL, ? FROM nominations
        "#,
    )
    .bind(id.as_i64())
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn get(
    conn: &mut SqliteConnection,
    id: ManagerId,
) -> Result<Option<Manager>, sqlx::Error> {
    let sql = format!("SELECT {} FROM managers WHERE id = ?", MANAGER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(manager_from_row).transpose()
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Manager>, sqlx::Error> {
    let sql = format!("SELECT {} FROM managers ORDER BY id", MANAGER_COLUMNS);
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(manager_from_row).collect()
}

/// Every manager id, ascending.
pub async fn ids(conn: &mut SqliteConnection) -> Result<Vec<ManagerId>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM managers ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(|(id,)| ManagerId::new(id)).collect())
}

pub async fn tiebreaker_order(
    conn: &mut SqliteConnection,
) -> Result<TiebreakerOrder, sqlx::Error> {
    let rows: Vec<(i64, Option<i64>)> =
        sqlx::query_as("SELECT id, tiebreaker_rank FROM managers ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
    Ok(TiebreakerOrder::new(
        rows.into_iter().map(|(id, rank)| (ManagerId::new(id), rank)),
    ))
}

/// Write a batch of rank changes.
///
/// Every affected rank is cleared first so that intermediate states never
/// collide on the unique index.
pub async fn apply_rank_updates(
    conn: &mut SqliteConnection,
    updates: &RankUpdates,
) -> Result<(), sqlx::Error> {
    for manager in updates.keys() {
        sqlx::query("UPDATE managers SET tiebreaker_rank = NULL WHERE id = ?")
            .bind(manager.as_i64())
            .execute(&mut *conn)
            .await?;
    }
    for (manager, rank) in updates {
        sqlx::query("UPDATE managers SET tiebreaker_rank = ? WHERE id = ?")
            .bind(rank)
            .bind(manager.as_i64())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
