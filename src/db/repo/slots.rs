//! Slot schedule queries.

use crate::domain::{from_millis, to_millis, Slot, SlotId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const SLOT_COLUMNS: &str = "s.id, s.round, s.closes_at, s.nomination_opens_at, s.nomination_closes_at";

fn slot_from_row(row: &SqliteRow) -> Result<Slot, sqlx::Error> {
    Ok(Slot {
        id: SlotId::new(row.try_get("id")?),
        round: row.try_get("round")?,
        closes_at: from_millis(row.try_get("closes_at")?),
        nomination_opens_at: from_millis(row.try_get("nomination_opens_at")?),
        nomination_closes_at: from_millis(row.try_get("nomination_closes_at")?),
    })
}

pub async fn insert(
    conn: &mut SqliteConnection,
    round: i64,
    closes_at: DateTime<Utc>,
    nomination_opens_at: DateTime<Utc>,
    nomination_closes_at: DateTime<Utc>,
) -> Result<SlotId, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO slots (round, closes_at, nomination_opens_at, nomination_closes_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(round)
    .bind(to_millis(closes_at))
    .bind(to_millis(nomination_opens_at))
    .bind(to_millis(nomination_closes_at))
    .execute(&mut *conn)
    .await?;
    Ok(SlotId::new(result.last_insert_rowid()))
}

pub async fn get(conn: &mut SqliteConnection, id: SlotId) -> Result<Option<Slot>, sqlx::Error> {
    let sql = format!("SELECT {} FROM slots s WHERE s.id = ?", SLOT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(slot_from_row).transpose()
}

/// Slots ordered by round then close time, optionally for one round.
pub async fn list(conn: &mut SqliteConnection, round: Option<i64>) -> Result<Vec<Slot>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM slots s
        WHERE (?1 IS NULL OR s.round = ?1)
        ORDER BY s.round, s.closes_at, s.id
        "#,
        SLOT_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(round).fetch_all(&mut *conn).await?;
    rows.iter().map(slot_from_row).collect()
}

/// Slots without a nomination, ordered like [`list`].
pub async fn list_unoccupied(
    conn: &mut SqliteConnection,
    round: Option<i64>,
) -> Result<Vec<Slot>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM slots s
        LEFT JOIN nominations n ON n.slot_id = s.id
        WHERE n.id IS NULL AND (?1 IS NULL OR s.round = ?1)
        ORDER BY s.round, s.closes_at, s.id
        "#,
        SLOT_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(round).fetch_all(&mut *conn).await?;
    rows.iter().map(slot_from_row).collect()
}

pub async fn is_occupied(conn: &mut SqliteConnection, id: SlotId) -> Result<bool, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nominations WHERE slot_id = ?")
        .bind(id.as_i64())
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.0 > 0)
}

pub async fn round_exists(conn: &mut SqliteConnection, round: i64) -> Result<bool, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM slots WHERE round = ?")
        .bind(round)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.0 > 0)
}

pub async fn earliest_close(
    conn: &mut SqliteConnection,
    round: i64,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let row: (Option<i64>,) = sqlx::query_as("SELECT MIN(closes_at) FROM slots WHERE round = ?")
        .bind(round)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.0.map(from_millis))
}

pub async fn delete(conn: &mut SqliteConnection, id: SlotId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM slots WHERE id = ?")
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
