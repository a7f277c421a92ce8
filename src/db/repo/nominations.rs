//! Nominations and the bid rows attached to them.

use super::parse_column;
use crate::domain::{
    from_millis, to_millis, Bid, ManagerId, Nomination, NominationId, NominationState, PlayerId,
    SlotId,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const NOMINATION_COLUMNS: &str = "n.id, n.player_id, n.slot_id, n.nominator_id, n.state, \
     n.winner_id, n.winning_value, n.match_deadline, n.created_at, n.resolved_at";

fn nomination_from_row(row: &SqliteRow) -> Result<Nomination, sqlx::Error> {
    let state: String = row.try_get("state")?;
    let winner: Option<i64> = row.try_get("winner_id")?;
    let deadline: Option<i64> = row.try_get("match_deadline")?;
    let resolved_at: Option<i64> = row.try_get("resolved_at")?;
    Ok(Nomination {
        id: NominationId::new(row.try_get("id")?),
        player_id: PlayerId::new(row.try_get("player_id")?),
        slot_id: SlotId::new(row.try_get("slot_id")?),
        nominator_id: ManagerId::new(row.try_get("nominator_id")?),
        state: parse_column::<NominationState>("state", &state)?,
        winner_id: winner.map(ManagerId::new),
        winning_value: row.try_get("winning_value")?,
        match_deadline: deadline.map(from_millis),
        created_at: from_millis(row.try_get("created_at")?),
        resolved_at: resolved_at.map(from_millis),
    })
}

pub async fn insert(
    conn: &mut SqliteConnection,
    player: PlayerId,
    slot: SlotId,
    nominator: ManagerId,
    now: DateTime<Utc>,
) -> Result<NominationId, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO nominations (player_id, slot_id, nominator_id, state, created_at)
        VALUES (?, ?, ?, 'open', ?)
        "#,
    )
    .bind(player.as_i64())
    .bind(slot.as_i64())
    .bind(nominator.as_i64())
    .bind(to_millis(now))
    .execute(&mut *conn)
    .await?;
    Ok(NominationId::new(result.last_insert_rowid()))
}

pub async fn get(
    conn: &mut SqliteConnection,
    id: NominationId,
) -> Result<Option<Nomination>, sqlx::Error> {
    let sql = format!("SELECT {} FROM nominations n WHERE n.id = ?", NOMINATION_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(nomination_from_row).transpose()
}

pub async fn find_by_player(
    conn: &mut SqliteConnection,
    player: PlayerId,
) -> Result<Option<Nomination>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM nominations n WHERE n.player_id = ?",
        NOMINATION_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(player.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(nomination_from_row).transpose()
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Nomination>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM nominations n
        JOIN slots s ON s.id = n.slot_id
        ORDER BY s.closes_at, n.id
        "#,
        NOMINATION_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(nomination_from_row).collect()
}

/// Open nominations of unowned players whose slot closed strictly before
/// `now`, oldest first.
pub async fn due_for_close(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<Vec<NominationId>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        r#"
        SELECT n.id FROM nominations n
        JOIN slots s ON s.id = n.slot_id
        JOIN players p ON p.id = n.player_id
        WHERE n.state = 'open' AND s.closes_at < ? AND p.owner_id IS NULL
        ORDER BY s.closes_at, n.id
        "#,
    )
    .bind(to_millis(now))
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| NominationId::new(id)).collect())
}

/// Pending-match nominations whose decision window has passed.
pub async fn stale_pending(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<Vec<Nomination>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM nominations n
        WHERE n.state = 'pending_match' AND n.match_deadline < ?
        ORDER BY n.match_deadline, n.id
        "#,
        NOMINATION_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(to_millis(now))
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(nomination_from_row).collect()
}

/// Nominations a manager made in one round.
pub async fn count_by_nominator_in_round(
    conn: &mut SqliteConnection,
    nominator: ManagerId,
    round: i64,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM nominations n
        JOIN slots s ON s.id = n.slot_id
        WHERE n.nominator_id = ? AND s.round = ?
        "#,
    )
    .bind(nominator.as_i64())
    .bind(round)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.0)
}

pub async fn mark_pending(
    conn: &mut SqliteConnection,
    id: NominationId,
    deadline: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE nominations
        SET state = 'pending_match', match_deadline = ?, winner_id = NULL,
            winning_value = NULL, resolved_at = NULL
        WHERE id = ?
        "#,
    )
    .bind(to_millis(deadline))
    .bind(id.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn mark_resolved(
    conn: &mut SqliteConnection,
    id: NominationId,
    winner: ManagerId,
    value: i64,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE nominations
        SET state = 'resolved', winner_id = ?, winning_value = ?,
            match_deadline = NULL, resolved_at = ?
        WHERE id = ?
        "#,
    )
    .bind(winner.as_i64())
    .bind(value)
    .bind(to_millis(now))
    .bind(id.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Return a nomination to bidding, clearing any outcome.
pub async fn reopen(conn: &mut SqliteConnection, id: NominationId) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE nominations
        SET state = 'open', winner_id = NULL, winning_value = NULL,
            match_deadline = NULL, resolved_at = NULL
        WHERE id = ?
        "#,
    )
    .bind(id.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn set_slot(
    conn: &mut SqliteConnection,
    id: NominationId,
    slot: SlotId,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE nominations SET slot_id = ? WHERE id = ?")
        .bind(slot.as_i64())
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete a nomination; its bids cascade.
pub async fn delete(conn: &mut SqliteConnection, id: NominationId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM nominations WHERE id = ?")
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_bids(
    conn: &mut SqliteConnection,
    nomination: NominationId,
    bids: &[Bid],
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let updated_at = to_millis(now);
    for bid in bids {
        sqlx::query(
            r#"
            INSERT INTO bids (manager_id, nomination_id, value, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(bid.manager_id.as_i64())
        .bind(nomination.as_i64())
        .bind(bid.value)
        .bind(updated_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Every bid row of a nomination in manager-id order.
pub async fn bids_for(
    conn: &mut SqliteConnection,
    nomination: NominationId,
) -> Result<Vec<Bid>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT manager_id, value FROM bids WHERE nomination_id = ? ORDER BY manager_id",
    )
    .bind(nomination.as_i64())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(Bid::new(
                ManagerId::new(row.try_get("manager_id")?),
                row.try_get("value")?,
            ))
        })
        .collect()
}

/// Write one manager's bid, creating the row if it is missing.
pub async fn upsert_bid(
    conn: &mut SqliteConnection,
    nomination: NominationId,
    manager: ManagerId,
    value: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO bids (manager_id, nomination_id, value, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(manager_id, nomination_id)
        DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(manager.as_i64())
    .bind(nomination.as_i64())
    .bind(value)
    .bind(to_millis(now))
    .execute(&mut *conn)
    .await?;
    Ok(())
}
