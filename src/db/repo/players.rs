//! Player rows: rights, ownership and contract fields.

use crate::domain::{ManagerId, NewPlayer, Player, PlayerId};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const PLAYER_COLUMNS: &str = "id, external_id, name, team, position, hometown_discount, \
     owner_id, match_right_holder_id, contract_length, salary";

fn player_from_row(row: &SqliteRow) -> Result<Player, sqlx::Error> {
    let owner: Option<i64> = row.try_get("owner_id")?;
    let matcher: Option<i64> = row.try_get("match_right_holder_id")?;
    Ok(Player {
        id: PlayerId::new(row.try_get("id")?),
        external_id: row.try_get("external_id")?,
        name: row.try_get("name")?,
        team: row.try_get("team")?,
        position: row.try_get("position")?,
        hometown_discount: row.try_get("hometown_discount")?,
        owner: owner.map(ManagerId::new),
        match_right_holder: matcher.map(ManagerId::new),
        contract_length: row.try_get("contract_length")?,
        salary: row.try_get("salary")?,
    })
}

pub async fn insert(
    conn: &mut SqliteConnection,
    player: &NewPlayer,
) -> Result<PlayerId, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO players (
            external_id, name, team, position, hometown_discount, match_right_holder_id
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&player.external_id)
    .bind(&player.name)
    .bind(&player.team)
    .bind(&player.position)
    .bind(player.hometown_discount)
    .bind(player.match_right_holder.map(|m| m.as_i64()))
    .execute(&mut *conn)
    .await?;
    Ok(PlayerId::new(result.last_insert_rowid()))
}

pub async fn get(conn: &mut SqliteConnection, id: PlayerId) -> Result<Option<Player>, sqlx::Error> {
    let sql = format!("SELECT {} FROM players WHERE id = ?", PLAYER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(player_from_row).transpose()
}

/// Free agents that are not bound to any nomination yet.
pub async fn list_nominatable(conn: &mut SqliteConnection) -> Result<Vec<Player>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM players
        WHERE owner_id IS NULL
          AND id NOT IN (SELECT player_id FROM nominations)
        ORDER BY name, id
        "#,
        PLAYER_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(player_from_row).collect()
}

/// Record the owner. Contract terms are left as they are.
pub async fn set_owner(
    conn: &mut SqliteConnection,
    id: PlayerId,
    owner: ManagerId,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE players SET owner_id = ? WHERE id = ?")
        .bind(owner.as_i64())
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Return the player to free agency, clearing owner, contract and salary.
pub async fn unassign(conn: &mut SqliteConnection, id: PlayerId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE players SET owner_id = NULL, contract_length = NULL, salary = NULL WHERE id = ?",
    )
    .bind(id.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Admin edit of rights fields.
pub async fn set_rights(
    conn: &mut SqliteConnection,
    id: PlayerId,
    match_right_holder: Option<ManagerId>,
    hometown_discount: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE players SET match_right_holder_id = ?, hometown_discount = ? WHERE id = ?",
    )
    .bind(match_right_holder.map(|m| m.as_i64()))
    .bind(hometown_discount)
    .bind(id.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn sign(
    conn: &mut SqliteConnection,
    id: PlayerId,
    contract_length: i64,
    salary: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE players SET contract_length = ?, salary = ? WHERE id = ?")
        .bind(contract_length)
        .bind(salary)
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    Ok(())
}
