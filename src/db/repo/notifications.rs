//! Notification outbox.
//!
//! Rows are written in the same transaction as the state change that caused
//! them and delivered later by the dispatcher.

use super::parse_column;
use crate::domain::{from_millis, to_millis, EventKind, NewNotification, Notification};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

const NOTIFICATION_COLUMNS: &str = "id, kind, subject, title, body, send_at, sent";

/// How long a dispatcher's claim on a row holds before another may retry it.
pub const CLAIM_LEASE_MS: i64 = 5 * 60 * 1000;

fn notification_from_row(row: &SqliteRow) -> Result<Notification, sqlx::Error> {
    let kind: String = row.try_get("kind")?;
    Ok(Notification {
        id: row.try_get("id")?,
        kind: parse_column::<EventKind>("kind", &kind)?,
        subject: row.try_get("subject")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        send_at: from_millis(row.try_get("send_at")?),
        sent: row.try_get("sent")?,
    })
}

pub async fn schedule(
    conn: &mut SqliteConnection,
    notification: &NewNotification,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (kind, subject, title, body, send_at, sent, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(notification.kind.as_str())
    .bind(notification.subject)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(to_millis(notification.send_at))
    .bind(to_millis(now))
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Drop unsent notifications of a kind for a subject, including ones a
/// dispatcher is sending right now. Returns how many went.
pub async fn retract(
    conn: &mut SqliteConnection,
    kind: EventKind,
    subject: i64,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM notifications WHERE kind = ? AND subject = ? AND sent = 0")
            .bind(kind.as_str())
            .bind(subject)
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected())
}

/// Whether a notification of a kind for a subject has been sent or is
/// being sent by a dispatcher.
pub async fn went_out(
    conn: &mut SqliteConnection,
    kind: EventKind,
    subject: i64,
) -> Result<bool, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE kind = ? AND subject = ? AND (sent = 1 OR claimed_at IS NOT NULL)
        "#,
    )
    .bind(kind.as_str())
    .bind(subject)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.0 > 0)
}

/// Unsent, unclaimed notifications whose send time has arrived, oldest first.
/// Claims older than the lease count as abandoned.
pub async fn due(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {} FROM notifications
        WHERE sent = 0 AND send_at <= ? AND (claimed_at IS NULL OR claimed_at < ?)
        ORDER BY send_at, id
        "#,
        NOTIFICATION_COLUMNS
    );
    let now_ms = to_millis(now);
    let rows = sqlx::query(&sql)
        .bind(now_ms)
        .bind(now_ms - CLAIM_LEASE_MS)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(notification_from_row).collect()
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM notifications ORDER BY send_at, id",
        NOTIFICATION_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter().map(notification_from_row).collect()
}

/// Take a row for sending. Returns false if it was already sent, retracted,
/// or is held by another dispatcher's live claim.
pub async fn claim(
    conn: &mut SqliteConnection,
    id: i64,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let now_ms = to_millis(now);
    let result = sqlx::query(
        r#"
        UPDATE notifications SET claimed_at = ?
        WHERE id = ? AND sent = 0 AND (claimed_at IS NULL OR claimed_at < ?)
        "#,
    )
    .bind(now_ms)
    .bind(id)
    .bind(now_ms - CLAIM_LEASE_MS)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Give a claimed row back after a failed send.
pub async fn release(conn: &mut SqliteConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notifications SET claimed_at = NULL WHERE id = ? AND sent = 0")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Mark delivered. Returns false if the row was already sent or retracted.
pub async fn mark_sent(
    conn: &mut SqliteConnection,
    id: i64,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET sent = 1, sent_at = ?, claimed_at = NULL WHERE id = ? AND sent = 0",
    )
    .bind(to_millis(now))
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop unsent round notifications for a round.
pub async fn retract_round(conn: &mut SqliteConnection, round: i64) -> Result<u64, sqlx::Error> {
    let mut removed = 0;
    for kind in EventKind::ALL.into_iter().filter(|k| k.is_round_event()) {
        removed += retract(conn, kind, round).await?;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::NominationId;
    use crate::notify::messages;
    use chrono::{Duration, TimeZone};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    async fn setup_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (pool, temp_dir)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_claimed_row_counts_as_gone_out() {
        let (pool, _temp) = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let id = schedule(
            &mut conn,
            &messages::match_retracted(
                NominationId::new(7),
                &crate::domain::Player {
                    id: crate::domain::PlayerId::new(1),
                    external_id: "x".to_string(),
                    name: "Ace".to_string(),
                    team: "BOS".to_string(),
                    position: "SP".to_string(),
                    hometown_discount: false,
                    owner: None,
                    match_right_holder: None,
                    contract_length: None,
                    salary: None,
                },
                now(),
            ),
            now(),
        )
        .await
        .unwrap();

        assert!(!went_out(&mut conn, EventKind::MatchRetracted, 7).await.unwrap());
        assert!(claim(&mut conn, id, now()).await.unwrap());
        assert!(went_out(&mut conn, EventKind::MatchRetracted, 7).await.unwrap());

        // A second dispatcher neither sees nor takes the row while the lease holds.
        assert!(due(&mut conn, now()).await.unwrap().is_empty());
        assert!(!claim(&mut conn, id, now()).await.unwrap());

        // An abandoned claim becomes due again.
        let later = now() + Duration::milliseconds(CLAIM_LEASE_MS + 1);
        assert_eq!(due(&mut conn, later).await.unwrap().len(), 1);

        release(&mut conn, id).await.unwrap();
        assert!(!went_out(&mut conn, EventKind::MatchRetracted, 7).await.unwrap());
        assert!(claim(&mut conn, id, now()).await.unwrap());
        assert!(mark_sent(&mut conn, id, now()).await.unwrap());
        assert!(went_out(&mut conn, EventKind::MatchRetracted, 7).await.unwrap());
    }

    #[tokio::test]
    async fn test_retract_removes_in_flight_rows() {
        let (pool, _temp) = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let id = schedule(
            &mut conn,
            &messages::round_opened(3, now(), now() + Duration::days(1)),
            now(),
        )
        .await
        .unwrap();
        assert!(claim(&mut conn, id, now()).await.unwrap());

        assert_eq!(retract(&mut conn, EventKind::RoundOpened, 3).await.unwrap(), 1);
        assert!(!mark_sent(&mut conn, id, now()).await.unwrap());
    }
}
