//! Outbox delivery.

use super::NotificationEmitter;
use crate::db::Repository;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// Send every due, unsent notification. Returns how many were delivered.
///
/// Each row is claimed before its send so a retraction that lands while the
/// send is in flight knows the message went out. A failed send releases the
/// claim for the next run; it never affects the auction state that produced it.
pub async fn run_notification_dispatch(
    repo: &Repository,
    emitter: &dyn NotificationEmitter,
    now: DateTime<Utc>,
) -> Result<usize, sqlx::Error> {
    let due = repo.due_notifications(now).await?;
    if due.is_empty() {
        return Ok(0);
    }

    let mut delivered = 0usize;
    for notification in &due {
        if !repo.claim_notification(notification.id, now).await? {
            debug!(notification_id = notification.id, "Notification taken elsewhere");
            continue;
        }
        match emitter.send(notification).await {
            Ok(()) => {
                if repo.mark_notification_sent(notification.id, now).await? {
                    delivered += 1;
                }
            }
            Err(e) => {
                warn!(
                    notification_id = notification.id,
                    kind = %notification.kind,
                    "Failed to send notification: {}",
                    e
                );
                repo.release_notification(notification.id).await?;
            }
        }
    }

    info!("Dispatched {} of {} due notifications", delivered, due.len());
    Ok(delivered)
}

/// Deliver due notifications every `every` until the task is dropped.
pub fn spawn_dispatch_loop(
    repo: Arc<Repository>,
    emitter: Arc<dyn NotificationEmitter>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = run_notification_dispatch(&repo, emitter.as_ref(), Utc::now()).await {
                error!("Notification dispatch failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::db::repo::notifications;
    use crate::domain::EventKind;
    use crate::notify::{messages, RecordingEmitter};
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_dispatch_sends_only_due_rows() {
        let (repo, _temp) = setup_repo().await;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        let mut conn = repo.pool().acquire().await.unwrap();
        notifications::schedule(
            &mut conn,
            &messages::round_opened(1, now - Duration::minutes(1), now + Duration::days(1)),
            now,
        )
        .await
        .unwrap();
        notifications::schedule(
            &mut conn,
            &messages::round_auctions_closing(1, now + Duration::days(2), 120),
            now,
        )
        .await
        .unwrap();
        drop(conn);

        let emitter = RecordingEmitter::new();
        let sent = run_notification_dispatch(&repo, &emitter, now).await.unwrap();
        assert_eq!(sent, 1);
        assert_eq!(emitter.sent_kinds(), vec![EventKind::RoundOpened]);

        // Already delivered rows are not resent.
        let again = run_notification_dispatch(&repo, &emitter, now).await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_failed_send_stays_unsent() {
        let (repo, _temp) = setup_repo().await;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        let mut conn = repo.pool().acquire().await.unwrap();
        notifications::schedule(
            &mut conn,
            &messages::round_opened(1, now, now + Duration::days(1)),
            now,
        )
        .await
        .unwrap();
        drop(conn);

        let failing = RecordingEmitter::new().failing_on(EventKind::RoundOpened);
        assert_eq!(
            run_notification_dispatch(&repo, &failing, now).await.unwrap(),
            0
        );

        let healthy = RecordingEmitter::new();
        assert_eq!(
            run_notification_dispatch(&repo, &healthy, now).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_rows_claimed_by_another_dispatcher_are_skipped() {
        let (repo, _temp) = setup_repo().await;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        let mut conn = repo.pool().acquire().await.unwrap();
        let id = notifications::schedule(
            &mut conn,
            &messages::round_opened(1, now, now + Duration::days(1)),
            now,
        )
        .await
        .unwrap();
        drop(conn);

        assert!(repo.claim_notification(id, now).await.unwrap());

        let emitter = RecordingEmitter::new();
        assert_eq!(
            run_notification_dispatch(&repo, &emitter, now).await.unwrap(),
            0
        );
        assert!(emitter.sent_kinds().is_empty());
    }
}
