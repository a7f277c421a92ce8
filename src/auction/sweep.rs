//! Periodic settlement of closed auctions.

use super::{AuctionService, CloseOutcome};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Close every open nomination whose slot closed before `now`.
///
/// Each nomination settles in its own transaction; a failure is logged and
/// the sweep moves on. Returns the number settled successfully. Pending
/// matches are never settled here, only reported once their window passes.
pub async fn run_settlement_sweep(
    service: &AuctionService,
    now: DateTime<Utc>,
) -> Result<usize, sqlx::Error> {
    let due = service.repo().due_for_close(now).await?;
    let mut settled = 0usize;

    for nomination_id in due {
        match service.close(nomination_id, now).await {
            Ok(CloseOutcome::Resolved { winner, value, .. }) => {
                settled += 1;
                info!(nomination_id = %nomination_id, winner = %winner, value, "Settled");
            }
            Ok(CloseOutcome::PendingMatch { matcher, .. }) => {
                settled += 1;
                info!(nomination_id = %nomination_id, matcher = %matcher, "Awaiting match");
            }
            Err(e) => {
                warn!(
                    nomination_id = %nomination_id,
                    kind = e.kind().as_str(),
                    "Failed to settle nomination: {}",
                    e
                );
            }
        }
    }

    for stale in service.repo().stale_pending(now).await? {
        warn!(
            nomination_id = %stale.id,
            deadline = ?stale.match_deadline,
            "Match decision overdue"
        );
    }

    Ok(settled)
}

/// Run the sweep every `every` until the task is dropped.
pub fn spawn_sweep_loop(service: AuctionService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            match run_settlement_sweep(&service, Utc::now()).await {
                Ok(0) => {}
                Ok(n) => info!("Settlement sweep settled {} nominations", n),
                Err(e) => error!("Settlement sweep failed: {}", e),
            }
        }
    })
}
