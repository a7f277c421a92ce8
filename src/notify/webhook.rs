//! Shared webhook POST with bounded exponential backoff.

use super::EmitterError;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;

/// POST `payload` to `url`, retrying transient failures for up to 30 seconds.
///
/// Network errors, 429 and 5xx are retried; any other non-success status is
/// returned immediately.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    payload: &serde_json::Value,
) -> Result<(), EmitterError> {
    let backoff = ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(30)),
        ..Default::default()
    };

    retry(backoff, || async {
        let response = client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| backoff::Error::transient(EmitterError::Network(e.to_string())))?;

        let status = response.status();
        if status == 429 {
            return Err(backoff::Error::transient(EmitterError::RateLimited));
        }
        if status.is_server_error() {
            return Err(backoff::Error::transient(EmitterError::Http {
                status: status.as_u16(),
                message: "Server error".to_string(),
            }));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(backoff::Error::permanent(EmitterError::Http {
                status: status.as_u16(),
                message,
            }));
        }
        Ok(())
    })
    .await
}
