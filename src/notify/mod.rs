//! Outbound notifications: the emitter capability and its implementations.
//!
//! The auction core only writes rows to the outbox. Delivery happens in
//! [`dispatch`], which hands each due row to the configured emitter.

use crate::config::{Config, NotificationType};
use crate::domain::{Manager, Notification};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod discord;
pub mod dispatch;
pub mod messages;
pub mod recording;
pub mod slack;
mod webhook;

pub use discord::DiscordEmitter;
pub use dispatch::{run_notification_dispatch, spawn_dispatch_loop};
pub use recording::RecordingEmitter;
pub use slack::SlackEmitter;

/// A chat platform that league notifications are delivered to.
#[async_trait]
pub trait NotificationEmitter: Send + Sync + fmt::Debug {
    /// How the platform refers to a manager inside a message body.
    fn mention(&self, manager: &Manager) -> String;

    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> Result<(), EmitterError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitterError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Rate limited")]
    RateLimited,
    #[error("No webhook URL configured")]
    NotConfigured,
    #[error("Error: {0}")]
    Other(String),
}

/// Build the emitter named by `NOTIFICATION_TYPE`.
pub fn emitter_from_config(config: &Config) -> Arc<dyn NotificationEmitter> {
    match config.notification_type {
        NotificationType::Discord => Arc::new(DiscordEmitter::new(config.webhook_url.clone())),
        NotificationType::Slack => Arc::new(SlackEmitter::new(config.webhook_url.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_emitter_error_display() {
        let err = EmitterError::Http {
            status: 404,
            message: "Unknown Webhook".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 404: Unknown Webhook");
        assert_eq!(EmitterError::RateLimited.to_string(), "Rate limited");
    }

    #[test]
    fn test_emitter_selected_from_config() {
        let mut env = HashMap::new();
        env.insert("DATABASE_PATH".to_string(), "/tmp/a.db".to_string());
        env.insert("NOTIFICATION_TYPE".to_string(), "slack".to_string());
        let config = Config::from_env_map(env).unwrap();
        let emitter = emitter_from_config(&config);
        assert!(format!("{:?}", emitter).starts_with("SlackEmitter"));
    }
}
