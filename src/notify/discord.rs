//! Discord webhook emitter.

use super::webhook::post_json;
use super::{EmitterError, NotificationEmitter};
use crate::domain::{Manager, Notification};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

const EMBED_COLOR: u32 = 3447003;

#[derive(Debug, Clone)]
pub struct DiscordEmitter {
    client: Client,
    webhook_url: Option<String>,
}

impl DiscordEmitter {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
        }
    }

    /// Discord takes the headline as `content` and the message as an embed.
    pub fn payload(notification: &Notification) -> serde_json::Value {
        serde_json::json!({
            "content": format!(
                "{}  **{}**",
                notification.kind.emoji(),
                notification.title
            ),
            "embeds": [{
                "description": notification.body,
                "color": EMBED_COLOR
            }]
        })
    }
}

#[async_trait]
impl NotificationEmitter for DiscordEmitter {
    fn mention(&self, manager: &Manager) -> String {
        match manager.discord_id.as_deref() {
            Some(id) if !id.is_empty() => format!("<@{}>", id),
            _ => manager.team_name.clone(),
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), EmitterError> {
        let Some(url) = self.webhook_url.as_deref() else {
            warn!(
                "Skipping Discord notification {}: no webhook configured",
                notification.id
            );
            return Err(EmitterError::NotConfigured);
        };

        let payload = Self::payload(notification);
        debug!("Posting Discord notification {}: {}", notification.id, payload);
        post_json(&self.client, url, &payload).await
    }
}
