//! Slack incoming-webhook emitter.

use super::webhook::post_json;
use super::{EmitterError, NotificationEmitter};
use crate::domain::{Manager, Notification};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SlackEmitter {
    client: Client,
    webhook_url: Option<String>,
}

impl SlackEmitter {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
        }
    }

    /// Plain `text` fallback plus a header / divider / body block layout.
    pub fn payload(notification: &Notification) -> serde_json::Value {
        let title = format!("{}  *{}*", notification.kind.emoji(), notification.title);
        serde_json::json!({
            "text": title,
            "blocks": [
                {"type": "section", "text": {"type": "mrkdwn", "text": title}},
                {"type": "divider"},
                {"type": "section", "text": {"type": "mrkdwn", "text": notification.body}}
            ]
        })
    }
}

#[async_trait]
impl NotificationEmitter for SlackEmitter {
    fn mention(&self, manager: &Manager) -> String {
        match manager.slack_id.as_deref() {
            Some(id) if !id.is_empty() => format!("<@{}>", id),
            _ => manager.team_name.clone(),
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), EmitterError> {
        let Some(url) = self.webhook_url.as_deref() else {
            warn!(
                "Skipping Slack notification {}: no webhook configured",
                notification.id
            );
            return Err(EmitterError::NotConfigured);
        };

        let payload = Self::payload(notification);
        debug!("Posting Slack notification {}: {}", notification.id, payload);
        post_json(&self.client, url, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, ManagerId};
    use chrono::Utc;

    #[test]
    fn test_payload_blocks() {
        let notification = Notification {
            id: 2,
            kind: EventKind::MatchPending,
            subject: Some(4),
            title: "An auction has closed and is pending a match!".to_string(),
            body: "<@U1> has 24 hours".to_string(),
            send_at: Utc::now(),
            sent: false,
        };
        let payload = SlackEmitter::payload(&notification);
        assert_eq!(
            payload["text"],
            ":stopwatch:  *An auction has closed and is pending a match!*"
        );
        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1]["type"], "divider");
        assert_eq!(blocks[2]["text"]["text"], "<@U1> has 24 hours");
    }

    #[test]
    fn test_mention_falls_back_to_team_name() {
        let emitter = SlackEmitter::new(None);
        let mut manager = Manager {
            id: ManagerId::new(2),
            username: "bob".to_string(),
            team_name: "Bob's Bombers".to_string(),
            short_team_name: "BOB".to_string(),
            tiebreaker_rank: None,
            slack_id: None,
            discord_id: Some("55".to_string()),
            is_league_manager: false,
        };
        assert_eq!(emitter.mention(&manager), "Bob's Bombers");
        manager.slack_id = Some("U42".to_string());
        assert_eq!(emitter.mention(&manager), "<@U42>");
    }
}
