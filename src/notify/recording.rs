//! In-memory emitter for tests and dry runs.

use super::{EmitterError, NotificationEmitter};
use crate::domain::{EventKind, Manager, Notification};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Records every delivered notification instead of posting it.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    sent: Mutex<Vec<Notification>>,
    failing: HashSet<EventKind>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends of `kind` fail with a server error.
    pub fn failing_on(mut self, kind: EventKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn sent_kinds(&self) -> Vec<EventKind> {
        self.sent().iter().map(|n| n.kind).collect()
    }
}

#[async_trait]
impl NotificationEmitter for RecordingEmitter {
    fn mention(&self, manager: &Manager) -> String {
        format!("@{}", manager.username)
    }

    async fn send(&self, notification: &Notification) -> Result<(), EmitterError> {
        if self.failing.contains(&notification.kind) {
            return Err(EmitterError::Http {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification.clone());
        Ok(())
    }
}
