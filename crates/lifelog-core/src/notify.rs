//! Notification collaborator.
//!
//! The core asks a [`NotificationScheduler`] to schedule or cancel reminders
//! and never waits on the outcome: a failed request is logged and the command
//! that triggered it still takes effect.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Repeat {
    Once,
    Daily,
    Weekly,
    Every { minutes: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub repeat: Repeat,
}

pub trait NotificationScheduler: Send {
    /// Schedule (or replace) the notification with `notification.id`.
    fn schedule(&self, notification: &Notification) -> Result<()>;

    /// Remove pending notifications. Unknown ids are ignored.
    fn cancel(&self, ids: &[String]);

    fn pending(&self) -> Vec<String>;
}

/// Drops every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScheduler;

impl NotificationScheduler for NoopScheduler {
    fn schedule(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }

    fn cancel(&self, _ids: &[String]) {}

    fn pending(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Keeps pending notifications in memory.
///
/// Clones share state, so a handle kept by the host (or a test) sees what the
/// tracker scheduled. With `log` enabled every request is also emitted at
/// info level, which is how the CLI surfaces reminders.
#[derive(Debug, Clone, Default)]
pub struct MemoryScheduler {
    pending: Arc<Mutex<IndexMap<String, Notification>>>,
    log: bool,
    refuse: bool,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logging() -> Self {
        Self {
            log: true,
            ..Self::default()
        }
    }

    /// A scheduler that rejects every schedule request.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.lock().get(id).cloned()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, Notification>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NotificationScheduler for MemoryScheduler {
    fn schedule(&self, notification: &Notification) -> Result<()> {
        if self.refuse {
            return Err(CoreError::Notification(format!(
                "scheduling {} refused",
                notification.id
            )));
        }
        if self.log {
            info!(
                id = %notification.id,
                fire_at = %notification.fire_at,
                repeat = ?notification.repeat,
                "{}: {}",
                notification.title,
                notification.body
            );
        }
        self.lock()
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    fn cancel(&self, ids: &[String]) {
        let mut pending = self.lock();
        for id in ids {
            if pending.shift_remove(id).is_some() && self.log {
                info!(%id, "notification cancelled");
            }
        }
    }

    fn pending(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
