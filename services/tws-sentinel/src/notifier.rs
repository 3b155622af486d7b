//! Notifier trait for sending alerts

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Why a notification is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Started,
    Down,
    Recovered,
    Reminder,
    Stopped,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Started => write!(f, "started"),
            NotificationKind::Down => write!(f, "down"),
            NotificationKind::Recovered => write!(f, "recovered"),
            NotificationKind::Reminder => write!(f, "reminder"),
            NotificationKind::Stopped => write!(f, "stopped"),
        }
    }
}

/// A notification to be sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn started(label: &str) -> Self {
        Self {
            kind: NotificationKind::Started,
            message: format!("{}: TWS API monitoring started", label),
        }
    }

    pub fn stopped(label: &str) -> Self {
        Self {
            kind: NotificationKind::Stopped,
            message: format!("{}: TWS API monitoring stopped", label),
        }
    }

    pub fn down(label: &str, reason: &str) -> Self {
        Self {
            kind: NotificationKind::Down,
            message: format!("{}: TWS API is down: {}", label, reason),
        }
    }

    pub fn recovered(label: &str, server_time: &str) -> Self {
        Self {
            kind: NotificationKind::Recovered,
            message: format!("{}: TWS API recovered. Server time: {}", label, server_time),
        }
    }

    pub fn reminder(label: &str, down_for: std::time::Duration, reason: &str) -> Self {
        // Whole seconds read better than humantime's sub-second tail
        let down_for = std::time::Duration::from_secs(down_for.as_secs());
        Self {
            kind: NotificationKind::Reminder,
            message: format!(
                "{}: Reminder: TWS API still down after {}: {}",
                label,
                humantime::format_duration(down_for),
                reason
            ),
        }
    }
}

/// Trait for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "telegram")
    fn type_name(&self) -> &str;

    /// Send a notification
    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}
