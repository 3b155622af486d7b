//! Gateway health state and the transition/reminder decision

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// The observed state of the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Up,
    Down,
    Unknown,
}

impl GatewayStatus {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            GatewayStatus::Up
        } else {
            GatewayStatus::Down
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayStatus::Up => write!(f, "Up"),
            GatewayStatus::Down => write!(f, "Down"),
            GatewayStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// What the loop should announce after an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// Up or Unknown -> Down
    Down,
    /// Down -> Up
    Recovered { down_for: Duration },
    /// Still Down and the reminder interval has elapsed
    Reminder { down_for: Duration },
}

/// Health state owned by the polling loop
#[derive(Debug, Clone)]
pub struct HealthState {
    status: GatewayStatus,
    last_notified_at: Option<Instant>,
    last_reminder_at: Option<Instant>,
    down_since: Option<Instant>,
    reminder_interval: Duration,
}

impl HealthState {
    /// A zero `reminder_interval` reminds on every Down tick
    pub fn new(reminder_interval: Duration) -> Self {
        Self {
            status: GatewayStatus::Unknown,
            last_notified_at: None,
            last_reminder_at: None,
            down_since: None,
            reminder_interval,
        }
    }

    pub fn status(&self) -> GatewayStatus {
        self.status
    }

    pub fn last_notified_at(&self) -> Option<Instant> {
        self.last_notified_at
    }

    pub fn last_reminder_at(&self) -> Option<Instant> {
        self.last_reminder_at
    }

    /// Record a probe result taken at `now` and decide what to announce.
    ///
    /// Unknown -> Up is recorded silently: nothing was down, so there is
    /// nothing to recover from.
    pub fn observe(&mut self, reachable: bool, now: Instant) -> Option<Alert> {
        let observed = GatewayStatus::from_reachable(reachable);
        let previous = self.status;

        if observed != previous {
            self.status = observed;
            return match observed {
                GatewayStatus::Down => {
                    self.last_notified_at = Some(now);
                    self.last_reminder_at = Some(now);
                    self.down_since = Some(now);
                    Some(Alert::Down)
                }
                GatewayStatus::Up if previous == GatewayStatus::Unknown => None,
                GatewayStatus::Up => {
                    let down_for = self.down_for(now);
                    self.last_notified_at = Some(now);
                    self.last_reminder_at = None;
                    self.down_since = None;
                    Some(Alert::Recovered { down_for })
                }
                GatewayStatus::Unknown => None,
            };
        }

        if self.status == GatewayStatus::Down && self.reminder_due(now) {
            self.last_reminder_at = Some(now);
            return Some(Alert::Reminder {
                down_for: self.down_for(now),
            });
        }

        None
    }

    fn reminder_due(&self, now: Instant) -> bool {
        match self.last_reminder_at {
            Some(last) => now.saturating_duration_since(last) >= self.reminder_interval,
            None => false,
        }
    }

    fn down_for(&self, now: Instant) -> Duration {
        self.down_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default()
    }
}
