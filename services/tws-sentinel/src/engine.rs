//! Engine: the health loop that drives the probe and dispatches notifications

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::notifier::{Notification, NotificationKind, Notifier};
use crate::probe::{Probe, ProbeOutcome};
use crate::schedule::PauseSchedule;
use crate::state::{Alert, GatewayStatus, HealthState};

/// What happened during one iteration of the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// A pause window was active; the gateway was not probed
    Paused { reason: String },
    Checked {
        status: GatewayStatus,
        notified: Option<NotificationKind>,
    },
}

/// The engine owns the health state and runs the polling loop
pub struct Engine {
    probe: Arc<dyn Probe>,
    notifiers: Vec<Arc<dyn Notifier>>,
    schedule: PauseSchedule,
    label: String,
    poll_interval: Duration,
    state: HealthState,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        probe: Arc<dyn Probe>,
        notifiers: Vec<Arc<dyn Notifier>>,
        config: &Config,
        schedule: PauseSchedule,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            probe,
            notifiers,
            schedule,
            label: config.label.clone(),
            poll_interval: config.poll_interval,
            state: HealthState::new(config.reminder_interval),
            cancel,
        }
    }

    pub fn state(&self) -> &HealthState {
        &self.state
    }

    /// Run until the cancellation token is triggered. Returns the final state.
    ///
    /// Ticks start a fixed `poll_interval` apart, however long the probe and
    /// notifications take. A tick that overruns the interval delays the next
    /// one instead of bunching them up.
    pub async fn run(mut self) -> HealthState {
        let cancel = self.cancel.clone();
        tracing::info!(
            "Monitoring {} every {:?}",
            self.probe.target(),
            self.poll_interval
        );

        // interval() panics on a zero period
        let mut ticker = tokio::time::interval(self.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.tick() => {}
            }
        }

        tracing::debug!(
            "Health loop for {} cancelled: status {}, last notice {:?} ago",
            self.probe.target(),
            self.state.status(),
            self.state.last_notified_at().map(|at| at.elapsed())
        );
        self.state
    }

    /// One iteration at the current time
    pub async fn tick(&mut self) -> Tick {
        let now = tokio::time::Instant::now().into_std();
        let wall = chrono::Utc::now();
        self.tick_at(now, wall).await
    }

    /// One iteration at an explicit time: pause check, probe, decide, notify
    pub async fn tick_at(&mut self, now: Instant, wall: chrono::DateTime<chrono::Utc>) -> Tick {
        if let Some(reason) = self.schedule.pause_reason(wall) {
            tracing::info!("Monitoring paused: {}", reason);
            return Tick::Paused { reason };
        }

        let outcome = self.check().await;
        let alert = self.state.observe(outcome.is_reachable(), now);
        let status = self.state.status();

        match &outcome {
            ProbeOutcome::Reachable { .. } => tracing::info!("{}", outcome),
            ProbeOutcome::Unreachable { .. } => tracing::warn!("{}", outcome),
        }

        let notified = match alert {
            Some(alert) => {
                let notification = self.notification_for(alert, &outcome);
                self.notify_all(&notification).await;
                Some(notification.kind)
            }
            None => None,
        };

        Tick::Checked { status, notified }
    }

    /// Run the probe on its own task so a panic is contained. Dropping the
    /// set (on cancellation) aborts the check and releases its socket.
    async fn check(&self) -> ProbeOutcome {
        let probe = Arc::clone(&self.probe);
        let mut tasks = JoinSet::new();
        tasks.spawn(async move { probe.check().await });

        match tasks.join_next().await {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => ProbeOutcome::Unreachable {
                reason: format!("Probe task failed: {}", e),
            },
            None => ProbeOutcome::Unreachable {
                reason: "Probe task vanished".to_string(),
            },
        }
    }

    fn notification_for(&self, alert: Alert, outcome: &ProbeOutcome) -> Notification {
        match (alert, outcome) {
            (Alert::Recovered { down_for }, ProbeOutcome::Reachable { server_time }) => {
                tracing::info!("Gateway recovered after {:?}", down_for);
                Notification::recovered(&self.label, server_time)
            }
            (Alert::Reminder { down_for }, ProbeOutcome::Unreachable { reason }) => {
                Notification::reminder(&self.label, down_for, reason)
            }
            (_, ProbeOutcome::Unreachable { reason }) => Notification::down(&self.label, reason),
            // Recovered/Down alerts always follow the matching outcome
            (_, ProbeOutcome::Reachable { server_time }) => {
                Notification::recovered(&self.label, server_time)
            }
        }
    }

    /// Send to every notifier. Failures are logged, never propagated.
    pub async fn notify_all(&self, notification: &Notification) -> usize {
        dispatch(&self.notifiers, notification).await
    }
}

/// Send a notification to every notifier, logging failures.
/// Returns how many notifiers accepted the message.
pub async fn dispatch(notifiers: &[Arc<dyn Notifier>], notification: &Notification) -> usize {
    let mut delivered = 0;
    for notifier in notifiers {
        tracing::debug!(
            "Dispatching {} to '{}': {}",
            notification.kind,
            notifier.type_name(),
            notification.message
        );
        match notifier.notify(notification).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(
                "Notification via '{}' failed: {}",
                notifier.type_name(),
                e
            ),
        }
    }
    delivered
}
