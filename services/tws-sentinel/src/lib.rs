//! TWS Sentinel - liveness monitor for the Interactive Brokers TWS API
//!
//! Polls a TWS / IB Gateway API port, tracks up/down transitions, and sends
//! Telegram notifications on changes and while the gateway stays down.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod notifier;
pub mod probe;
pub mod schedule;
pub mod state;
pub mod telegram;

pub use config::{load_config, Config};
pub use error::{Result, SentinelError};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::{dispatch, Engine};
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::{Notification, Notifier};
use crate::probe::{Probe, TwsProbe};
use crate::schedule::PauseSchedule;
use crate::state::HealthState;
use crate::telegram::TelegramNotifier;

/// Assembles a [`Sentinel`] from configuration, with optional injected parts
pub struct SentinelBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    probe: Option<Arc<dyn Probe>>,
    notifiers: Option<Vec<Arc<dyn Notifier>>>,
    cancel: Option<CancellationToken>,
}

impl SentinelBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            probe: None,
            notifiers: None,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = Some(notifiers);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validate the configuration and wire the components.
    ///
    /// Fails before any network activity when a required credential is
    /// missing.
    pub fn build(self) -> Result<Sentinel> {
        self.config.validate()?;
        let schedule = PauseSchedule::from_config(&self.config.pause_windows)?;

        let notifiers = match self.notifiers {
            Some(notifiers) => notifiers,
            None => {
                let http: Arc<dyn HttpClient> = match self.http {
                    Some(http) => http,
                    None => Arc::new(ReqwestHttpClient::with_timeout(
                        self.config.telegram.timeout,
                    )?),
                };
                let telegram = TelegramNotifier::new(&self.config.telegram, http);
                vec![Arc::new(telegram) as Arc<dyn Notifier>]
            }
        };

        let probe: Arc<dyn Probe> = match self.probe {
            Some(probe) => probe,
            None => Arc::new(TwsProbe::new(&self.config.gateway)),
        };
        let cancel = self.cancel.unwrap_or_default();

        tracing::debug!(
            "Built sentinel: target={}, notifiers={}, pause windows={}",
            probe.target(),
            notifiers.len(),
            !schedule.is_empty()
        );

        let engine = Engine::new(
            probe,
            notifiers.clone(),
            &self.config,
            schedule,
            cancel.clone(),
        );

        Ok(Sentinel {
            engine,
            notifiers,
            label: self.config.label,
            notify_lifecycle: self.config.notify_lifecycle,
            cancel,
        })
    }
}

/// A wired service, ready to run
pub struct Sentinel {
    engine: Engine,
    notifiers: Vec<Arc<dyn Notifier>>,
    label: String,
    notify_lifecycle: bool,
    cancel: CancellationToken,
}

impl Sentinel {
    /// Token that stops the service when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until a shutdown signal arrives or the token is cancelled.
    /// Returns the health state the loop ended with.
    pub async fn start(self) -> Result<HealthState> {
        let cancel_for_signal = self.cancel.clone();
        let signal_task = tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            cancel_for_signal.cancel();
        });

        tracing::info!("Starting the TWS API monitoring service");
        if self.notify_lifecycle {
            dispatch(&self.notifiers, &Notification::started(&self.label)).await;
        }

        let state = self.engine.run().await;

        tracing::info!("Shutting down TWS API monitoring service");
        if self.notify_lifecycle {
            dispatch(&self.notifiers, &Notification::stopped(&self.label)).await;
        }

        signal_task.abort();
        Ok(state)
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix (what `docker stop` sends)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
