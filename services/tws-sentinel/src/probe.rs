//! Gateway probe: one liveness check against the TWS API

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ibapi::Client;
use tokio::time::timeout;

use crate::config::GatewayConfig;
use crate::error::{Result, SentinelError};

/// Result of a single liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { server_time: String },
    Unreachable { reason: String },
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Reachable { server_time } => {
                write!(f, "TWS API is healthy and responsive. Server time: {}", server_time)
            }
            ProbeOutcome::Unreachable { reason } => write!(f, "TWS API unreachable: {}", reason),
        }
    }
}

/// Trait for checking whether the gateway answers
#[async_trait]
pub trait Probe: Send + Sync + fmt::Debug {
    /// What is being probed, for logs
    fn target(&self) -> &str;

    /// Run one check. Failures are reported as [`ProbeOutcome::Unreachable`],
    /// never as errors.
    async fn check(&self) -> ProbeOutcome;
}

/// Probe that opens a fresh API session per check and asks for server time
#[derive(Debug, Clone)]
pub struct TwsProbe {
    address: String,
    client_id: i32,
    timeout: Duration,
}

impl TwsProbe {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            address: config.address(),
            client_id: config.client_id,
            timeout: config.timeout,
        }
    }

    /// Connect, ask for the server clock, disconnect. The client is dropped
    /// on every path, which closes the API session.
    async fn server_time(&self) -> Result<DateTime<Utc>> {
        let client = timeout(
            self.timeout,
            Client::connect(&self.address, self.client_id),
        )
        .await
        .map_err(|_| {
            SentinelError::Timeout(format!(
                "Connection to {} timed out after {:?}",
                self.address, self.timeout
            ))
        })?
        .map_err(|e| {
            SentinelError::Gateway(format!("Connecting to {} failed: {}", self.address, e))
        })?;

        tracing::debug!(
            "Connected to {} as client {}",
            self.address,
            self.client_id
        );

        let answer = timeout(self.timeout, client.server_time()).await;
        drop(client);
        tracing::debug!("Disconnected from {}", self.address);

        let time = answer
            .map_err(|_| {
                SentinelError::Timeout(format!(
                    "Server time request timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| SentinelError::Gateway(format!("Server time request failed: {}", e)))?;

        DateTime::from_timestamp(time.unix_timestamp(), 0).ok_or_else(|| {
            SentinelError::Gateway(format!(
                "Server time {} out of range",
                time.unix_timestamp()
            ))
        })
    }
}

#[async_trait]
impl Probe for TwsProbe {
    fn target(&self) -> &str {
        &self.address
    }

    async fn check(&self) -> ProbeOutcome {
        match self.server_time().await {
            Ok(time) => ProbeOutcome::Reachable {
                server_time: time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            },
            Err(e) => {
                tracing::debug!("Probe of {} failed: {}", self.address, e);
                ProbeOutcome::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
