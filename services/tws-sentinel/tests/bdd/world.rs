//! BDD test world for the TWS sentinel service

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use cucumber::World;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use tws_sentinel::config::Config;
use tws_sentinel::engine::Tick;
use tws_sentinel::io::{HttpClient, HttpResponse};
use tws_sentinel::notifier::{Notification, Notifier};
use tws_sentinel::probe::{Probe, ProbeOutcome};
use tws_sentinel::state::GatewayStatus;
use tws_sentinel::SentinelError;

#[derive(Debug, Default, World)]
pub struct SentinelWorld {
    // Health loop testing
    pub config: Config,
    pub probe: Option<Arc<ScriptedProbe>>,
    pub recorder: Option<Arc<RecordingNotifier>>,
    pub ticks: Vec<Tick>,

    // Notifier testing
    pub http: Option<Arc<RecordingHttpClient>>,
    pub notifier: Option<Box<dyn Notifier>>,
    pub notification_result: Option<tws_sentinel::Result<()>>,

    // Configuration testing
    pub env: HashMap<String, String>,
    pub config_error: Option<SentinelError>,

    // Lifecycle testing
    pub cancel: Option<CancellationToken>,
    pub final_status: Option<GatewayStatus>,
}

// --- Test doubles ---

/// A probe that replays scripted answers, then repeats the last one
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    script: RwLock<VecDeque<bool>>,
    last: RwLock<bool>,
    calls: RwLock<u32>,
}

impl ScriptedProbe {
    pub fn new(script: Vec<bool>) -> Self {
        Self {
            script: RwLock::new(script.into()),
            last: RwLock::new(true),
            calls: RwLock::new(0),
        }
    }

    pub async fn calls(&self) -> u32 {
        *self.calls.read().await
    }
}

#[async_trait::async_trait]
impl Probe for ScriptedProbe {
    fn target(&self) -> &str {
        "scripted-gateway:4002"
    }

    async fn check(&self) -> ProbeOutcome {
        *self.calls.write().await += 1;
        let reachable = match self.script.write().await.pop_front() {
            Some(reachable) => reachable,
            None => *self.last.read().await,
        };
        *self.last.write().await = reachable;

        if reachable {
            ProbeOutcome::Reachable {
                server_time: "2026-10-20 15:00:00 UTC".to_string(),
            }
        } else {
            ProbeOutcome::Unreachable {
                reason: "Connecting to scripted-gateway:4002 failed: Connection refused"
                    .to_string(),
            }
        }
    }
}

/// A notifier that keeps every notification it is handed
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: RwLock<Vec<Notification>>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn type_name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, notification: &Notification) -> tws_sentinel::Result<()> {
        self.sent.write().await.push(notification.clone());
        Ok(())
    }
}

/// A recorded form POST
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

/// An HTTP client that records requests and answers with a canned response,
/// or fails every request when no response is set
#[derive(Debug, Default)]
pub struct RecordingHttpClient {
    pub response: Option<HttpResponse>,
    pub requests: RwLock<Vec<RecordedRequest>>,
}

impl RecordingHttpClient {
    pub fn answering(status: u16, body: &str) -> Self {
        Self {
            response: Some(HttpResponse {
                status,
                body: body.to_string(),
            }),
            requests: RwLock::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub async fn last_param(&self, name: &str) -> Option<String> {
        let requests = self.requests.read().await;
        requests.last().and_then(|r| {
            r.params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for RecordingHttpClient {
    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> tws_sentinel::Result<HttpResponse> {
        self.requests.write().await.push(RecordedRequest {
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self.response
            .clone()
            .ok_or_else(|| SentinelError::Http("connection refused".to_string()))
    }
}
