//! Configuration types for the TWS sentinel service
//!
//! Settings come from three layers: built-in defaults, an optional JSON file,
//! and environment variables. The environment is read through a lookup
//! function so the layering can be tested without touching the process
//! environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

/// Environment variable holding the Telegram bot token
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
/// Environment variable holding the Telegram chat id
pub const ENV_CHAT_ID: &str = "CHAT_ID";
pub const ENV_TWS_HOST: &str = "TWS_HOST";
pub const ENV_TWS_PORT: &str = "TWS_PORT";
pub const ENV_TWS_CLIENT_ID: &str = "TWS_CLIENT_ID";
pub const ENV_TWS_TIMEOUT: &str = "TWS_TIMEOUT";
pub const ENV_CONTAINER_LABEL: &str = "CONTAINER_LABEL";
/// Reminder interval in seconds
pub const ENV_HOURLY_REMINDER: &str = "HOURLY_REMINDER";
/// Poll interval in seconds
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL";
pub const ENV_TELEGRAM_API_URL: &str = "TELEGRAM_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Prefix for every message, usually the container name
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(default = "default_reminder_interval", with = "humantime_serde")]
    pub reminder_interval: Duration,
    /// Send "monitoring started/stopped" notices
    #[serde(default = "default_true")]
    pub notify_lifecycle: bool,
    #[serde(default)]
    pub pause_windows: PauseWindowsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            telegram: TelegramConfig::default(),
            label: default_label(),
            poll_interval: default_poll_interval(),
            reminder_interval: default_reminder_interval(),
            notify_lifecycle: true,
            pause_windows: PauseWindowsConfig::default(),
        }
    }
}

/// Where the TWS / IB Gateway API listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_tws_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: i32,
    /// Bound on the connect and on the server time request, each
    #[serde(default = "default_gateway_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_tws_port(),
            client_id: default_client_id(),
            timeout: default_gateway_timeout(),
        }
    }
}

impl GatewayConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Telegram bot credentials and endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    #[serde(default = "default_telegram_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: default_telegram_api_url(),
            timeout: default_telegram_timeout(),
        }
    }
}

// The token is a credential; keep it out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Periods during which the gateway is expected to be offline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseWindowsConfig {
    #[serde(default)]
    pub weekends: Option<WeekendPauseConfig>,
    #[serde(default)]
    pub daily_maintenance: Option<MaintenanceWindowConfig>,
}

/// Pause all of Saturday and Sunday in the given time zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendPauseConfig {
    #[serde(default = "default_weekend_timezone")]
    pub timezone: String,
}

impl Default for WeekendPauseConfig {
    fn default() -> Self {
        Self {
            timezone: default_weekend_timezone(),
        }
    }
}

/// Daily window (inclusive, `HH:MM`) during which the gateway restarts itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceWindowConfig {
    #[serde(default = "default_maintenance_timezone")]
    pub timezone: String,
    #[serde(default = "default_maintenance_start")]
    pub start: String,
    #[serde(default = "default_maintenance_end")]
    pub end: String,
}

impl Default for MaintenanceWindowConfig {
    fn default() -> Self {
        Self {
            timezone: default_maintenance_timezone(),
            start: default_maintenance_start(),
            end: default_maintenance_end(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_tws_port() -> u16 {
    9999
}

fn default_client_id() -> i32 {
    10
}

fn default_gateway_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_label() -> String {
    "TWS".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_reminder_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_true() -> bool {
    true
}

fn default_weekend_timezone() -> String {
    "America/New_York".to_string()
}

fn default_maintenance_timezone() -> String {
    "America/Los_Angeles".to_string()
}

fn default_maintenance_start() -> String {
    "23:45".to_string()
}

fn default_maintenance_end() -> String {
    "23:55".to_string()
}

impl Config {
    /// Overlay settings from environment variables.
    ///
    /// Unset and empty variables leave the current value alone. A variable
    /// that is set but does not parse is a configuration error.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_BOT_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = get(ENV_CHAT_ID) {
            self.telegram.chat_id = chat_id;
        }
        if let Some(url) = get(ENV_TELEGRAM_API_URL) {
            self.telegram.api_url = url;
        }
        if let Some(host) = get(ENV_TWS_HOST) {
            self.gateway.host = host;
        }
        if let Some(port) = get(ENV_TWS_PORT) {
            self.gateway.port = parse_var(ENV_TWS_PORT, &port)?;
        }
        if let Some(client_id) = get(ENV_TWS_CLIENT_ID) {
            self.gateway.client_id = parse_var(ENV_TWS_CLIENT_ID, &client_id)?;
        }
        if let Some(timeout) = get(ENV_TWS_TIMEOUT) {
            self.gateway.timeout = Duration::from_secs(parse_var(ENV_TWS_TIMEOUT, &timeout)?);
        }
        if let Some(label) = get(ENV_CONTAINER_LABEL) {
            self.label = label;
        }
        if let Some(reminder) = get(ENV_HOURLY_REMINDER) {
            self.reminder_interval =
                Duration::from_secs(parse_var(ENV_HOURLY_REMINDER, &reminder)?);
        }
        if let Some(poll) = get(ENV_POLL_INTERVAL) {
            self.poll_interval = Duration::from_secs(parse_var(ENV_POLL_INTERVAL, &poll)?);
        }
        Ok(())
    }

    /// Check that the configuration can drive the service.
    ///
    /// Missing bot credentials are reported together so the operator sees
    /// every missing variable in one run.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.telegram.bot_token.trim().is_empty() {
            missing.push(ENV_BOT_TOKEN);
        }
        if self.telegram.chat_id.trim().is_empty() {
            missing.push(ENV_CHAT_ID);
        }
        if !missing.is_empty() {
            return Err(SentinelError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(SentinelError::Config(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        if self.gateway.timeout.is_zero() {
            return Err(SentinelError::Config(
                "Gateway timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        SentinelError::Config(format!("Invalid value for {}: '{}'", name, value))
    })
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SentinelError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
