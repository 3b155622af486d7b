//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, SentinelError};

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a POST request with form-encoded body
    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// Production HTTP client using reqwest
///
/// Request URLs may embed credentials (Telegram puts the bot token in the
/// path), so only the host is logged and errors are stripped of their URL.
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client whose requests fail after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SentinelError::Http(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "<invalid url>".to_string())
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<HttpResponse> {
        let host = host_of(url);
        tracing::debug!("POST {}", host);
        let response = self
            .client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| SentinelError::Http(format!("POST {} failed: {}", host, e.without_url())))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SentinelError::Http(format!("Reading response body: {}", e.without_url())))?;

        tracing::debug!("POST {} -> {} ({} bytes)", host, status, body.len());
        Ok(HttpResponse { status, body })
    }
}
