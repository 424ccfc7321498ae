//! HTTP transport.

use std::time::Duration;

use anyhow::{Context, Result};

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs GET requests.
///
/// Transport failures are errors; non-success statuses are returned as
/// responses so callers can decide how to degrade.
pub trait HttpFetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Blocking `reqwest` client with a request timeout.
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(ReqwestFetcher { client })
    }
}

impl HttpFetcher for ReqwestFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to request {}", url))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .with_context(|| format!("failed to read response body from {}", url))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
