//! Outbound HTTP GET with a fixed browser identity.
//!
//! # Responsibilities
//! - Reject URLs that are not absolute http(s) before touching the network
//! - Enforce the configured connect and total timeouts
//! - Surface non-2xx statuses as errors
//! - Return the body as bytes together with the declared content type

use std::error::Error as _;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::FetchConfig;
use crate::fetch::resource::FetchedResource;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("upstream {url} responded with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn transport(source: reqwest::Error) -> Self {
        // reqwest's Display omits the underlying cause; keep the chain.
        let mut message = source.to_string();
        let mut cause = source.source();
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        Self::Transport { message, source }
    }
}

/// Shared outbound client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FetchGateway {
    client: Client,
    timeout_secs: u64,
}

impl FetchGateway {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(FetchError::Client)?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Parse `raw` as an absolute http(s) URL.
    pub fn parse_target(raw: &str) -> Result<Url, FetchError> {
        let url = Url::parse(raw.trim()).map_err(|source| FetchError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }

    pub async fn fetch(&self, raw: &str) -> Result<FetchedResource, FetchError> {
        let url = Self::parse_target(raw)?;
        let start = Instant::now();

        let response = self.client.get(url.clone()).send().await.map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = %status, "Upstream returned error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| self.classify(&url, e))?;

        tracing::debug!(
            url = %url,
            status = %status,
            content_type = ?content_type,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upstream fetched"
        );

        Ok(FetchedResource {
            url,
            content_type,
            body,
        })
    }

    fn classify(&self, url: &Url, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            FetchError::transport(err)
        }
    }
}
