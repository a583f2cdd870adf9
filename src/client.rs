//! HTTP client for the analysis endpoint.

use crate::config::EndpointConfig;
use crate::contract::{decode, AnalysisPayload, DecodeError};
use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Why a fetch did not produce a payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection or transport failure.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with anything other than 200 OK.
    #[error("analysis service returned {0}")]
    Status(StatusCode),

    /// No complete response within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The body does not satisfy the payload contract.
    #[error("invalid analysis payload: {0}")]
    Decode(#[from] DecodeError),

    /// A saved payload could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Client for `GET /api/analysis`.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl AnalysisClient {
    /// Create a client for the given resource URL.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?;

        Ok(Self { http, url, timeout })
    }

    pub fn from_config(endpoint: &EndpointConfig) -> Result<Self, FetchError> {
        Self::new(endpoint.url(), endpoint.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and decode one payload snapshot.
    pub async fn fetch(&self) -> Result<AnalysisPayload, FetchError> {
        debug!("GET {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        debug!("Analysis service responded {}", status);
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!("Received {} bytes", body.len());

        Ok(decode(&body)?)
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network {
                url: self.url.clone(),
                source: e,
            }
        }
    }
}
