//! REST transport
//!
//! The pollers only see the [`Fetcher`] trait, so tests and demos can
//! substitute in-memory sources for the HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Root of every enterprise REST resource
pub const API_PREFIX: &str = "/api/enterprise";

/// Errors raised while fetching a resource
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("Response from {path} is not valid JSON: {message}")]
    Decode { path: String, message: String },

    #[error("Invalid endpoint URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// One GET against the enterprise API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointRequest {
    /// Path below the host, e.g. `/api/enterprise/agents/performance`
    pub path: String,
    #[serde(default)]
    pub query: Vec<(String, String)>,
}

impl EndpointRequest {
    /// Request for `/api/enterprise/<resource>`
    pub fn resource(resource: &str) -> Self {
        Self {
            path: format!("{}/{}", API_PREFIX, resource.trim_matches('/')),
            query: Vec::new(),
        }
    }

    /// Request for `/api/enterprise/<resource>/<id>[/<suffix>]`
    pub fn item(resource: &str, id: &str, suffix: Option<&str>) -> Self {
        let mut request = Self::resource(resource);
        request.path.push('/');
        request.path.push_str(id.trim_matches('/'));
        if let Some(suffix) = suffix {
            request.path.push('/');
            request.path.push_str(suffix.trim_matches('/'));
        }
        request
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Stable key used by the response cache
    pub fn cache_key(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Source of JSON documents
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one resource
    async fn fetch(&self, request: &EndpointRequest) -> Result<Value, FetchError>;
}

/// HTTP implementation backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpFetcher {
    /// Create a fetcher for `base_url` (scheme and host, optional prefix path)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut base = reqwest::Url::parse(base_url).map_err(|e| FetchError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        // Url::join drops the last segment unless the base ends with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                path: base_url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: base,
        })
    }

    fn url_for(&self, request: &EndpointRequest) -> Result<reqwest::Url, FetchError> {
        self.base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| FetchError::InvalidUrl {
                url: request.path.clone(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, request), fields(path = %request.path))]
    async fn fetch(&self, request: &EndpointRequest) -> Result<Value, FetchError> {
        let url = self.url_for(request)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .query(&request.query)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                path: request.path.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered {}", request.path, status);
            return Err(FetchError::Status {
                path: request.path.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            path: request.path.clone(),
            source: e,
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            path: request.path.clone(),
            message: e.to_string(),
        })
    }
}
