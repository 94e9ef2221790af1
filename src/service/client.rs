//! HTTP client for the remote mutation service.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::models::MutationResponse;
use crate::request::MutationRequest;

/// The two calls the client makes against the mutation service.
///
/// [`HttpMutatorClient`] is the real implementation; tests substitute
/// in-memory doubles.
pub trait MutatorApi: Send + Sync + 'static {
    /// `POST /mutate`.
    fn mutate(
        &self,
        request: &MutationRequest,
    ) -> impl Future<Output = Result<MutationResponse, FetchError>> + Send;

    /// `GET /health`. Returns the plain-text body on a 2xx reply.
    fn health(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Extra time the transport allows beyond the configured request timeout.
pub const TIMEOUT_SLACK: Duration = Duration::from_secs(2);

/// Connection settings for [`HttpMutatorClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL of the service (e.g. `http://localhost:8080`).
    pub base_url: String,
    /// Number used in the `/api/v{n}` prefix.
    pub api_version: u32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl HttpClientConfig {
    /// Defaults: API version 1, 3 s connect timeout, 10 s request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: 1,
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// reqwest-backed [`MutatorApi`].
pub struct HttpMutatorClient {
    config: HttpClientConfig,
    client: reqwest::Client,
}

impl HttpMutatorClient {
    pub fn builder(base_url: impl Into<String>) -> HttpMutatorClientBuilder {
        HttpMutatorClientBuilder::new(base_url)
    }

    /// Client for `config`. The transport timeout sits [`TIMEOUT_SLACK`]
    /// past `request_timeout`, so a stalled call ends as the cache's
    /// `FetchError::Timeout` rather than a reqwest network error.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::builder(config.base_url.clone())
            .api_version(config.api_version)
            .connect_timeout(config.connect_timeout())
            .request_timeout(config.request_timeout() + TIMEOUT_SLACK)
            .build()
    }

    /// Full URL of `endpoint` under the versioned prefix.
    pub fn route(&self, endpoint: &str) -> String {
        format!(
            "{}/api/v{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            endpoint
        )
    }

    async fn read_error_body(resp: reqwest::Response, url: String) -> FetchError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        FetchError::Http { status, url, body }
    }
}

impl MutatorApi for HttpMutatorClient {
    async fn mutate(&self, request: &MutationRequest) -> Result<MutationResponse, FetchError> {
        let url = self.route("mutate");
        debug!(url = %url, chars = request.text().chars().count(), "posting mutation request");

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(Self::read_error_body(resp, url).await);
        }

        let bytes = resp.bytes().await.map_err(|e| FetchError::Network {
            url: url.clone(),
            detail: e.to_string(),
        })?;

        serde_json::from_slice::<MutationResponse>(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn health(&self) -> Result<String, FetchError> {
        let url = self.route("health");
        let resp = self.client.get(&url).send().await.map_err(|e| FetchError::Network {
            url: url.clone(),
            detail: e.to_string(),
        })?;

        if !resp.status().is_success() {
            return Err(Self::read_error_body(resp, url).await);
        }

        resp.text().await.map_err(|e| FetchError::Network {
            url,
            detail: e.to_string(),
        })
    }
}

/// Builder for [`HttpMutatorClient`].
pub struct HttpMutatorClientBuilder {
    config: HttpClientConfig,
}

impl HttpMutatorClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { config: HttpClientConfig::new(base_url) }
    }

    pub fn api_version(mut self, version: u32) -> Self {
        self.config.api_version = version;
        self
    }

    /// Override the TCP connect timeout (default 3 s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Override the per-request timeout (default 10 s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> HttpMutatorClient {
        // A client that fails to build with timeouts falls back to the default
        // client instead of panicking.
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .build()
            .unwrap_or_default();

        HttpMutatorClient { config: self.config, client }
    }
}
