//! Outbound HTTP gateway for upstream provider requests
//!
//! Wraps `reqwest` with a base URL, a per-attempt deadline, and bounded
//! retries for idempotent GETs. The whole fetch path can be substituted via
//! [`HttpClient::with_fetch_override`] so tests never open sockets.

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

/// Default per-attempt timeout when none is configured
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry budget for transient failures
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay unit between retry attempts (linear backoff)
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Errors from the gateway itself
///
/// Non-2xx statuses are not errors at this layer; they come back as a normal
/// [`HttpResponse`] so callers can classify them against the upstream's
/// error conventions.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The per-attempt deadline elapsed before a response arrived
    #[error("deadline exceeded fetching {0}")]
    DeadlineExceeded(String),

    /// Connection, TLS, or protocol failure below the HTTP layer
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Uniform result of a gateway GET
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Replacement for the whole fetch path, used by tests
pub type FetchFn =
    Box<dyn Fn(String) -> BoxFuture<'static, Result<HttpResponse, HttpError>> + Send + Sync>;

/// Options for constructing an [`HttpClient`]
#[derive(Debug, Default)]
pub struct HttpOptions {
    /// Base URL that relative request paths resolve against
    pub base_url: Option<String>,
    /// Per-attempt deadline (defaults to 30s)
    pub timeout: Option<Duration>,
    /// Retry budget for transport errors, deadline hits, and 5xx (defaults to 3)
    pub max_retries: Option<u32>,
}

/// HTTP client with base-URL resolution, deadlines, and bounded retries
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    fetch_override: Option<FetchFn>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("fetch_override", &self.fetch_override.is_some())
            .finish()
    }
}

impl HttpClient {
    /// Creates a client from the given options, filling in defaults
    pub fn new(options: HttpOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: options.base_url.unwrap_or_default(),
            timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
            max_retries: options.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            fetch_override: None,
        }
    }

    /// Substitutes the entire fetch function; retries and deadlines are
    /// bypassed so tests observe exactly one call per `get`.
    pub fn with_fetch_override(mut self, fetch: FetchFn) -> Self {
        self.fetch_override = Some(fetch);
        self
    }

    /// Issues a GET for `path`, resolving it against the base URL unless it
    /// is already absolute. Retries transport errors, deadline hits, and 5xx
    /// responses up to the configured budget.
    pub async fn get(&self, path: &str) -> Result<HttpResponse, HttpError> {
        let url = self.resolve_url(path);

        if let Some(fetch) = &self.fetch_override {
            return fetch(url).await;
        }

        let mut attempt: u32 = 0;
        loop {
            match self.get_once(&url).await {
                Ok(response) if response.status < 500 => return Ok(response),
                Ok(response) => {
                    if attempt >= self.max_retries {
                        return Ok(response);
                    }
                    tracing::warn!(url = %url, status = response.status, attempt, "retrying upstream request");
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    tracing::warn!(url = %url, error = %err, attempt, "retrying upstream request");
                }
            }
            attempt += 1;
            tokio::time::sleep(RETRY_BACKOFF * attempt).await;
        }
    }

    /// Single request attempt under the configured deadline
    async fn get_once(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();
            Ok(HttpResponse { status, body })
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(HttpError::DeadlineExceeded(url.to_string())),
        }
    }

    /// Absolute URLs bypass the base; relative paths are appended to it
    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}
