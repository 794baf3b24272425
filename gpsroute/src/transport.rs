//! HTTP transport abstraction for directions requests.
//!
//! Providers build a [`DirectionsRequest`]; a [`DirectionsTransport`]
//! performs it and returns the raw response body. Failures are reported
//! as a [`TransportError`] carrying a numeric code that the fetcher turns
//! into [`StatusCode::Http`](crate::status::StatusCode::Http).

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::status::StatusCode;

/// The request timed out.
pub const TRANSPORT_TIMEOUT: u32 = 12002;
/// The URL could not be parsed or the request could not be built.
pub const TRANSPORT_INVALID_URL: u32 = 12005;
/// The request was cancelled before it completed.
pub const TRANSPORT_CANCELLED: u32 = 12017;
/// No connection could be established.
pub const TRANSPORT_CANNOT_CONNECT: u32 = 12029;
/// The connection failed after it was established.
pub const TRANSPORT_CONNECTION_ABORTED: u32 = 12030;

/// Default HTTP timeout for directions requests.
pub const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("gpsroute/", env!("CARGO_PKG_VERSION"));

/// A transport failure.
///
/// `code` is either one of the `TRANSPORT_*` constants or the HTTP status
/// of a non-success response, in which case `body` holds whatever the
/// server sent along with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error {code}: {message}")]
pub struct TransportError {
    pub code: u32,
    pub message: String,
    pub body: Option<Vec<u8>>,
}

impl TransportError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body).filter(|b| !b.is_empty());
        self
    }

    pub fn cancelled() -> Self {
        Self::new(TRANSPORT_CANCELLED, "request cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == TRANSPORT_CANCELLED
    }
}

impl From<TransportError> for StatusCode {
    fn from(e: TransportError) -> Self {
        StatusCode::Http(e.code)
    }
}

/// A single HTTP exchange with a directions service.
///
/// A request with a body is sent as a JSON POST, otherwise as a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsRequest {
    pub url: String,
    pub post_body: Option<String>,
    pub referrer: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl DirectionsRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            post_body: None,
            referrer: None,
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            post_body: Some(body.into()),
            ..Self::get(url)
        }
    }

    pub fn with_referrer(mut self, referrer: Option<String>) -> Self {
        self.referrer = referrer.filter(|r| !r.is_empty());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_post(&self) -> bool {
        self.post_body.is_some()
    }
}

/// Performs directions requests.
///
/// Implementations must be cheap to share across tasks; the fetcher holds
/// one behind an `Arc` for its lifetime.
pub trait DirectionsTransport: Send + Sync + 'static {
    /// Sends the request and returns the response body.
    fn send(
        &self,
        request: &DirectionsRequest,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Transport backed by an async `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TRANSPORT_TIMEOUT_SECS)
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                TransportError::new(
                    TRANSPORT_INVALID_URL,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { client })
    }
}

fn classify(e: &reqwest::Error) -> u32 {
    if e.is_timeout() {
        TRANSPORT_TIMEOUT
    } else if e.is_connect() {
        TRANSPORT_CANNOT_CONNECT
    } else if e.is_builder() {
        TRANSPORT_INVALID_URL
    } else {
        TRANSPORT_CONNECTION_ABORTED
    }
}

impl DirectionsTransport for ReqwestTransport {
    async fn send(&self, request: &DirectionsRequest) -> Result<Vec<u8>, TransportError> {
        let url = request.url.as_str();
        trace!(url = url, post = request.is_post(), "directions request starting");

        let mut builder = match &request.post_body {
            Some(body) => self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .body(body.clone()),
            None => self.client.get(url),
        };
        if let Some(referrer) = &request.referrer {
            builder = builder.header("Referer", referrer);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = match builder.send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "directions response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "directions request failed"
                );
                return Err(TransportError::new(classify(&e), e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            return Err(TransportError::new(
                status.as_u16() as u32,
                format!("HTTP {} from {}", status, url),
            )
            .with_body(body));
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "directions response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(TransportError::new(classify(&e), e.to_string()))
            }
        }
    }
}
