//! HTTP transport seam.
//!
//! The gateway builds fully signed [`VenueRequest`]s and hands them to a
//! [`Transport`]. Production uses [`HttpTransport`] (reqwest); tests inject
//! [`MockTransport`] with scripted responses.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::trace;

use crate::error::{GatewayError, GatewayResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Default timeout for a single HTTP exchange.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully prepared HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl VenueRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends prepared requests.
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange. Only connection-level failures are errors;
    /// any status code is returned as a response.
    fn send(&self, request: VenueRequest) -> BoxFuture<'_, GatewayResult<RawResponse>>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> GatewayResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: VenueRequest) -> BoxFuture<'_, GatewayResult<RawResponse>> {
        Box::pin(async move {
            trace!(method = %request.method, url = %request.url, "HTTP request");

            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
            };
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| GatewayError::Transport(format!("HTTP request failed: {e}")))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| GatewayError::Transport(format!("Failed to read body: {e}")))?;

            Ok(RawResponse { status, body })
        })
    }
}

/// Scripted transport for testing.
///
/// Responses are returned in the order they were pushed; once the script is
/// exhausted every call fails with a transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: parking_lot::Mutex<VecDeque<GatewayResult<RawResponse>>>,
    requests: parking_lot::Mutex<Vec<VenueRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue a 200 response with the given body.
    pub fn push_ok(&self, body: impl Into<String>) {
        self.push(Ok(RawResponse::ok(body)));
    }

    /// Queue a response with an explicit status code.
    pub fn push_status(&self, status: u16, body: impl Into<String>) {
        self.push(Ok(RawResponse {
            status,
            body: body.into(),
        }));
    }

    /// Queue a connection-level failure.
    pub fn push_transport_error(&self, reason: impl Into<String>) {
        self.push(Err(GatewayError::Transport(reason.into())));
    }

    pub fn push(&self, result: GatewayResult<RawResponse>) {
        self.script.lock().push_back(result);
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<VenueRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: VenueRequest) -> BoxFuture<'_, GatewayResult<RawResponse>> {
        Box::pin(async move {
            self.requests.lock().push(request);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".to_string())))
        })
    }
}
