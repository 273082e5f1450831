//! The request gateway.
//!
//! A call is one logical request. It may take several attempts:
//!
//! 1. Signed calls pick the next credential once, up front.
//! 2. Attempt `k` goes out through route `(base + k) mod n` when egress
//!    routes are configured; before every attempt after the first, that
//!    route's tunnel is recycled.
//! 3. Each attempt is signed again with a fresh nonce.
//! 4. Retryable failures back off per [`RetryPolicy`]; others return at once.
//! 5. The shared route index advances by one when the call ends, whatever
//!    the outcome, and the whole sequence is bounded by the deadline.

use std::sync::Arc;
use std::time::Duration;

use qg_telemetry::Metrics;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::egress::{EgressRoute, EgressStrategy, StaticEgress};
use crate::envelope::Envelope;
use crate::error::{GatewayError, GatewayResult};
use crate::nonce::{Clock, NonceManager, SystemClock};
use crate::retry::RetryPolicy;
use crate::signer::{
    signed_body, Credentials, APIKEY_HEADER, PAYLOAD_HEADER, SIGNATURE_HEADER,
};
use crate::state::GatewayState;
use crate::transport::{HttpMethod, Transport, VenueRequest};

/// Default bound on a whole attempt sequence.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Venue origin used when no egress route is configured.
    pub base_url: String,
    pub retry: RetryPolicy,
    pub deadline: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

enum Call<'a> {
    Get {
        query: &'a [(String, String)],
    },
    Post {
        fields: &'a Value,
        credential: &'a Credentials,
    },
}

impl Call<'_> {
    fn method(&self) -> HttpMethod {
        match self {
            Self::Get { .. } => HttpMethod::Get,
            Self::Post { .. } => HttpMethod::Post,
        }
    }
}

/// Signed, retrying gateway to one venue.
///
/// Safe to share across tasks; rotation state is atomic.
pub struct Gateway {
    config: GatewayConfig,
    credentials: Vec<Credentials>,
    routes: Vec<EgressRoute>,
    state: GatewayState,
    nonce: NonceManager<Arc<dyn Clock>>,
    transport: Arc<dyn Transport>,
    egress: Arc<dyn EgressStrategy>,
}

impl Gateway {
    /// Gateway with no credentials and no egress routes.
    pub fn new(config: GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            credentials: Vec::new(),
            routes: Vec::new(),
            state: GatewayState::new(0, 0),
            nonce: NonceManager::new(Arc::new(SystemClock)),
            transport,
            egress: Arc::new(StaticEgress),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Vec<Credentials>) -> Self {
        self.credentials = credentials;
        self.state = GatewayState::new(self.credentials.len(), self.routes.len());
        self
    }

    #[must_use]
    pub fn with_routes(
        mut self,
        routes: Vec<EgressRoute>,
        egress: Arc<dyn EgressStrategy>,
    ) -> Self {
        self.routes = routes;
        self.egress = egress;
        self.state = GatewayState::new(self.credentials.len(), self.routes.len());
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.nonce = NonceManager::new(clock);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Last nonce used for signing.
    pub fn last_nonce(&self) -> u64 {
        self.nonce.last()
    }

    /// Signed POST of `{request: path, nonce, ...fields}`; returns the decoded
    /// `result` of the response envelope.
    pub async fn post<T: DeserializeOwned>(&self, path: &str, fields: Value) -> GatewayResult<T> {
        let index = self
            .state
            .select_credential()
            .ok_or(GatewayError::NoCredentials)?;
        let credential = self
            .credentials
            .get(index)
            .ok_or(GatewayError::NoCredentials)?;
        Metrics::credential_selected(index);
        debug!(path, credential = index, "Signed venue call");

        self.execute(
            path,
            Call::Post {
                fields: &fields,
                credential,
            },
        )
        .await
    }

    /// Unsigned GET with query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> GatewayResult<T> {
        self.execute(path, Call::Get { query }).await
    }

    async fn execute<T: DeserializeOwned>(&self, path: &str, call: Call<'_>) -> GatewayResult<T> {
        let base = self.state.route_base();
        let outcome = tokio::time::timeout(self.config.deadline, self.attempts(path, &call, base)).await;
        self.state.advance_route();

        match outcome {
            Ok(envelope) => envelope?.into_result(),
            Err(_) => {
                warn!(
                    path,
                    deadline_ms = self.config.deadline.as_millis() as u64,
                    "Venue call deadline exceeded"
                );
                Metrics::gateway_attempt(call.method().as_str(), "deadline");
                Err(GatewayError::DeadlineExceeded {
                    deadline_ms: self.config.deadline.as_millis() as u64,
                })
            }
        }
    }

    async fn attempts(
        &self,
        path: &str,
        call: &Call<'_>,
        base: Option<usize>,
    ) -> GatewayResult<Envelope> {
        let method = call.method().as_str();
        let mut attempt: u32 = 0;

        loop {
            let route = base
                .and_then(|b| self.routes.get((b + attempt as usize) % self.routes.len()));

            if attempt > 0 {
                if let Some(route) = route {
                    let recycled = self.egress.recycle(route).await;
                    Metrics::egress_recycled(&route.name, recycled.is_ok());
                    recycled?;
                }
            }

            debug!(
                path,
                attempt,
                route = route.map(|r| r.name.as_str()).unwrap_or("direct"),
                "Venue attempt"
            );

            let request = self.build_request(path, call, route)?;
            let result = match self.transport.send(request).await {
                Ok(raw) => Envelope::from_response(&raw),
                Err(e) => Err(e),
            };

            let err = match result {
                Ok(envelope) => {
                    Metrics::gateway_attempt(method, "ok");
                    return Ok(envelope);
                }
                Err(err) => err,
            };

            Metrics::gateway_attempt(method, err.kind());
            if !err.is_retryable() {
                return Err(err);
            }

            match self.config.retry.backoff_after(attempt) {
                Some(delay) => {
                    warn!(
                        path,
                        attempt,
                        error = %err,
                        backoff_ms = delay.as_millis() as u64,
                        "Venue attempt failed, backing off"
                    );
                    Metrics::gateway_backoff(method, delay.as_secs_f64());
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(path, attempts = attempt + 1, error = %err, "Venue call failed");
                    return Err(err);
                }
            }
            attempt += 1;
        }
    }

    fn build_request(
        &self,
        path: &str,
        call: &Call<'_>,
        route: Option<&EgressRoute>,
    ) -> GatewayResult<VenueRequest> {
        let origin = match route {
            Some(route) => route.base_url(),
            None => self.config.base_url.trim_end_matches('/').to_string(),
        };
        let url = format!("{origin}{path}");

        match call {
            Call::Get { query } => Ok(VenueRequest {
                method: HttpMethod::Get,
                url,
                headers: Vec::new(),
                query: query.to_vec(),
                body: None,
            }),
            Call::Post { fields, credential } => {
                let body = signed_body(path, self.nonce.next(), fields)?;
                let signed = credential.sign(&body)?;
                Ok(VenueRequest {
                    method: HttpMethod::Post,
                    url,
                    headers: vec![
                        (APIKEY_HEADER.to_string(), credential.key().to_string()),
                        (PAYLOAD_HEADER.to_string(), signed.payload),
                        (SIGNATURE_HEADER.to_string(), signed.signature),
                        ("Content-Type".to_string(), "application/json".to_string()),
                    ],
                    query: Vec::new(),
                    body: Some(signed.body),
                })
            }
        }
    }
}
