//! The HTTP transport capability consumed by the dispatcher.
//!
//! The dispatcher prepares [`PushRequest`]s and hands them to a
//! [`PushTransport`]; anything that can POST bytes with headers can carry
//! push notifications. [`ReqwestTransport`] is the default implementation.

use core::fmt;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::consts::REQUEST_TIMEOUT_SECS;
use crate::error::Error;

/// A prepared push request: one POST to a subscription endpoint.
///
/// An owned value type; reports carry their own copy.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub(crate) endpoint: Url,
    pub(crate) headers: Vec<(&'static str, String)>,
    pub(crate) body: Vec<u8>,
}

impl PushRequest {
    /// The subscription endpoint to POST to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// All headers, in assembly order.
    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request body. Empty for payload-free notifications.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// A push service response.
#[derive(Debug, Clone)]
pub struct PushResponse {
    /// The HTTP status code.
    pub status_code: u16,

    /// Response headers as name/value pairs.
    pub headers: Vec<(String, String)>,

    /// The response body.
    pub body: Vec<u8>,
}

/// A transport-level delivery failure.
///
/// Never raised out of a flush; it travels inside the per-notification
/// [`MessageSentReport`](crate::report::MessageSentReport).
#[derive(Debug, Clone)]
pub struct TransportError {
    /// Human-readable cause.
    pub message: String,

    /// The response, when the failure carried one.
    pub response: Option<PushResponse>,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// The narrow HTTP capability the dispatcher consumes.
///
/// Implementations must be safe to share across concurrent in-flight
/// requests and should enforce a per-request timeout.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// POST the request, yielding the response or a transport error.
    async fn post(&self, request: &PushRequest) -> Result<PushResponse, TransportError>;
}

/// The default transport, backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the default 30-second request timeout.
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("could not build the HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client; timeouts and TLS settings are the caller's.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushTransport for ReqwestTransport {
    async fn post(&self, request: &PushRequest) -> Result<PushResponse, TransportError> {
        let mut builder = self.client.post(request.endpoint().clone());
        for (name, value) in request.headers() {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .body(request.body().to_vec())
            .send()
            .await
            .map_err(|e| TransportError {
                message: e.to_string(),
                response: None,
            })?;

        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError {
                message: e.to_string(),
                response: None,
            })?
            .to_vec();

        Ok(PushResponse {
            status_code,
            headers,
            body,
        })
    }
}
