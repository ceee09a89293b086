//! Delivery outcome reports.

use url::Url;

use crate::transport::{PushRequest, PushResponse, TransportError};

/// The immutable outcome of one notification delivery.
///
/// `success` reflects the transport only: the push service answered,
/// whatever the status code. Status interpretation is the caller's; the
/// [`is_subscription_expired`](Self::is_subscription_expired) helper
/// covers the common case of a gone subscription.
#[derive(Debug, Clone)]
pub struct MessageSentReport {
    request: PushRequest,
    response: Option<PushResponse>,
    success: bool,
    reason: Option<String>,
}

impl MessageSentReport {
    pub(crate) fn delivered(request: PushRequest, response: PushResponse) -> Self {
        Self {
            request,
            response: Some(response),
            success: true,
            reason: None,
        }
    }

    pub(crate) fn failed(request: PushRequest, error: TransportError) -> Self {
        Self {
            request,
            response: error.response,
            success: false,
            reason: Some(error.message),
        }
    }

    /// The push endpoint this report concerns.
    pub fn endpoint(&self) -> &Url {
        self.request.endpoint()
    }

    /// The request that was issued.
    pub fn request(&self) -> &PushRequest {
        &self.request
    }

    /// The response, when the push service answered.
    pub fn response(&self) -> Option<&PushResponse> {
        self.response.as_ref()
    }

    /// Whether the transport completed the exchange.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The failure reason, when the transport did not complete.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// The HTTP status code, when a response arrived.
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status_code)
    }

    /// Whether the push service reported the subscription gone
    /// (404 or 410); callers should drop it from storage.
    pub fn is_subscription_expired(&self) -> bool {
        matches!(self.status(), Some(404 | 410))
    }
}
