//! Pushgate errors.

use core::fmt;

/// A Pushgate error.
///
/// Configuration, payload, crypto and protocol mistakes are raised at the
/// offending call. Transport failures are never raised from a flush; they
/// are folded into [`MessageSentReport`](crate::report::MessageSentReport)s
/// as a [`TransportError`](crate::transport::TransportError).
#[derive(Debug)]
pub enum Error {
    /// A configuration is incomplete or malformed.
    Config(String),
    /// A key or secret decoded to an unexpected length.
    KeyLength {
        /// The length required.
        expected: usize,
        /// The length found after decoding.
        found: usize,
    },
    /// PEM material could not be parsed into a P-256 key pair.
    Pem(String),
    /// Serde JSON error.
    Json(serde_json::Error),
    /// The payload does not fit the padding target or push service record.
    PayloadTooLarge {
        /// The payload length found.
        found: usize,
        /// The largest payload that fits.
        limit: usize,
    },
    /// A payload is present but the subscription carries no content encoding.
    MissingContentEncoding,
    /// URL-safe base64 decoding error.
    Base64(base64ct::Error),
    /// Opaque ECDH, HKDF or symmetric encryption error.
    Crypto,
    /// ES256 signature production error.
    Signature,
    /// No `scheme://host` audience can be built from the endpoint.
    Audience(String),
    /// The push endpoint is not an absolute URL.
    Endpoint(url::ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(s) => write!(f, "invalid configuration: {s}"),
            Self::KeyLength { expected, found } => {
                write!(f, "wrong key length, expected: {expected}, found: {found}")
            }
            Self::Pem(s) => write!(f, "could not parse PEM key material: {s}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::PayloadTooLarge { found, limit } => {
                write!(f, "payload of {found} bytes exceeds the limit of {limit} bytes")
            }
            Self::MissingContentEncoding => {
                write!(f, "the subscription carries no content encoding for the payload")
            }
            Self::Base64(e) => write!(f, "base64 error: {e}"),
            Self::Crypto => write!(f, "key agreement or encryption operation error"),
            Self::Signature => write!(f, "signature operation error"),
            Self::Audience(endpoint) => {
                write!(f, "no audience can be derived from endpoint {endpoint}")
            }
            Self::Endpoint(e) => write!(f, "invalid endpoint URL: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Base64(e) => Some(e),
            Self::Endpoint(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<base64ct::Error> for Error {
    fn from(e: base64ct::Error) -> Self {
        Self::Base64(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::Endpoint(e)
    }
}

impl From<aead::Error> for Error {
    fn from(_: aead::Error) -> Self {
        Self::Crypto
    }
}

impl From<aes_gcm::aes::cipher::InvalidLength> for Error {
    fn from(_: aes_gcm::aes::cipher::InvalidLength) -> Self {
        Self::Crypto
    }
}

impl From<p256::elliptic_curve::Error> for Error {
    fn from(_: p256::elliptic_curve::Error) -> Self {
        Self::Crypto
    }
}

impl From<p256::ecdsa::Error> for Error {
    fn from(_: p256::ecdsa::Error) -> Self {
        Self::Signature
    }
}
