//! Subscriptions, notifications and delivery options.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONTENT_TYPE, DEFAULT_REQUEST_CONCURRENCY, DEFAULT_TTL,
};
use crate::error::Error;
use crate::vapid::VapidSigner;

/// Supported content codings.
///
/// The string values appear bit-exact in the `Content-Encoding` header.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum ContentEncoding {
    /// The legacy coding from draft-ietf-webpush-encryption-04. Salt and
    /// sender key travel in the `Encryption` and `Crypto-Key` headers.
    #[serde(rename = "aesgcm")]
    AesGcm,

    /// The RFC 8188 coding standardized by RFC 8291. Salt and sender key
    /// are carried in the body framing.
    #[serde(rename = "aes128gcm")]
    Aes128Gcm,
}

impl ContentEncoding {
    /// The wire value of this coding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AesGcm => "aesgcm",
            Self::Aes128Gcm => "aes128gcm",
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency values of RFC 8030 §5.3, ordered from least to most urgent.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// Deliverable on power and Wi-Fi.
    VeryLow,
    /// Deliverable on power or Wi-Fi.
    Low,
    /// The default urgency.
    Normal,
    /// Time-critical.
    High,
}

impl Urgency {
    /// The wire value for the `Urgency` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// Subscriber key material as delivered by the user agent.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct SubscriptionKeys {
    /// The subscriber public key (`p256dh`), base64url.
    pub p256dh: String,

    /// The 16-byte authentication secret, base64url.
    pub auth: String,
}

/// A push subscription, immutable after construction.
///
/// Deserializes from the JSON produced by `PushSubscription.toJSON()` in
/// the browser. A subscription that carries keys but no explicit coding
/// defaults to [`ContentEncoding::AesGcm`].
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiration_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_encoding: Option<ContentEncoding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    keys: Option<SubscriptionKeys>,
}

impl Subscription {
    /// A key-less subscription. Only payload-free notifications can be
    /// delivered to it.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            expiration_time: None,
            content_encoding: None,
            keys: None,
        }
    }

    /// A subscription with subscriber key material, defaulting to the
    /// widely supported `aesgcm` coding.
    pub fn with_keys(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            expiration_time: None,
            content_encoding: Some(ContentEncoding::AesGcm),
            keys: Some(SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            }),
        }
    }

    /// Replace the content coding.
    pub fn with_content_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.content_encoding = Some(encoding);
        self
    }

    /// Attach the expiration timestamp reported by the user agent.
    pub fn with_expiration_time(mut self, epoch_seconds: i64) -> Self {
        self.expiration_time = Some(epoch_seconds);
        self
    }

    /// Deserialize from browser subscription JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    /// The push service endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The subscriber public key, base64url, if any.
    pub fn public_key(&self) -> Option<&str> {
        self.keys.as_ref().map(|k| k.p256dh.as_str())
    }

    /// The subscriber authentication secret, base64url, if any.
    pub fn auth_secret(&self) -> Option<&str> {
        self.keys.as_ref().map(|k| k.auth.as_str())
    }

    /// The effective content coding: the stored one, or `aesgcm` when key
    /// material is present without an explicit coding.
    pub fn content_encoding(&self) -> Option<ContentEncoding> {
        self.content_encoding
            .or_else(|| self.keys.as_ref().map(|_| ContentEncoding::AesGcm))
    }

    /// Subscription expiration as epoch seconds, if the user agent
    /// reported one.
    pub fn expiration_time(&self) -> Option<i64> {
        self.expiration_time
    }
}

/// Delivery options.
///
/// Every field is optional; unset fields fall back to the instance-wide
/// defaults, which in turn fall back to the protocol defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options {
    /// How long the push service should retain the notification, in
    /// seconds. Defaults to four weeks.
    pub ttl: Option<u32>,

    /// Delivery urgency.
    pub urgency: Option<Urgency>,

    /// Topic token, letting a newer notification replace a pending one.
    pub topic: Option<String>,

    /// Notifications dispatched per batch. Defaults to 1000.
    pub batch_size: Option<usize>,

    /// In-flight requests for the pooled flush. Defaults to 100.
    pub request_concurrency: Option<usize>,

    /// `Content-Type` for encrypted bodies. Defaults to
    /// `application/octet-stream`.
    pub content_type: Option<String>,
}

impl Options {
    pub(crate) fn resolve(&self, defaults: &ResolvedOptions) -> ResolvedOptions {
        ResolvedOptions {
            ttl: self.ttl.unwrap_or(defaults.ttl),
            urgency: self.urgency.or(defaults.urgency),
            topic: self.topic.clone().or_else(|| defaults.topic.clone()),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size).max(1),
            request_concurrency: self
                .request_concurrency
                .unwrap_or(defaults.request_concurrency)
                .max(1),
            content_type: self
                .content_type
                .clone()
                .unwrap_or_else(|| defaults.content_type.clone()),
        }
    }
}

/// Options with every fallback applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub ttl: u32,
    pub urgency: Option<Urgency>,
    pub topic: Option<String>,
    pub batch_size: usize,
    pub request_concurrency: usize,
    pub content_type: String,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            urgency: None,
            topic: None,
            batch_size: DEFAULT_BATCH_SIZE,
            request_concurrency: DEFAULT_REQUEST_CONCURRENCY,
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
        }
    }
}

/// A notification waiting in the queue.
///
/// Owned by the queue from [`WebPush::queue_notification`] until a flush
/// drains and consumes it.
///
/// [`WebPush::queue_notification`]: crate::client::WebPush::queue_notification
#[derive(Debug)]
pub struct Notification {
    pub(crate) subscription: Subscription,
    pub(crate) payload: Option<Vec<u8>>,
    pub(crate) options: Options,
    pub(crate) vapid: Option<VapidSigner>,
}

impl Notification {
    /// A payload-free notification for `subscription`.
    pub fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            payload: None,
            options: Options::default(),
            vapid: None,
        }
    }

    /// Attach an opaque payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Override delivery options for this notification only.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Override the VAPID signer for this notification only.
    pub fn with_vapid(mut self, vapid: VapidSigner) -> Self {
        self.vapid = Some(vapid);
        self
    }

    /// The target subscription.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// The payload, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}
