#![doc = include_str!("../README.md")]
#![deny(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    unsafe_code
)]
//! ### Content codings
//!
//! Modern user agents accept the `aes128gcm` coding of RFC 8291; older
//! ones only understand its `aesgcm` predecessor, which moves the salt and
//! sender key out of the body into the `Encryption` and `Crypto-Key`
//! headers. The coding is part of the [`Subscription`] and every layer
//! below follows it.
//!
//! ### Delivery model
//!
//! A [`WebPush`] instance owns a queue and a shared HTTP transport.
//! [`WebPush::flush`] drains the queue and yields one
//! [`MessageSentReport`] per notification in enqueue order;
//! [`WebPush::flush_pooled`] trades ordering for a bounded pool of
//! in-flight requests. Configuration and encryption mistakes raise from
//! the flush call itself, while network failures are folded into the
//! per-notification reports.

pub mod client;
pub mod consts;
pub mod ece;
pub mod error;
pub mod keys;
pub mod message;
pub mod report;
pub mod transport;
pub mod vapid;

pub use client::WebPush;
pub use error::Error;
pub use keys::{create_vapid_keys, VapidKeys};
pub use message::{
    ContentEncoding, Notification, Options, Subscription, SubscriptionKeys, Urgency,
};
pub use report::MessageSentReport;
pub use transport::{
    PushRequest, PushResponse, PushTransport, ReqwestTransport, TransportError,
};
pub use vapid::{Vapid, VapidHeaders, VapidSigner};

#[cfg(test)]
mod test_common;
