//! Queueing and dispatching notifications.

use core::fmt;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use log::{debug, warn};
use url::Url;

use crate::consts::{MAX_COMPATIBILITY_PAYLOAD_SIZE, MAX_PAYLOAD_SIZE};
use crate::ece;
use crate::error::Error;
use crate::keys;
use crate::message::{ContentEncoding, Notification, Options, ResolvedOptions};
use crate::report::MessageSentReport;
use crate::transport::{PushRequest, PushTransport, ReqwestTransport};
use crate::vapid::{self, VapidHeaderCache, VapidSigner};

/// The Web Push dispatcher.
///
/// Notifications are queued with [`queue_notification`] and delivered by
/// one of the flush variants. An instance is single-writer: queueing and
/// flushing must not overlap. Within a flush, requests proceed
/// concurrently over the shared transport.
///
/// [`queue_notification`]: Self::queue_notification
pub struct WebPush {
    transport: Arc<dyn PushTransport>,
    defaults: ResolvedOptions,
    vapid: Option<VapidSigner>,
    notifications: Vec<Notification>,
    automatic_padding: usize,
    reuse_vapid_headers: bool,
}

impl fmt::Debug for WebPush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebPush")
            .field("queued", &self.notifications.len())
            .field("vapid", &self.vapid)
            .field("automatic_padding", &self.automatic_padding)
            .field("reuse_vapid_headers", &self.reuse_vapid_headers)
            .finish_non_exhaustive()
    }
}

impl WebPush {
    /// A dispatcher over the default reqwest transport.
    pub fn new() -> Result<Self, Error> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }

    /// A dispatcher over a caller-supplied transport.
    pub fn with_transport(transport: Arc<dyn PushTransport>) -> Self {
        Self {
            transport,
            defaults: ResolvedOptions::default(),
            vapid: None,
            notifications: Vec::new(),
            automatic_padding: MAX_COMPATIBILITY_PAYLOAD_SIZE,
            reuse_vapid_headers: false,
        }
    }

    /// Replace the instance-wide default options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.defaults = options.resolve(&ResolvedOptions::default());
        self
    }

    /// Authenticate every notification with this VAPID signer, unless a
    /// notification carries its own.
    pub fn with_vapid(mut self, vapid: VapidSigner) -> Self {
        self.vapid = Some(vapid);
        self
    }

    /// Reuse VAPID headers across the notifications of one flush instead
    /// of signing per notification. Off by default.
    pub fn set_reuse_vapid_headers(&mut self, reuse: bool) {
        self.reuse_vapid_headers = reuse;
    }

    /// Whether VAPID headers are reused within a flush.
    pub fn reuse_vapid_headers(&self) -> bool {
        self.reuse_vapid_headers
    }

    /// Set the padding target applied before encryption.
    ///
    /// Defaults to [`MAX_COMPATIBILITY_PAYLOAD_SIZE`]; anything above
    /// [`MAX_PAYLOAD_SIZE`] is refused.
    pub fn set_automatic_padding(&mut self, padding: usize) -> Result<(), Error> {
        if padding > MAX_PAYLOAD_SIZE {
            return Err(Error::Config(format!(
                "automatic padding of {padding} exceeds the maximum payload size of \
                 {MAX_PAYLOAD_SIZE}"
            )));
        }
        self.automatic_padding = padding;
        Ok(())
    }

    /// The padding target applied before encryption.
    pub fn automatic_padding(&self) -> usize {
        self.automatic_padding
    }

    /// Queue a notification for the next flush.
    ///
    /// Refuses payloads over [`MAX_PAYLOAD_SIZE`] and payloads targeting a
    /// subscription without a content coding.
    pub fn queue_notification(&mut self, notification: Notification) -> Result<(), Error> {
        check_notification(&notification)?;
        debug!(
            "queueing notification for {}",
            notification.subscription().endpoint()
        );
        self.notifications.push(notification);
        Ok(())
    }

    /// Number of notifications waiting for a flush.
    pub fn queued_count(&self) -> usize {
        self.notifications.len()
    }

    /// Deliver one notification immediately, without touching the queue.
    pub async fn send_one_notification(
        &self,
        notification: Notification,
    ) -> Result<MessageSentReport, Error> {
        check_notification(&notification)?;
        let mut cache = VapidHeaderCache::default();
        let request = self.prepare(&notification, &mut cache)?;
        Ok(send(Arc::clone(&self.transport), request).await)
    }

    /// Drain the queue and deliver it, yielding one report per
    /// notification in enqueue order.
    ///
    /// Notifications are dispatched in batches of `batch_size` (the
    /// instance default when `None`); all requests of a batch are in
    /// flight together, and a batch starts only after the previous one
    /// fully completed. Preparation errors raise here and the queue is
    /// left empty either way; transport failures are folded into the
    /// reports.
    pub fn flush(
        &mut self,
        batch_size: Option<usize>,
    ) -> Result<impl Stream<Item = MessageSentReport> + 'static, Error> {
        let batches = self.prepare_batches(batch_size)?;
        let transport = Arc::clone(&self.transport);

        Ok(stream::iter(batches).flat_map(move |batch| {
            let transport = Arc::clone(&transport);
            let window = batch.len();
            stream::iter(batch)
                .map(move |request| send(Arc::clone(&transport), request))
                .buffered(window)
        }))
    }

    /// Drain the queue and deliver it through a bounded-concurrency pool,
    /// invoking `callback` once per notification in completion order.
    ///
    /// At most `concurrency` requests (the instance default when `None`)
    /// are in flight at a time; batches are still processed sequentially.
    /// Returns once every batch is fully drained.
    pub async fn flush_pooled<F>(
        &mut self,
        mut callback: F,
        batch_size: Option<usize>,
        concurrency: Option<usize>,
    ) -> Result<(), Error>
    where
        F: FnMut(MessageSentReport),
    {
        let concurrency = concurrency.unwrap_or(self.defaults.request_concurrency).max(1);
        let batches = self.prepare_batches(batch_size)?;

        for batch in batches {
            let transport = Arc::clone(&self.transport);
            let mut reports = stream::iter(batch)
                .map(|request| send(Arc::clone(&transport), request))
                .buffer_unordered(concurrency);

            while let Some(report) = reports.next().await {
                callback(report);
            }
        }

        Ok(())
    }

    // Drains the queue, prepares every request up front (so configuration
    // and crypto mistakes raise from the flush call) and groups the
    // requests into batches. The VAPID header cache lives exactly this
    // long.
    fn prepare_batches(
        &mut self,
        batch_size: Option<usize>,
    ) -> Result<Vec<Vec<PushRequest>>, Error> {
        let batch_size = batch_size.unwrap_or(self.defaults.batch_size).max(1);
        let notifications = std::mem::take(&mut self.notifications);

        let mut cache = VapidHeaderCache::default();
        let mut requests = Vec::with_capacity(notifications.len());
        for notification in &notifications {
            requests.push(self.prepare(notification, &mut cache)?);
        }

        Ok(requests
            .chunks(batch_size)
            .map(<[PushRequest]>::to_vec)
            .collect())
    }

    fn prepare(
        &self,
        notification: &Notification,
        cache: &mut VapidHeaderCache,
    ) -> Result<PushRequest, Error> {
        let subscription = notification.subscription();
        let endpoint = Url::parse(subscription.endpoint())?;
        let options = notification.options.resolve(&self.defaults);

        let mut headers: Vec<(&'static str, String)> = Vec::new();
        let mut crypto_key: Option<String> = None;
        let mut body = Vec::new();

        let payload = notification.payload().unwrap_or_default();
        if !payload.is_empty() {
            if let (Some(p256dh), Some(auth)) =
                (subscription.public_key(), subscription.auth_secret())
            {
                let encoding = subscription
                    .content_encoding()
                    .ok_or(Error::MissingContentEncoding)?;
                let encrypted = ece::encrypt(
                    payload,
                    &keys::decode(p256dh)?,
                    &keys::decode(auth)?,
                    encoding,
                    self.automatic_padding,
                )?;

                headers.push(("Content-Type", options.content_type.clone()));
                headers.push(("Content-Encoding", encoding.as_str().to_owned()));
                if encoding == ContentEncoding::AesGcm {
                    headers.push(("Encryption", format!("salt={}", keys::encode(encrypted.salt()))));
                    crypto_key = Some(format!("dh={}", keys::encode(encrypted.local_public())));
                }
                body = encrypted.into_body();
            }
        }

        headers.push(("Content-Length", body.len().to_string()));
        headers.push(("TTL", options.ttl.to_string()));
        if let Some(urgency) = options.urgency {
            headers.push(("Urgency", urgency.as_str().to_owned()));
        }
        if let Some(topic) = &options.topic {
            headers.push(("Topic", topic.clone()));
        }

        let signer = notification.vapid.as_ref().or(self.vapid.as_ref());
        if let (Some(signer), Some(encoding)) = (signer, subscription.content_encoding()) {
            let audience = vapid::audience(&endpoint)?;
            let vapid_headers =
                cache.get_or_sign(signer, &audience, encoding, None, self.reuse_vapid_headers)?;

            headers.push(("Authorization", vapid_headers.authorization));
            if let Some(param) = vapid_headers.crypto_key {
                crypto_key = Some(match crypto_key {
                    Some(existing) => format!("{existing};{param}"),
                    None => param,
                });
            }
        }

        if let Some(value) = crypto_key {
            headers.push(("Crypto-Key", value));
        }

        Ok(PushRequest {
            endpoint,
            headers,
            body,
        })
    }
}

fn check_notification(notification: &Notification) -> Result<(), Error> {
    if let Some(payload) = notification.payload() {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                found: payload.len(),
                limit: MAX_PAYLOAD_SIZE,
            });
        }
        if !payload.is_empty() && notification.subscription().content_encoding().is_none() {
            return Err(Error::MissingContentEncoding);
        }
    }
    Ok(())
}

async fn send(transport: Arc<dyn PushTransport>, request: PushRequest) -> MessageSentReport {
    match transport.post(&request).await {
        Ok(response) => MessageSentReport::delivered(request, response),
        Err(error) => {
            warn!("push delivery to {} failed: {error}", request.endpoint());
            MessageSentReport::failed(request, error)
        }
    }
}
