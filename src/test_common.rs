//! Shared test fixtures.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::consts::{AUTH_SECRET_SIZE, PUBLIC_KEY_SIZE};
use crate::keys;
use crate::message::{ContentEncoding, Subscription};
use crate::vapid::{Vapid, VapidSigner};

/// A known-good VAPID key pair used across the signer tests.
pub const VAPID_PUBLIC_KEY: &str =
    "BA6jvk34k6YjElHQ6S0oZwmrsqHdCNajxcod6KJnI77Dagikfb--O_kYXcR2eflRz6l3PcI2r8fPCH3BElLQHDk";
pub const VAPID_PRIVATE_KEY: &str = "-3CdhFOqjzixgAbUSa0Zv9zi-dwDVmWO7672aBxSFPQ";
pub const VAPID_SUBJECT: &str = "https://test.com";

/// A subscriber-side test setup: the user agent's key pair and auth
/// secret, as they would be minted for `PushManager.subscribe()`.
pub struct TestSetup {
    /// The subscriber's long-term secret.
    pub subscriber_secret: SecretKey,
    /// The `p256dh` value of the subscription, base64url.
    pub p256dh: String,
    /// The `auth` value of the subscription, base64url.
    pub auth: String,
}

impl TestSetup {
    pub fn new() -> Self {
        let subscriber_secret = SecretKey::random(&mut OsRng);
        let p256dh = keys::encode(
            subscriber_secret
                .public_key()
                .to_encoded_point(false)
                .as_bytes(),
        );

        let mut auth = [0u8; AUTH_SECRET_SIZE];
        OsRng.fill_bytes(&mut auth);

        Self {
            subscriber_secret,
            p256dh,
            auth: keys::encode(auth),
        }
    }

    /// The decoded 65-byte subscriber public key.
    pub fn subscriber_public(&self) -> [u8; PUBLIC_KEY_SIZE] {
        keys::decode_public_key(&self.p256dh).unwrap()
    }

    /// The decoded 16-byte auth secret.
    pub fn auth_secret(&self) -> [u8; AUTH_SECRET_SIZE] {
        keys::decode(&self.auth).unwrap().try_into().unwrap()
    }

    /// The subscriber side of the ECDH agreement with a sender key.
    pub fn agree(&self, sender_public: &[u8; PUBLIC_KEY_SIZE]) -> [u8; 32] {
        let sender = p256::PublicKey::from_sec1_bytes(sender_public).unwrap();
        let shared = p256::ecdh::diffie_hellman(
            self.subscriber_secret.to_nonzero_scalar(),
            sender.as_affine(),
        );

        let mut out = [0u8; 32];
        out.copy_from_slice(shared.raw_secret_bytes().as_slice());
        out
    }

    /// A subscription over this setup's key material.
    pub fn subscription(&self, endpoint: &str, encoding: ContentEncoding) -> Subscription {
        Subscription::with_keys(endpoint, &self.p256dh, &self.auth)
            .with_content_encoding(encoding)
    }

    /// A signer over the literal VAPID vectors.
    pub fn vapid_signer() -> VapidSigner {
        Vapid::from_keys(VAPID_SUBJECT, VAPID_PUBLIC_KEY, VAPID_PRIVATE_KEY)
            .validate()
            .unwrap()
    }
}
