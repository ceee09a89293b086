//! Encrypted content encoding for Web Push payloads.
//!
//! Implements the message encryption of RFC 8291 (`aes128gcm`) and its
//! draft-04 predecessor (`aesgcm`). Both schemes agree on a fresh ECDH
//! shared secret with the subscriber key, bind the subscription's
//! authentication secret through HKDF-SHA256, and seal a single padded
//! AES-128-GCM record. They differ in the HKDF info strings, the padding
//! layout, and where salt and sender key travel: in HTTP headers for
//! `aesgcm`, in a body header block for `aes128gcm`.

mod aes128gcm;
mod aesgcm;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use hkdf::Hkdf;
use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::consts::*;
use crate::error::Error;
use crate::keys;
use crate::message::ContentEncoding;

/// An encrypted notification payload.
///
/// For `aes128gcm` the body is self-contained; for `aesgcm` the salt and
/// sender public key must be surfaced in the `Encryption` and `Crypto-Key`
/// headers alongside it.
#[derive(Debug)]
pub struct EncryptedPayload {
    body: Vec<u8>,
    salt: [u8; SALT_SIZE],
    local_public: [u8; PUBLIC_KEY_SIZE],
    encoding: ContentEncoding,
}

impl EncryptedPayload {
    /// The request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the payload, yielding the request body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// The per-message salt.
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }

    /// The freshly generated sender public key.
    pub fn local_public(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.local_public
    }

    /// The coding this payload was produced for.
    pub fn encoding(&self) -> ContentEncoding {
        self.encoding
    }
}

/// Encrypt `payload` for a subscriber.
///
/// `subscriber_public` is the subscription's `p256dh` key (65-byte SEC1 or
/// bare 64-byte point), `auth_secret` its 16-byte `auth` secret. A fresh
/// sender key pair and salt are generated per call, so encrypting the same
/// payload twice never yields the same bytes. Plaintext is padded up to
/// `padding` bytes before sealing; payloads longer than that are refused.
pub fn encrypt(
    payload: &[u8],
    subscriber_public: &[u8],
    auth_secret: &[u8],
    encoding: ContentEncoding,
    padding: usize,
) -> Result<EncryptedPayload, Error> {
    let subscriber_public = keys::public_key_from_raw(subscriber_public)?;
    let auth_secret: [u8; AUTH_SECRET_SIZE] =
        auth_secret.try_into().map_err(|_| Error::KeyLength {
            expected: AUTH_SECRET_SIZE,
            found: auth_secret.len(),
        })?;

    let local_secret = EphemeralSecret::random(&mut OsRng);
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let remote = PublicKey::from_sec1_bytes(&subscriber_public)?;
    let shared = local_secret.diffie_hellman(&remote);

    let mut local_public = [0u8; PUBLIC_KEY_SIZE];
    local_public.copy_from_slice(local_secret.public_key().to_encoded_point(false).as_bytes());

    let body = match encoding {
        ContentEncoding::AesGcm => {
            let (key, nonce) = aesgcm::derive(
                &auth_secret,
                shared.raw_secret_bytes().as_slice(),
                &salt,
                &subscriber_public,
                &local_public,
            )?;
            let padded = aesgcm::pad(payload, padding)?;

            seal(&key, &nonce, &padded)?
        }
        ContentEncoding::Aes128Gcm => {
            let (key, nonce) = aes128gcm::derive(
                &auth_secret,
                shared.raw_secret_bytes().as_slice(),
                &salt,
                &subscriber_public,
                &local_public,
            )?;
            let padded = aes128gcm::pad(payload, padding)?;
            let ciphertext = seal(&key, &nonce, &padded)?;

            aes128gcm::frame(&salt, &local_public, padded.len(), ciphertext)
        }
    };

    Ok(EncryptedPayload {
        body,
        salt,
        local_public,
        encoding,
    })
}

/// HKDF-SHA256 extract-then-expand.
pub(crate) fn hkdf(salt: &[u8], ikm: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error> {
    Hkdf::<Sha256>::new(Some(salt), ikm)
        .expand(info, okm)
        .map_err(|_| Error::Crypto)
}

fn seal(key: &[u8; KEY_SIZE], nonce: &[u8; IV_SIZE], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    let aead = Aes128Gcm::new_from_slice(key)?;
    Ok(aead.encrypt(Nonce::from_slice(nonce), plaintext)?)
}
