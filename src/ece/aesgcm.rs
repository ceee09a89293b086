//! Key derivation and padding for the legacy `aesgcm` coding
//! (draft-ietf-webpush-encryption-04).

use crate::consts::*;
use crate::error::Error;

use super::hkdf;

/// Derive the content encryption key and nonce.
///
/// The auth secret is mixed in through an intermediate pseudo-random key,
/// and both derivations are bound to the subscriber and sender public keys
/// through the `P-256` context block.
pub(super) fn derive(
    auth_secret: &[u8; AUTH_SECRET_SIZE],
    shared: &[u8],
    salt: &[u8; SALT_SIZE],
    subscriber_public: &[u8; PUBLIC_KEY_SIZE],
    local_public: &[u8; PUBLIC_KEY_SIZE],
) -> Result<([u8; KEY_SIZE], [u8; IV_SIZE]), Error> {
    let mut prk = [0u8; 32];
    hkdf(auth_secret, shared, AUTH_INFO, &mut prk)?;

    let context = context(subscriber_public, local_public);

    let mut key_info = Vec::with_capacity(AESGCM_INFO.len() + context.len());
    key_info.extend_from_slice(AESGCM_INFO);
    key_info.extend_from_slice(&context);

    let mut nonce_info = Vec::with_capacity(NONCE_INFO.len() + context.len());
    nonce_info.extend_from_slice(NONCE_INFO);
    nonce_info.extend_from_slice(&context);

    let mut key = [0u8; KEY_SIZE];
    hkdf(salt, &prk, &key_info, &mut key)?;

    let mut nonce = [0u8; IV_SIZE];
    hkdf(salt, &prk, &nonce_info, &mut nonce)?;

    Ok((key, nonce))
}

// label || len(subscriber) || subscriber || len(sender) || sender, with
// 16-bit big-endian lengths.
fn context(
    subscriber_public: &[u8; PUBLIC_KEY_SIZE],
    local_public: &[u8; PUBLIC_KEY_SIZE],
) -> Vec<u8> {
    let mut context = Vec::with_capacity(P256_LABEL.len() + 2 * (2 + PUBLIC_KEY_SIZE));
    context.extend_from_slice(P256_LABEL);
    context.extend_from_slice(&(PUBLIC_KEY_SIZE as u16).to_be_bytes());
    context.extend_from_slice(subscriber_public);
    context.extend_from_slice(&(PUBLIC_KEY_SIZE as u16).to_be_bytes());
    context.extend_from_slice(local_public);
    context
}

/// Pad plaintext to the target length.
///
/// The padded record is a two-byte big-endian pad length, that many zero
/// bytes, then the payload.
pub(super) fn pad(payload: &[u8], target: usize) -> Result<Vec<u8>, Error> {
    if payload.len() > target {
        return Err(Error::PayloadTooLarge {
            found: payload.len(),
            limit: target,
        });
    }

    let pad_len = target - payload.len();
    let mut padded = Vec::with_capacity(2 + target);
    padded.extend_from_slice(&(pad_len as u16).to_be_bytes());
    padded.resize(2 + pad_len, 0);
    padded.extend_from_slice(payload);

    Ok(padded)
}
