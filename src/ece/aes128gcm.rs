//! Key derivation, padding and body framing for the `aes128gcm` coding
//! (RFC 8188, applied to Web Push by RFC 8291).

use crate::consts::*;
use crate::error::Error;

use super::hkdf;

/// Derive the content encryption key and nonce.
///
/// Both public keys are bound into the pseudo-random key through the
/// `WebPush: info` string; the per-key info strings carry no context.
pub(super) fn derive(
    auth_secret: &[u8; AUTH_SECRET_SIZE],
    shared: &[u8],
    salt: &[u8; SALT_SIZE],
    subscriber_public: &[u8; PUBLIC_KEY_SIZE],
    local_public: &[u8; PUBLIC_KEY_SIZE],
) -> Result<([u8; KEY_SIZE], [u8; IV_SIZE]), Error> {
    let mut ikm_info = Vec::with_capacity(IKM_INFO.len() + 2 * PUBLIC_KEY_SIZE);
    ikm_info.extend_from_slice(IKM_INFO);
    ikm_info.extend_from_slice(subscriber_public);
    ikm_info.extend_from_slice(local_public);

    let mut prk = [0u8; 32];
    hkdf(auth_secret, shared, &ikm_info, &mut prk)?;

    let mut key = [0u8; KEY_SIZE];
    hkdf(salt, &prk, AES128GCM_INFO, &mut key)?;

    let mut nonce = [0u8; IV_SIZE];
    hkdf(salt, &prk, NONCE_INFO, &mut nonce)?;

    Ok((key, nonce))
}

/// Pad plaintext to the target length.
///
/// The padded record is the payload, the `0x02` last-record delimiter,
/// then zero bytes up to `max(len + 1, target + 1)`.
pub(super) fn pad(payload: &[u8], target: usize) -> Result<Vec<u8>, Error> {
    if payload.len() > target {
        return Err(Error::PayloadTooLarge {
            found: payload.len(),
            limit: target,
        });
    }

    let padded_len = (payload.len() + 1).max(target + 1);
    let mut padded = Vec::with_capacity(padded_len);
    padded.extend_from_slice(payload);
    padded.push(0x02);
    padded.resize(padded_len, 0);

    Ok(padded)
}

/// Prepend the RFC 8188 header block:
/// `salt(16) || record size(4, BE) || key id length(1) || sender key(65)`.
///
/// The record size covers the padded plaintext, the tag and the delimiter
/// margin of one byte.
pub(super) fn frame(
    salt: &[u8; SALT_SIZE],
    local_public: &[u8; PUBLIC_KEY_SIZE],
    padded_len: usize,
    ciphertext: Vec<u8>,
) -> Vec<u8> {
    let record_size = (padded_len + TAG_SIZE + 1) as u32;

    let mut body =
        Vec::with_capacity(SALT_SIZE + 4 + 1 + PUBLIC_KEY_SIZE + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(&record_size.to_be_bytes());
    body.push(PUBLIC_KEY_SIZE as u8);
    body.extend_from_slice(local_public);
    body.extend_from_slice(&ciphertext);

    body
}
