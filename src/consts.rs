//! Constants used by the Web Push protocol family.

/// Maximum plaintext size of a notification payload after padding.
///
/// Push services accept a single 4096-byte record; subtracting the
/// authentication tag (16 bytes) and the two-byte padding prefix leaves
/// 4078 bytes for padded plaintext.
pub const MAX_PAYLOAD_SIZE: usize = 4078;

/// Padding target known to work with every deployed push service.
///
/// Some services reject records close to the maximum size, so this is the
/// recommended (and default) automatic padding target.
pub const MAX_COMPATIBILITY_PAYLOAD_SIZE: usize = 3052;

/// Default notification time-to-live in seconds (four weeks).
pub const DEFAULT_TTL: u32 = 2_419_200;

/// Default number of notifications dispatched per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default number of in-flight requests for the pooled flush.
pub const DEFAULT_REQUEST_CONCURRENCY: usize = 100;

/// Default `Content-Type` for encrypted bodies.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Per-request timeout applied by the default transport, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// Symmetric crypto constants. Both content codings encrypt a single
// AES-128-GCM record.

/// Size of the per-message salt.
pub const SALT_SIZE: usize = 16;

/// Size of the content encryption key.
pub const KEY_SIZE: usize = 16;

/// Size of the AES-GCM nonce.
pub const IV_SIZE: usize = 12;

/// Size of the authentication tag appended to the ciphertext.
pub const TAG_SIZE: usize = 16;

/// Size of an uncompressed SEC1 P-256 point (`0x04 || X || Y`).
pub const PUBLIC_KEY_SIZE: usize = 65;

/// Size of a raw P-256 private scalar.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of the subscriber authentication secret.
pub const AUTH_SECRET_SIZE: usize = 16;

// HKDF info literals. The trailing NUL is part of every literal.

/// Info string binding the auth secret into the legacy pseudo-random key.
pub const AUTH_INFO: &[u8] = b"Content-Encoding: auth\0";

/// Info string for the legacy content encryption key.
pub const AESGCM_INFO: &[u8] = b"Content-Encoding: aesgcm\0";

/// Info string for the RFC 8188 content encryption key.
pub const AES128GCM_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";

/// Info string for the nonce, shared by both codings.
pub const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

/// Info string binding both public keys into the RFC 8291 pseudo-random key.
pub const IKM_INFO: &[u8] = b"WebPush: info\0";

/// Curve label starting the legacy key-derivation context.
pub const P256_LABEL: &[u8] = b"P-256\0";

/// Default lifetime of a VAPID token, in seconds (12 hours).
pub const VAPID_DEFAULT_EXPIRATION: u64 = 12 * 60 * 60;

/// Upper bound RFC 8292 places on a VAPID token lifetime (24 hours).
pub const VAPID_MAX_EXPIRATION: u64 = 24 * 60 * 60;
