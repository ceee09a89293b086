//! Voluntary Application Server Identification (RFC 8292).
//!
//! A VAPID configuration is validated into a [`VapidSigner`], which issues
//! the signed ES256 token and the header set for one push service
//! audience. The header format differs per content coding:
//!
//! - `aesgcm` (draft-ietf-webpush-vapid-02): `Authorization: WebPush <jwt>`
//!   plus a `p256ecdsa` parameter on the `Crypto-Key` header,
//! - `aes128gcm` (RFC 8292): `Authorization: vapid t=<jwt>, k=<key>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use core::fmt;

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::consts::{
    PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, VAPID_DEFAULT_EXPIRATION, VAPID_MAX_EXPIRATION,
};
use crate::error::Error;
use crate::keys;
use crate::message::ContentEncoding;

// Emitted verbatim; only the claims and signature segments vary.
const JWT_HEADER: &str = r#"{"typ":"JWT","alg":"ES256"}"#;

#[derive(Serialize)]
struct Claims<'a> {
    aud: &'a str,
    exp: u64,
    sub: &'a str,
}

/// A VAPID configuration as supplied by the caller.
///
/// Key material comes in one of two shapes: the raw base64url
/// `public_key`/`private_key` pair, or PEM text (inline or a file path)
/// from which both keys are extracted. [`validate`](Self::validate) checks
/// the shape and produces the signer.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vapid {
    /// Contact for the push service operator: a `mailto:` address or an
    /// `https:` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The 65-byte public key, base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// The 32-byte private scalar, base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// PEM text holding the private key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pem: Option<String>,

    /// Path to a PEM file holding the private key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pem_file: Option<PathBuf>,
}

impl Vapid {
    /// Configuration from a raw base64url key pair.
    pub fn from_keys(
        subject: impl Into<String>,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            subject: Some(subject.into()),
            public_key: Some(public_key.into()),
            private_key: Some(private_key.into()),
            ..Self::default()
        }
    }

    /// Configuration from inline PEM text.
    pub fn from_pem(subject: impl Into<String>, pem: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            pem: Some(pem.into()),
            ..Self::default()
        }
    }

    /// Configuration from a PEM file.
    pub fn from_pem_file(subject: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            subject: Some(subject.into()),
            pem_file: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Validate the configuration and build the signer.
    pub fn validate(&self) -> Result<VapidSigner, Error> {
        let subject = self
            .subject
            .as_deref()
            .ok_or_else(|| Error::Config("a subject is required".to_owned()))?;
        validate_subject(subject)?;

        let (public_key, private_key) = if let Some(pem) = &self.pem {
            keys::keypair_from_pem(pem)?
        } else if let Some(path) = &self.pem_file {
            let pem = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("could not read PEM file {}: {e}", path.display()))
            })?;
            keys::keypair_from_pem(&pem)?
        } else {
            match (&self.public_key, &self.private_key) {
                (Some(public), Some(private)) => {
                    (keys::decode_public_key(public)?, keys::decode_private_key(private)?)
                }
                _ => {
                    return Err(Error::Config(
                        "either a public/private key pair or PEM material is required".to_owned(),
                    ))
                }
            }
        };

        VapidSigner::new(subject.to_owned(), public_key, private_key)
    }
}

fn validate_subject(subject: &str) -> Result<(), Error> {
    if subject.is_empty() {
        return Err(Error::Config("the subject is empty".to_owned()));
    }

    if let Some(address) = subject.strip_prefix("mailto:") {
        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(Error::Config(format!(
                "subject `{subject}` is not a valid mailto: contact"
            ))),
        }
    } else {
        let url = Url::parse(subject)
            .map_err(|_| Error::Config(format!("subject `{subject}` is not an absolute URL")))?;
        if url.scheme() != "https" || url.host_str().map_or(true, str::is_empty) {
            return Err(Error::Config(format!(
                "subject `{subject}` must be an https: URL with a host"
            )));
        }
        Ok(())
    }
}

/// Derive the JWT audience (`scheme://host`) from a push endpoint.
///
/// An explicit non-default port is passed through; default ports
/// normalize away.
pub(crate) fn audience(endpoint: &Url) -> Result<String, Error> {
    let host = endpoint
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::Audience(endpoint.to_string()))?;

    Ok(match endpoint.port() {
        Some(port) => format!("{}://{host}:{port}", endpoint.scheme()),
        None => format!("{}://{host}", endpoint.scheme()),
    })
}

/// The header set produced by [`VapidSigner::sign`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VapidHeaders {
    /// The `Authorization` header value.
    pub authorization: String,

    /// A `p256ecdsa` parameter for the `Crypto-Key` header. Only present
    /// for the `aesgcm` coding.
    pub crypto_key: Option<String>,
}

/// A validated VAPID key pair bound to a subject.
#[derive(Clone)]
pub struct VapidSigner {
    subject: String,
    signing_key: SigningKey,
    public_key: [u8; PUBLIC_KEY_SIZE],
}

// The private half stays out of the debug output.
impl fmt::Debug for VapidSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidSigner")
            .field("subject", &self.subject)
            .field("public_key", &keys::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

impl VapidSigner {
    fn new(
        subject: String,
        public_key: [u8; PUBLIC_KEY_SIZE],
        private_key: [u8; PRIVATE_KEY_SIZE],
    ) -> Result<Self, Error> {
        let signing_key = SigningKey::from_slice(&private_key)
            .map_err(|_| Error::Config("the private key is not a valid P-256 scalar".to_owned()))?;

        Ok(Self {
            subject,
            signing_key,
            public_key,
        })
    }

    /// The configured subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The public key as base64url, as it appears in the emitted headers.
    pub fn public_key(&self) -> String {
        keys::encode(self.public_key)
    }

    // Stable digest of the key pair, used as part of the header cache key.
    pub(crate) fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.public_key);
        hasher.update(self.signing_key.to_bytes());
        hasher.finalize().into()
    }

    /// Issue the signed header set for one audience.
    ///
    /// `expiration` is epoch seconds; it defaults to twelve hours from now
    /// and is capped at the 24-hour bound of RFC 8292. The signature is
    /// normalized to low-S form.
    pub fn sign(
        &self,
        audience: &str,
        encoding: ContentEncoding,
        expiration: Option<u64>,
    ) -> Result<VapidHeaders, Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let exp = expiration
            .unwrap_or(now + VAPID_DEFAULT_EXPIRATION)
            .min(now + VAPID_MAX_EXPIRATION);

        let claims = serde_json::to_string(&Claims {
            aud: audience,
            exp,
            sub: &self.subject,
        })?;

        let signing_input = format!("{}.{}", keys::encode(JWT_HEADER), keys::encode(&claims));
        let signature: Signature = self.signing_key.try_sign(signing_input.as_bytes())?;
        let signature = signature.normalize_s().unwrap_or(signature);
        let token = format!("{signing_input}.{}", keys::encode(signature.to_bytes()));

        let public_key = self.public_key();
        Ok(match encoding {
            ContentEncoding::AesGcm => VapidHeaders {
                authorization: format!("WebPush {token}"),
                crypto_key: Some(format!("p256ecdsa={public_key}")),
            },
            ContentEncoding::Aes128Gcm => VapidHeaders {
                authorization: format!("vapid t={token}, k={public_key}"),
                crypto_key: None,
            },
        })
    }
}

/// Memo of signed header sets, scoped to a single flush.
///
/// Keyed by audience, coding and key-pair fingerprint, so distinct
/// signers never share an entry. Dropped when the flush returns.
#[derive(Debug, Default)]
pub(crate) struct VapidHeaderCache {
    entries: HashMap<(String, ContentEncoding, [u8; 32]), VapidHeaders>,
}

impl VapidHeaderCache {
    /// Sign, or reuse the headers signed earlier this flush.
    pub(crate) fn get_or_sign(
        &mut self,
        signer: &VapidSigner,
        audience: &str,
        encoding: ContentEncoding,
        expiration: Option<u64>,
        reuse: bool,
    ) -> Result<VapidHeaders, Error> {
        if !reuse {
            return signer.sign(audience, encoding, expiration);
        }

        let key = (audience.to_owned(), encoding, signer.fingerprint());
        if let Some(headers) = self.entries.get(&key) {
            return Ok(headers.clone());
        }

        let headers = signer.sign(audience, encoding, expiration)?;
        self.entries.insert(key, headers.clone());
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_common::{VAPID_PRIVATE_KEY, VAPID_PUBLIC_KEY, VAPID_SUBJECT};

    use std::io::Write;

    fn signer() -> VapidSigner {
        Vapid::from_keys(VAPID_SUBJECT, VAPID_PUBLIC_KEY, VAPID_PRIVATE_KEY)
            .validate()
            .unwrap()
    }

    #[test]
    fn test_aesgcm_headers() {
        let headers = signer()
            .sign("http://push.com", ContentEncoding::AesGcm, Some(1475452165))
            .unwrap();

        assert!(headers.authorization.starts_with(
            "WebPush eyJ0eXAiOiJKV1QiLCJhbGciOiJFUzI1NiJ9.eyJhdWQiOiJodHRwOi8vcHVzaC5jb20iLCJle\
             HAiOjE0NzU0NTIxNjUsInN1YiI6Imh0dHBzOi8vdGVzdC5jb20ifQ."
        ));
        assert_eq!(
            headers.crypto_key.as_deref(),
            Some(concat!(
                "p256ecdsa=",
                "BA6jvk34k6YjElHQ6S0oZwmrsqHdCNajxcod6KJnI77Dagikfb--O_kYXcR2eflRz6l3PcI2r8fPCH\
                 3BElLQHDk"
            ))
        );
    }

    #[test]
    fn test_aes128gcm_headers() {
        let headers = signer()
            .sign("http://push.com", ContentEncoding::Aes128Gcm, Some(1475452165))
            .unwrap();

        assert!(headers.authorization.starts_with(
            "vapid t=eyJ0eXAiOiJKV1QiLCJhbGciOiJFUzI1NiJ9.eyJhdWQiOiJodHRwOi8vcHVzaC5jb20iLCJle\
             HAiOjE0NzU0NTIxNjUsInN1YiI6Imh0dHBzOi8vdGVzdC5jb20ifQ."
        ));
        assert!(headers.authorization.ends_with(
            ", k=BA6jvk34k6YjElHQ6S0oZwmrsqHdCNajxcod6KJnI77Dagikfb--O_kYXcR2eflRz6l3PcI2r8fPCH\
             3BElLQHDk"
        ));
        assert_eq!(headers.crypto_key, None);
    }

    #[test]
    fn test_token_segments_are_byte_stable() {
        let signer = signer();
        let first = signer
            .sign("http://push.com", ContentEncoding::AesGcm, Some(1475452165))
            .unwrap();
        let second = signer
            .sign("http://push.com", ContentEncoding::AesGcm, Some(1475452165))
            .unwrap();

        let prefix = |headers: &VapidHeaders| {
            let token = headers.authorization.strip_prefix("WebPush ").unwrap();
            let (head, _sig) = token.rsplit_once('.').unwrap();
            head.to_owned()
        };

        assert_eq!(prefix(&first), prefix(&second));
    }

    #[test]
    fn test_signature_segment_is_low_s() {
        let headers = signer()
            .sign("http://push.com", ContentEncoding::AesGcm, Some(1475452165))
            .unwrap();
        let token = headers.authorization.strip_prefix("WebPush ").unwrap();
        let signature = keys::decode(token.rsplit_once('.').unwrap().1).unwrap();

        assert_eq!(signature.len(), 64);
        let parsed = Signature::from_slice(&signature).unwrap();
        assert!(parsed.normalize_s().is_none());
    }

    #[test]
    fn test_default_expiration_is_capped() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let headers = signer()
            .sign(
                "http://push.com",
                ContentEncoding::Aes128Gcm,
                Some(now + 3 * VAPID_MAX_EXPIRATION),
            )
            .unwrap();

        let token = headers
            .authorization
            .strip_prefix("vapid t=")
            .unwrap()
            .split(',')
            .next()
            .unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&keys::decode(token.split('.').nth(1).unwrap()).unwrap())
                .unwrap();

        let exp = claims["exp"].as_u64().unwrap();
        assert!(exp <= now + VAPID_MAX_EXPIRATION + 60);
        assert_eq!(claims["aud"], "http://push.com");
        assert_eq!(claims["sub"], VAPID_SUBJECT);
    }

    #[test]
    fn test_validate_rejects_bad_configurations() {
        let rejected = [
            Vapid::default(),
            Vapid {
                subject: Some(String::new()),
                ..Vapid::default()
            },
            Vapid {
                subject: Some("test".to_owned()),
                ..Vapid::default()
            },
            Vapid {
                subject: Some("mailto:".to_owned()),
                ..Vapid::default()
            },
            Vapid {
                subject: Some("mailto:localhost".to_owned()),
                ..Vapid::default()
            },
            Vapid {
                subject: Some("https://".to_owned()),
                ..Vapid::default()
            },
            Vapid::from_pem_file("https://example.com", ""),
            Vapid::from_pem_file("https://example.com", "abc.pem"),
            Vapid::from_pem("https://example.com", ""),
            Vapid {
                subject: Some("https://example.com".to_owned()),
                public_key: Some(String::new()),
                ..Vapid::default()
            },
        ];

        for config in rejected {
            assert!(config.validate().is_err(), "accepted: {config:?}");
        }
    }

    #[test]
    fn test_validate_accepts_mailto_subject() {
        let signer = Vapid::from_keys("mailto:admin@example.com", VAPID_PUBLIC_KEY, VAPID_PRIVATE_KEY)
            .validate()
            .unwrap();
        assert_eq!(signer.subject(), "mailto:admin@example.com");
        assert_eq!(signer.public_key(), VAPID_PUBLIC_KEY);
    }

    #[test]
    fn test_validate_accepts_pem_file() {
        use p256::pkcs8::EncodePrivateKey;

        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let pem = secret.to_pkcs8_pem(Default::default()).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();

        let signer = Vapid::from_pem_file("https://example.com", file.path())
            .validate()
            .unwrap();
        assert_eq!(
            keys::decode(&signer.public_key()).unwrap().len(),
            PUBLIC_KEY_SIZE
        );
    }

    #[test]
    fn test_audience_from_endpoint() {
        let cases = [
            ("https://fcm.googleapis.com/fcm/send/abc", "https://fcm.googleapis.com"),
            ("http://push.com/x", "http://push.com"),
            ("https://push.example.com:8443/v2/x", "https://push.example.com:8443"),
        ];

        for (endpoint, expected) in cases {
            let url = Url::parse(endpoint).unwrap();
            assert_eq!(audience(&url).unwrap(), expected);
        }
    }

    #[test]
    fn test_audience_requires_a_host() {
        let url = Url::parse("data:text/plain,hi").unwrap();
        assert!(matches!(audience(&url), Err(Error::Audience(_))));
    }

    #[test]
    fn test_header_cache_reuses_within_key() {
        let signer = signer();
        let mut cache = VapidHeaderCache::default();

        let first = cache
            .get_or_sign(&signer, "http://push.com", ContentEncoding::AesGcm, None, true)
            .unwrap();
        let second = cache
            .get_or_sign(&signer, "http://push.com", ContentEncoding::AesGcm, None, true)
            .unwrap();
        assert_eq!(first, second);

        // Another coding signs its own entry.
        let other = cache
            .get_or_sign(&signer, "http://push.com", ContentEncoding::Aes128Gcm, None, true)
            .unwrap();
        assert_ne!(first, other);
        assert_eq!(cache.entries.len(), 2);
    }

    #[test]
    fn test_header_cache_disabled_does_not_store() {
        let signer = signer();
        let mut cache = VapidHeaderCache::default();
        cache
            .get_or_sign(&signer, "http://push.com", ContentEncoding::AesGcm, None, false)
            .unwrap();
        assert!(cache.entries.is_empty());
    }
}
