//! NetStorage request signing.
//!
//! Every request carries two headers derived from the canonical path and the
//! action string:
//!
//! 1. `X-Akamai-ACS-Auth-Data`: version, client/server placeholders, unix
//!    timestamp, a unique id and the key name, comma separated.
//! 2. `X-Akamai-ACS-Auth-Sign`: base64 of HMAC-SHA256 over the auth data,
//!    the path and the lowercased action header line.
//!
//! The timestamp and unique id change on every call so signed headers cannot
//! be replayed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::trace;

type HmacSha256 = Hmac<Sha256>;

/// Authentication scheme version understood by NetStorage.
const AUTH_VERSION: u8 = 5;

/// Authentication material for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value of `X-Akamai-ACS-Action`.
    pub acs_action: String,
    /// Value of `X-Akamai-ACS-Auth-Data`.
    pub auth_data: String,
    /// Value of `X-Akamai-ACS-Auth-Sign`.
    pub auth_sign: String,
}

/// Errors from request signing.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("signing failed: {0}")]
    Internal(String),
}

/// Produces authentication headers for a canonical path and action string.
///
/// Implementations must embed fresh time/nonce material on every call.
pub trait Signer: Send + Sync {
    /// Sign `acs_action` performed on `canonical_path`.
    ///
    /// # Errors
    /// Any error is fatal for the request being built.
    fn sign(&self, canonical_path: &str, acs_action: &str) -> Result<SignedHeaders, SignError>;
}

/// HMAC-SHA256 signer keyed by a NetStorage upload account key.
pub struct NetStorageSigner {
    key_name: String,
    key: SecretString,
}

impl std::fmt::Debug for NetStorageSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStorageSigner")
            .field("key_name", &self.key_name)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl NetStorageSigner {
    pub fn new(key_name: impl Into<String>, key: SecretString) -> Self {
        Self {
            key_name: key_name.into(),
            key,
        }
    }

    /// Sign with caller-provided time and nonce.
    pub(crate) fn sign_at(
        &self,
        canonical_path: &str,
        acs_action: &str,
        timestamp: i64,
        unique_id: &str,
    ) -> Result<SignedHeaders, SignError> {
        let auth_data = format!(
            "{AUTH_VERSION}, 0.0.0.0, 0.0.0.0, {timestamp}, {unique_id}, {}",
            self.key_name
        );
        let sign_string = format!("{canonical_path}\nx-akamai-acs-action:{acs_action}\n");

        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| SignError::InvalidKey(e.to_string()))?;
        mac.update(auth_data.as_bytes());
        mac.update(sign_string.as_bytes());
        let auth_sign = STANDARD.encode(mac.finalize().into_bytes());

        Ok(SignedHeaders {
            acs_action: acs_action.to_owned(),
            auth_data,
            auth_sign,
        })
    }
}

impl Signer for NetStorageSigner {
    fn sign(&self, canonical_path: &str, acs_action: &str) -> Result<SignedHeaders, SignError> {
        let timestamp = chrono::Utc::now().timestamp();
        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        trace!(timestamp, unique_id = %unique_id, "signing request");
        self.sign_at(canonical_path, acs_action, timestamp, &unique_id)
    }
}
