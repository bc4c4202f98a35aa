//! Session tokens that carry the content key between requests.
//!
//! A session starts anonymous. Login proves the password, loads the
//! account's derived key and seals it into a signed token. Every later
//! operation presents that token; the vault re-verifies the signature,
//! checks expiry and only then trusts the key inside. Logout is simply
//! discarding the token, and an expired token is refused the same way
//! a forged one is.
//!
//! The token format is two base64url segments joined by a dot: a JSON
//! claims payload and an HMAC-SHA-256 tag over the encoded payload,
//! keyed with the per-deployment signing secret. Claims include the
//! hex-encoded content key, so a token must be treated as a secret in
//! its own right.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::crypto::kdf::DerivedKey;
use crate::error::{Result, VaultError};

type HmacSha256 = Hmac<Sha256>;

/// Default session lifetime: 30 days.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Length of the deployment signing secret in bytes.
pub const SESSION_SECRET_LENGTH: usize = 32;

/// The authenticated facts sealed inside a session token.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The account this session belongs to.
    pub account_id: Uuid,
    /// Hex encoding of the content encryption key.
    key: String,
    /// Unix timestamp (seconds) when the token was issued.
    pub issued_at: i64,
    /// Unix timestamp (seconds) after which the token is refused.
    pub expires_at: i64,
}

impl SessionClaims {
    /// Recover the content encryption key carried by this session.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::SessionInvalid`] if the key field does not
    /// decode to a well-formed key.
    pub fn derived_key(&self) -> Result<DerivedKey> {
        DerivedKey::from_hex(&self.key).map_err(|_| VaultError::SessionInvalid)
    }
}

impl std::fmt::Debug for SessionClaims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClaims")
            .field("account_id", &self.account_id)
            .field("key", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// An opaque signed session token.
///
/// Carries the content key in its payload, so it never appears in
/// `Debug` output and must only be persisted with owner-only
/// permissions.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token string received from a client or read from disk.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The wire form of the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

/// Issues and verifies session tokens with a deployment-wide secret.
pub struct SessionSigner {
    secret: [u8; SESSION_SECRET_LENGTH],
}

impl SessionSigner {
    /// Build a signer around an existing secret.
    pub fn new(secret: [u8; SESSION_SECRET_LENGTH]) -> Self {
        Self { secret }
    }

    /// Build a signer from a secret loaded out of storage.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Storage`] if the secret is not exactly
    /// [`SESSION_SECRET_LENGTH`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let secret: [u8; SESSION_SECRET_LENGTH] = bytes.try_into().map_err(|_| {
            VaultError::Storage(format!(
                "session secret must be {} bytes, got {}",
                SESSION_SECRET_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { secret })
    }

    /// Issue a token for a freshly authenticated account.
    ///
    /// # Arguments
    ///
    /// * `account_id` - The account that just proved its password
    /// * `key` - The content encryption key to carry in the session
    /// * `ttl_secs` - Seconds until the token expires
    ///
    /// # Returns
    ///
    /// Returns a signed [`SessionToken`] valid until `now + ttl_secs`.
    pub fn issue(&self, account_id: Uuid, key: &DerivedKey, ttl_secs: i64) -> Result<SessionToken> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            account_id,
            key: key.to_hex(),
            issued_at: now,
            expires_at: now + ttl_secs,
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let tag = URL_SAFE_NO_PAD.encode(self.tag_for(payload.as_bytes()));
        Ok(SessionToken(format!("{}.{}", payload, tag)))
    }

    /// Verify a presented token and unseal its claims.
    ///
    /// The signature is checked in constant time before any of the
    /// payload is parsed, so malformed or forged tokens all fail the
    /// same way.
    ///
    /// # Errors
    ///
    /// - [`VaultError::SessionInvalid`] for structural or signature
    ///   failures
    /// - [`VaultError::SessionExpired`] for a genuine token past its
    ///   expiry
    pub fn verify(&self, token: &SessionToken) -> Result<SessionClaims> {
        let (payload, tag) = token
            .as_str()
            .split_once('.')
            .ok_or(VaultError::SessionInvalid)?;

        let presented_tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| VaultError::SessionInvalid)?;
        let expected_tag = self.tag_for(payload.as_bytes());
        if !bool::from(presented_tag.ct_eq(&expected_tag)) {
            return Err(VaultError::SessionInvalid);
        }

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| VaultError::SessionInvalid)?;
        let claims: SessionClaims =
            serde_json::from_slice(&claims_bytes).map_err(|_| VaultError::SessionInvalid)?;

        if chrono::Utc::now().timestamp() >= claims.expires_at {
            return Err(VaultError::SessionExpired);
        }

        Ok(claims)
    }

    fn tag_for(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("valid key size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
