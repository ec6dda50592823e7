//! Stateless Session Tokens
//!
//! A session is carried entirely by the `dkron_ui_session` cookie:
//!
//! ```text
//! <username>:<unix expiry>:<base64(HMAC-SHA256(secret, "<username>:<expiry>"))>
//! ```
//!
//! Any process holding the same secret can verify a token it did not issue.
//! Nothing is stored server-side, so nothing can be revoked either.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Cookie name carrying the session token
pub const SESSION_COOKIE: &str = "dkron_ui_session";

/// Session lifetime used when the configured TTL is zero or negative (1 hour)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

/// Reasons a session cookie is rejected by the gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session cookie missing")]
    Missing,

    #[error("session cookie malformed")]
    Malformed,

    #[error("session expiry is not a decimal timestamp")]
    BadExpiry,

    #[error("session expired")]
    Expired,

    #[error("session signature mismatch")]
    BadSignature,
}

/// Keyed signer for `(username, expiry)` pairs.
///
/// Deterministic: the same secret, username and expiry always produce the same
/// signature.
#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
}

impl SessionSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, username: &str, expiry: i64) -> HmacSha256 {
        // HMAC hashes or pads keys of any length; `new_from_slice` only errors
        // for fixed-key MACs, so this never fires, empty secret included.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{}:{}", username, expiry).as_bytes());
        mac
    }

    /// Sign a session, returning the base64 (standard alphabet) tag
    pub fn sign(&self, username: &str, expiry: i64) -> String {
        STANDARD.encode(self.mac(username, expiry).finalize().into_bytes())
    }

    /// Recompute the tag and compare it in constant time
    pub fn verify(&self, username: &str, expiry: i64, signature: &str) -> bool {
        let Ok(provided) = STANDARD.decode(signature) else {
            return false;
        };

        self.mac(username, expiry).verify_slice(&provided).is_ok()
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Parsed contents of a session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub username: String,
    pub expiry: i64,
    pub signature: String,
}

impl SessionToken {
    /// Mint a signed token for `username` expiring at `expiry`
    pub fn issue(signer: &SessionSigner, username: &str, expiry: i64) -> Self {
        Self {
            username: username.to_string(),
            expiry,
            signature: signer.sign(username, expiry),
        }
    }

    /// Split a cookie value into its three fields.
    ///
    /// Usernames containing `:` produce more than three fields and are rejected.
    pub fn parse(value: &str) -> Result<Self, SessionError> {
        let parts: Vec<&str> = value.split(':').collect();
        let [username, expiry, signature] = parts.as_slice() else {
            return Err(SessionError::Malformed);
        };

        let expiry = expiry.parse::<i64>().map_err(|_| SessionError::BadExpiry)?;

        Ok(Self {
            username: username.to_string(),
            expiry,
            signature: signature.to_string(),
        })
    }

    /// Cookie value representation
    pub fn to_cookie_value(&self) -> String {
        format!("{}:{}:{}", self.username, self.expiry, self.signature)
    }

    /// Check expiry and signature. Both checks always apply; neither one
    /// short-circuits the other into acceptance.
    pub fn validate(&self, signer: &SessionSigner, now: i64) -> Result<(), SessionError> {
        if now > self.expiry {
            return Err(SessionError::Expired);
        }

        if !signer.verify(&self.username, self.expiry, &self.signature) {
            return Err(SessionError::BadSignature);
        }

        Ok(())
    }
}

/// Effective TTL in seconds, falling back to the default when `ttl_secs <= 0`
pub fn effective_ttl(ttl_secs: i64) -> i64 {
    if ttl_secs <= 0 {
        DEFAULT_SESSION_TTL_SECS
    } else {
        ttl_secs
    }
}

/// Parse and validate a raw cookie value in one step
pub fn check_cookie(
    signer: &SessionSigner,
    value: Option<&str>,
    now: i64,
) -> Result<SessionToken, SessionError> {
    let token = SessionToken::parse(value.ok_or(SessionError::Missing)?)?;
    token.validate(signer, now)?;
    Ok(token)
}
