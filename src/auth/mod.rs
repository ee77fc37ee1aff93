//! Session verification
//!
//! Sessions are issued by an external login service that shares the server
//! secret. This module only resolves a request to an [`Identity`].
//!
//! Token layout: `<user_id>.<expires_unix>.<signature>` where the signature is
//! the unpadded URL-safe base64 of HMAC-SHA256 over `<user_id>.<expires_unix>`.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Authenticated caller, resolved once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed session token")]
    Malformed,

    #[error("bad session signature")]
    BadSignature,

    #[error("session expired")]
    Expired,
}

/// Resolves the identity behind a request, if any
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self, headers: &HeaderMap) -> Option<Identity>;
}

/// HMAC-signed session tokens carried in a bearer header or cookie
#[derive(Clone)]
pub struct SessionTokens {
    key: HmacSha256,
    cookie_name: String,
}

impl SessionTokens {
    pub fn new(
        secret: impl AsRef<[u8]>,
        cookie_name: impl Into<String>,
    ) -> Result<Self, InvalidLength> {
        Ok(Self {
            key: HmacSha256::new_from_slice(secret.as_ref())?,
            cookie_name: cookie_name.into(),
        })
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.key.clone();
        mac.update(payload.as_bytes());
        mac
    }

    /// Sign a token for `user_id` valid until `expires_at`
    pub fn issue(&self, user_id: &str, expires_at: DateTime<Utc>) -> String {
        let payload = format!("{}.{}", user_id, expires_at.timestamp());
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload).finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    /// Sign a token valid for `ttl` from now
    pub fn issue_for(&self, user_id: &str, ttl: Duration) -> String {
        self.issue(user_id, Utc::now() + ttl)
    }

    /// Check signature and expiry of `token` at time `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(AuthError::Malformed)?;
        let (user_id, expires) = payload.rsplit_once('.').ok_or(AuthError::Malformed)?;
        if user_id.is_empty() {
            return Err(AuthError::Malformed);
        }
        let expires: i64 = expires.parse().map_err(|_| AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        self.mac(payload)
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        if now.timestamp() >= expires {
            return Err(AuthError::Expired);
        }

        Ok(Identity::new(user_id))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Token from `Authorization: Bearer`, else from the session cookie
    fn extract_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim());
        if bearer.is_some() {
            return bearer;
        }

        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.trim_matches('"'))
    }
}

impl IdentityProvider for SessionTokens {
    fn current_identity(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = self.extract_token(headers)?;
        match self.verify(token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!("rejected session token: {}", e);
                None
            }
        }
    }
}
