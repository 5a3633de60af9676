//! Session issuance, validation, and cookie helpers.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use tracing::debug;

use super::{
    principal::Identity,
    state::AuthConfig,
    token::{self, SessionClaims, SessionKey, TokenError, TOKEN_VERSION},
};

pub const SESSION_COOKIE_NAME: &str = "ledgerly_session";

/// Token minted at login together with its absolute expiry.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: i64,
}

/// Mints session tokens with a fixed TTL.
#[derive(Clone, Debug)]
pub struct SessionIssuer {
    key: SessionKey,
    ttl_seconds: i64,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(key: SessionKey, ttl_seconds: i64) -> Self {
        Self { key, ttl_seconds }
    }

    /// Issue a token valid from `now` for the configured TTL.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be signed.
    pub fn issue_at(&self, identity: &Identity, now: i64) -> Result<IssuedSession, TokenError> {
        let expires_at = now.saturating_add(self.ttl_seconds);
        let claims = SessionClaims {
            v: TOKEN_VERSION,
            sub: identity.user_id,
            email: identity.email.clone(),
            iat: now,
            exp: expires_at,
        };
        let token = token::sign(&self.key, &claims)?;
        Ok(IssuedSession { token, expires_at })
    }
}

/// Outcome of checking an incoming session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated(Identity),
    Absent,
    Invalid,
    Expired,
}

impl SessionStatus {
    #[must_use]
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Absent | Self::Invalid | Self::Expired => None,
        }
    }
}

/// Verifies session tokens. Holds no mutable state.
#[derive(Clone, Debug)]
pub struct SessionValidator {
    key: SessionKey,
}

impl SessionValidator {
    #[must_use]
    pub fn new(key: SessionKey) -> Self {
        Self { key }
    }

    #[must_use]
    pub fn validate(&self, token: Option<&str>) -> SessionStatus {
        self.validate_at(token, now_unix_seconds())
    }

    #[must_use]
    pub fn validate_at(&self, token: Option<&str>, now: i64) -> SessionStatus {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return SessionStatus::Absent;
        };
        match token::verify(&self.key, token, now) {
            Ok(claims) => SessionStatus::Authenticated(Identity {
                user_id: claims.sub,
                email: claims.email,
            }),
            Err(TokenError::Expired) => SessionStatus::Expired,
            Err(err) => {
                debug!("Rejected session token: {err}");
                SessionStatus::Invalid
            }
        }
    }
}

/// Build the `HttpOnly` session cookie for a freshly issued token. The cookie
/// lives exactly as long as the token it carries.
pub(super) fn session_cookie(
    config: &AuthConfig,
    issued: &IssuedSession,
    now: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = issued.expires_at.saturating_sub(now).max(0);
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        issued.token
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Bearer token first, then the session cookie.
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub(crate) fn now_unix_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}
