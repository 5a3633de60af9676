//! Signed session tokens.
//!
//! Tokens use the compact JWS layout with an HMAC-SHA256 signature:
//! `base64url(header).base64url(claims).base64url(mac)`. The signature is
//! checked before any claim is trusted, so an expired token is only reported
//! as [`TokenError::Expired`] when it was genuinely issued by this process.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::{fmt, sync::Arc};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_VERSION: u8 = 1;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const TOKEN_ALG: &str = "HS256";

#[derive(Debug, Error)]
pub enum SigningKeyError {
    #[error("session secret must be at least 32 bytes, got {0}")]
    TooShort(usize),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid token version")]
    InvalidVersion,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    Key,
}

/// Process-wide secret used to sign and verify session tokens.
#[derive(Clone)]
pub struct SessionKey {
    secret: Arc<SecretString>,
}

impl SessionKey {
    /// Wrap the configured secret.
    ///
    /// # Errors
    /// Returns [`SigningKeyError::TooShort`] when the secret is under
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: SecretString) -> Result<Self, SigningKeyError> {
        let len = secret.expose_secret().len();
        if len < MIN_SECRET_LEN {
            return Err(SigningKeyError::TooShort(len));
        }
        Ok(Self {
            secret: Arc::new(secret),
        })
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTokenHeader {
    pub alg: String,
    pub typ: String,
}

impl SessionTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: TOKEN_ALG.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub v: u8,
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Sign claims into a compact token.
///
/// # Errors
/// Returns an error if the claims cannot be encoded.
pub fn sign(key: &SessionKey, claims: &SessionClaims) -> Result<String, TokenError> {
    let header_b64 = b64e_json(&SessionTokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = key.mac()?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify a compact token and return its claims.
///
/// # Errors
///
/// Returns an error if:
/// - the token is malformed or contains invalid base64/json,
/// - the header names an algorithm other than HS256,
/// - the signature does not match,
/// - the claims carry an unknown version or `exp <= now`.
pub fn verify(key: &SessionKey, token: &str, now_unix_seconds: i64) -> Result<SessionClaims, TokenError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
    if parts.next().is_some() {
        return Err(TokenError::TokenFormat);
    }

    let header: SessionTokenHeader = b64d_json(header_b64)?;
    if header.alg != TOKEN_ALG {
        return Err(TokenError::UnsupportedAlg(header.alg));
    }

    let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
    let mut mac = key.mac()?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let claims: SessionClaims = b64d_json(claims_b64)?;
    if claims.v != TOKEN_VERSION {
        return Err(TokenError::InvalidVersion);
    }
    if claims.exp <= now_unix_seconds {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn test_key(secret: &str) -> Result<SessionKey, SigningKeyError> {
        SessionKey::new(SecretString::from(secret.to_string()))
    }

    fn test_claims() -> SessionClaims {
        SessionClaims {
            v: TOKEN_VERSION,
            sub: Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef),
            email: "user@test.com".to_string(),
            iat: NOW,
            exp: NOW + 120,
        }
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(test_key("too-short"), Err(SigningKeyError::TooShort(9))));
    }

    #[test]
    fn sign_and_verify() -> anyhow::Result<()> {
        let key = test_key("0123456789abcdef0123456789abcdef")?;
        let token = sign(&key, &test_claims())?;

        assert_eq!(token.split('.').count(), 3);
        let verified = verify(&key, &token, NOW)?;
        assert_eq!(verified, test_claims());
        Ok(())
    }

    #[test]
    fn rejects_expired_token() -> anyhow::Result<()> {
        let key = test_key("0123456789abcdef0123456789abcdef")?;
        let token = sign(&key, &test_claims())?;

        assert!(matches!(verify(&key, &token, NOW + 120), Err(TokenError::Expired)));
        assert!(matches!(verify(&key, &token, NOW + 9999), Err(TokenError::Expired)));
        Ok(())
    }

    #[test]
    fn rejects_token_from_other_key() -> anyhow::Result<()> {
        let issuer = test_key("0123456789abcdef0123456789abcdef")?;
        let other = test_key("fedcba9876543210fedcba9876543210")?;
        let token = sign(&issuer, &test_claims())?;

        assert!(matches!(
            verify(&other, &token, NOW),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn rejects_tampered_claims() -> anyhow::Result<()> {
        let key = test_key("0123456789abcdef0123456789abcdef")?;
        let token = sign(&key, &test_claims())?;
        let mut forged = test_claims();
        forged.exp = NOW + 1_000_000;
        let forged_b64 = b64e_json(&forged)?;

        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_b64, parts[2]);
        assert!(matches!(
            verify(&key, &tampered, NOW),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn rejects_expired_token_with_bad_signature_as_invalid() -> anyhow::Result<()> {
        let key = test_key("0123456789abcdef0123456789abcdef")?;
        let other = test_key("fedcba9876543210fedcba9876543210")?;
        let token = sign(&other, &test_claims())?;

        assert!(matches!(
            verify(&key, &token, NOW + 9999),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn rejects_malformed_tokens() -> anyhow::Result<()> {
        let key = test_key("0123456789abcdef0123456789abcdef")?;
        assert!(matches!(verify(&key, "", NOW), Err(TokenError::TokenFormat)));
        assert!(matches!(verify(&key, "a.b", NOW), Err(TokenError::TokenFormat)));
        assert!(matches!(verify(&key, "a.b.c.d", NOW), Err(TokenError::TokenFormat)));
        assert!(matches!(verify(&key, "!!.b.c", NOW), Err(TokenError::Base64)));
        Ok(())
    }

    #[test]
    fn rejects_unsupported_algorithm() -> anyhow::Result<()> {
        let key = test_key("0123456789abcdef0123456789abcdef")?;
        let header = b64e_json(&SessionTokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })?;
        let claims = b64e_json(&test_claims())?;
        let token = format!("{header}.{claims}.");
        assert!(matches!(
            verify(&key, &token, NOW),
            Err(TokenError::UnsupportedAlg(alg)) if alg == "none"
        ));
        Ok(())
    }

    #[test]
    fn debug_hides_secret() -> anyhow::Result<()> {
        let key = test_key("0123456789abcdef0123456789abcdef")?;
        assert!(!format!("{key:?}").contains("0123456789abcdef"));
        Ok(())
    }
}
