//! Auth configuration and shared per-process state.

use anyhow::Result;
use std::sync::Arc;
use url::Url;

use super::{
    credentials::{CredentialStore, CredentialVerifier},
    gate::RouteRules,
    session::{SessionIssuer, SessionValidator},
    token::SessionKey,
};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    public_url: String,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(public_url: String) -> Self {
        Self {
            public_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        Url::parse(&self.public_url).is_ok_and(|url| url.scheme() == "https")
    }
}

/// Everything the login handlers and the route gate share.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    verifier: CredentialVerifier,
    issuer: SessionIssuer,
    validator: SessionValidator,
    rules: RouteRules,
}

impl AuthState {
    /// Wire the verifier, issuer, and validator around one signing key.
    ///
    /// # Errors
    /// Returns an error if the credential verifier cannot be initialized.
    pub fn new(
        config: AuthConfig,
        key: SessionKey,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let verifier = CredentialVerifier::new(store)?;
        let issuer = SessionIssuer::new(key.clone(), config.session_ttl_seconds());
        let validator = SessionValidator::new(key);
        Ok(Self {
            config,
            verifier,
            issuer,
            validator,
            rules: RouteRules::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub(super) fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    #[must_use]
    pub fn validator(&self) -> &SessionValidator {
        &self.validator
    }

    #[must_use]
    pub fn rules(&self) -> &RouteRules {
        &self.rules
    }
}
