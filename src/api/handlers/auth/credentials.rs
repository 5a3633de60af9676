//! Credential lookup and password verification.
//!
//! Flow Overview:
//! 1) Normalize the submitted email (trim + lowercase).
//! 2) Look the credential up through a [`CredentialStore`].
//! 3) Compare the presented password against the stored hash: Argon2id PHC
//!    strings, or bcrypt (`$2a$`/`$2b$`/`$2y$`) for users seeded before the
//!    switch to Argon2. New hashes are always Argon2id.
//!
//! Unknown emails are compared against a decoy hash built at startup, so both
//! failure kinds cost one Argon2 verification and look identical to callers.

use anyhow::{anyhow, Context, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use super::principal::Identity;
use super::utils::normalize_email;

/// Stored credential for one user.
#[derive(Clone, Debug)]
pub struct CredentialRecord {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// Read-only access to stored credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by an already-normalized email.
    ///
    /// # Errors
    /// Returns an error when the backing store cannot be queried.
    async fn lookup_credential(&self, email_normalized: &str) -> Result<Option<CredentialRecord>>;
}

/// `users` table backed credential store.
#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn lookup_credential(&self, email_normalized: &str) -> Result<Option<CredentialRecord>> {
        let query = "SELECT id, email, password FROM users WHERE LOWER(email) = $1 LIMIT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email_normalized)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup credential")?;

        Ok(row.map(|row| CredentialRecord {
            user_id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password"),
        }))
    }
}

/// Why a credential check failed. Callers render all variants the same way.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("user not found")]
    NotFound,
    #[error("incorrect password")]
    SecretMismatch,
    #[error("credential store unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

/// Verifies email/password pairs against a [`CredentialStore`].
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    decoy_hash: String,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    /// Build a verifier and its decoy hash.
    ///
    /// # Errors
    /// Returns an error if the decoy hash cannot be computed.
    pub fn new(store: Arc<dyn CredentialStore>) -> Result<Self> {
        let decoy: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let decoy_hash = hash_password(&decoy).context("failed to build decoy password hash")?;
        Ok(Self { store, decoy_hash })
    }

    /// Check a presented password for the given email.
    ///
    /// # Errors
    /// Returns [`AuthFailure::NotFound`] or [`AuthFailure::SecretMismatch`] for
    /// bad credentials and [`AuthFailure::Unavailable`] when the store fails.
    pub async fn verify(&self, email: &str, password: &SecretString) -> Result<Identity, AuthFailure> {
        let email_normalized = normalize_email(email);

        let record = match self.store.lookup_credential(&email_normalized).await {
            Ok(record) => record,
            Err(err) => {
                error!("Failed to lookup credential: {err:#}");
                return Err(AuthFailure::Unavailable(err));
            }
        };

        let Some(record) = record else {
            // Pay for one comparison so a miss costs the same as a mismatch.
            let _ = self.compare(password, self.decoy_hash.clone()).await?;
            info!("User not found");
            return Err(AuthFailure::NotFound);
        };

        if self.compare(password, record.password_hash).await? {
            Ok(Identity {
                user_id: record.user_id,
                email: record.email,
            })
        } else {
            info!(user_id = %record.user_id, "Incorrect password");
            Err(AuthFailure::SecretMismatch)
        }
    }

    async fn compare(&self, password: &SecretString, stored_hash: String) -> Result<bool, AuthFailure> {
        let password = SecretString::from(password.expose_secret().to_string());
        tokio::task::spawn_blocking(move || password_matches(password.expose_secret(), &stored_hash))
            .await
            .map_err(|err| {
                error!("Password comparison task failed: {err}");
                AuthFailure::Unavailable(anyhow!("password comparison task failed: {err}"))
            })
    }
}

/// Hash a password into an Argon2id PHC string.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| anyhow!("failed to hash password"))?
        .to_string();
    Ok(hash)
}

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Compare a password with a stored hash; unparsable hashes never match.
fn password_matches(password: &str, stored_hash: &str) -> bool {
    if BCRYPT_PREFIXES
        .iter()
        .any(|prefix| stored_hash.starts_with(prefix))
    {
        return bcrypt::verify(password, stored_hash).unwrap_or_else(|err| {
            warn!("Stored bcrypt hash is invalid: {err}");
            false
        });
    }

    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Fixed in-memory credential store for tests.
#[cfg(test)]
pub(crate) struct MemoryCredentialStore {
    records: Vec<CredentialRecord>,
}

#[cfg(test)]
impl MemoryCredentialStore {
    pub(crate) fn with_user(email: &str, password: &str) -> Result<Self> {
        Ok(Self {
            records: vec![CredentialRecord {
                user_id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
            }],
        })
    }

    pub(crate) fn user_id(&self, email: &str) -> Option<Uuid> {
        self.records
            .iter()
            .find(|record| record.email == email)
            .map(|record| record.user_id)
    }
}

#[cfg(test)]
#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn lookup_credential(&self, email_normalized: &str) -> Result<Option<CredentialRecord>> {
        Ok(self
            .records
            .iter()
            .find(|record| record.email.to_lowercase() == email_normalized)
            .cloned())
    }
}

/// Store that always fails, for data-layer outage tests.
#[cfg(test)]
pub(crate) struct FailingCredentialStore;

#[cfg(test)]
#[async_trait]
impl CredentialStore for FailingCredentialStore {
    async fn lookup_credential(&self, _email_normalized: &str) -> Result<Option<CredentialRecord>> {
        Err(anyhow!("connection refused"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn hash_password_produces_argon2id_phc() -> Result<()> {
        let hash = hash_password("secret1")?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(password_matches("secret1", &hash));
        assert!(!password_matches("secret2", &hash));
        Ok(())
    }

    #[test]
    fn hash_password_salts_each_hash() -> Result<()> {
        assert_ne!(hash_password("secret1")?, hash_password("secret1")?);
        Ok(())
    }

    #[test]
    fn bcrypt_hashes_still_verify() {
        // crypt_blowfish reference vector
        let hash = "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW";
        assert!(password_matches("U*U", hash));
        assert!(!password_matches("U*V", hash));
    }

    #[test]
    fn bcrypt_prefix_variants_dispatch_to_bcrypt() {
        for prefix in ["$2b$", "$2y$"] {
            let hash = format!("{prefix}05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW");
            assert!(password_matches("U*U", &hash), "{prefix} should verify");
        }
        assert!(!password_matches("U*U", "$2b$05$truncated"));
    }

    #[tokio::test]
    async fn verify_accepts_bcrypt_seeded_user() -> Result<()> {
        let store = Arc::new(MemoryCredentialStore {
            records: vec![CredentialRecord {
                user_id: Uuid::new_v4(),
                email: "legacy@test.com".to_string(),
                password_hash: "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW"
                    .to_string(),
            }],
        });
        let verifier = CredentialVerifier::new(store)?;

        let identity = verifier.verify("Legacy@Test.com", &secret("U*U")).await?;
        assert_eq!(identity.email, "legacy@test.com");
        let mismatch = verifier.verify("legacy@test.com", &secret("secret1")).await;
        assert!(matches!(mismatch, Err(AuthFailure::SecretMismatch)));
        Ok(())
    }

    #[test]
    fn unparsable_hash_never_matches() {
        assert!(!password_matches("secret1", "plaintext-secret1"));
        assert!(!password_matches("", ""));
    }

    #[tokio::test]
    async fn verify_accepts_normalized_email() -> Result<()> {
        let store = Arc::new(MemoryCredentialStore::with_user("user@test.com", "secret1")?);
        let expected = store.user_id("user@test.com");
        let verifier = CredentialVerifier::new(store)?;

        let identity = verifier.verify("USER@TEST.com ", &secret("secret1")).await?;
        assert_eq!(Some(identity.user_id), expected);
        assert_eq!(identity.email, "user@test.com");
        Ok(())
    }

    #[tokio::test]
    async fn verify_reports_mismatch_and_not_found() -> Result<()> {
        let store = Arc::new(MemoryCredentialStore::with_user("user@test.com", "secret1")?);
        let verifier = CredentialVerifier::new(store)?;

        let mismatch = verifier.verify("user@test.com", &secret("wrong")).await;
        assert!(matches!(mismatch, Err(AuthFailure::SecretMismatch)));

        let missing = verifier.verify("nobody@test.com", &secret("secret1")).await;
        assert!(matches!(missing, Err(AuthFailure::NotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn verify_surfaces_store_failure() -> Result<()> {
        let verifier = CredentialVerifier::new(Arc::new(FailingCredentialStore))?;
        let result = verifier.verify("user@test.com", &secret("secret1")).await;
        assert!(matches!(result, Err(AuthFailure::Unavailable(_))));
        Ok(())
    }
}
