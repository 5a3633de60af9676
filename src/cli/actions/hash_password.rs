use crate::api::handlers::auth::hash_password;
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

/// Print the PHC string for a password so it can be stored in `users.password`.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn execute(password: &SecretString) -> Result<()> {
    let hash = hash_password(password.expose_secret())?;
    println!("{hash}");
    Ok(())
}
