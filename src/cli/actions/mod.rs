pub mod hash_password;
pub mod server;

use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    HashPassword { password: SecretString },
}

impl Action {
    /// Run the selected action to completion.
    ///
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<()> {
        match self {
            Self::Server(args) => server::execute(args).await,
            Self::HashPassword { password } => hash_password::execute(&password),
        }
    }
}
