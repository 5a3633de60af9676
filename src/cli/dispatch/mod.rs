//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to an [`Action`]: either hashing a password for
//! seeding, or starting the server with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{session, CMD_HASH_PASSWORD};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some(sub_m) = matches.subcommand_matches(CMD_HASH_PASSWORD) {
        let password = sub_m
            .get_one::<String>("password")
            .cloned()
            .context("missing required argument: <password>")?;
        return Ok(Action::HashPassword {
            password: SecretString::from(password),
        });
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_secret: session_opts.secret,
        session_ttl_seconds: session_opts.ttl_seconds,
        public_url: session_opts.public_url,
    }))
}
