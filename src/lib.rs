//! # Ledgerly (Invoicing Dashboard)
//!
//! `ledgerly` serves an invoicing dashboard: signed-in users list, create, edit
//! and delete customer invoices, and read aggregate figures (revenue, paid and
//! pending totals, latest invoices).
//!
//! ## Authentication
//!
//! Users sign in with an email and password. Credentials are stored as
//! Argon2id PHC strings and are seeded out-of-band (see the `hash-password`
//! subcommand). A successful login mints an HMAC-SHA256 signed session token
//! carried in the `ledgerly_session` cookie.
//!
//! Unknown emails and wrong passwords produce the same response and cost the
//! same hash comparison; only the server logs tell them apart.
//!
//! ## Route Gate
//!
//! Every request passes through the gate before reaching a handler:
//!
//! - `/login` and `/signup` are always reachable.
//! - `/dashboard` and `/invoices/create` (and their subpaths) require a valid
//!   session; otherwise the gate redirects to `/login?callbackUrl=<path>`.
//! - Anything else is not gated.
//!
//! Prefixes match on path-segment boundaries, so `/dashboardXYZ` is not
//! protected.
//!
//! ## Sessions
//!
//! Tokens are stateless. Expiry is the only invalidation mechanism; logging out
//! clears the cookie but a copied token keeps working until it expires.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
