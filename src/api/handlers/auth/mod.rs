//! Password login, signed sessions, and the route gate.
//!
//! Flow Overview:
//! - Login: normalize email → [`CredentialStore`] lookup → Argon2id comparison
//!   → [`SessionIssuer`] mints a token → `ledgerly_session` cookie.
//! - Every request: [`route_gate`] classifies the path; protected paths need a
//!   token that [`SessionValidator`] accepts, otherwise the browser is sent to
//!   `/login` with the original path in `callbackUrl`.
//!
//! Bad credentials and store outages all render the same "Invalid
//! credentials." page; the cause is only logged.

mod credentials;
mod gate;
pub(crate) mod login;
mod principal;
mod session;
mod state;
mod token;
mod utils;


pub use credentials::{
    hash_password, AuthFailure, CredentialRecord, CredentialStore, CredentialVerifier,
    PgCredentialStore,
};
pub use gate::{route_gate, RouteClass, RouteRules};
pub use login::{login, login_page, logout, LoginForm, LoginQuery};
pub use principal::{current_identity, Identity};
pub use session::{IssuedSession, SessionIssuer, SessionStatus, SessionValidator, SESSION_COOKIE_NAME};
pub use state::{AuthConfig, AuthState};
pub use token::{SessionKey, SigningKeyError, TokenError};

#[cfg(test)]
pub(crate) use credentials::{FailingCredentialStore, MemoryCredentialStore};
