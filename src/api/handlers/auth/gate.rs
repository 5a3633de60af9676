//! Route gate: classify every request path and demand a session where needed.
//!
//! Precedence:
//! 1) public prefix → pass through,
//! 2) no protected prefix → pass through,
//! 3) protected → valid session or `307` to `/login?callbackUrl=...`.
//!
//! Prefixes match whole path segments: `/dashboard` covers `/dashboard` and
//! `/dashboard/invoices` but not `/dashboardXYZ`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{
    session::{extract_session_token, SessionStatus},
    state::AuthState,
    utils::login_redirect_target,
};

const PUBLIC_PREFIXES: [&str; 2] = ["/login", "/signup"];
const PROTECTED_PREFIXES: [&str; 2] = ["/dashboard", "/invoices/create"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
    Unclassified,
}

/// Static public and protected prefix sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRules {
    public: Vec<String>,
    protected: Vec<String>,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self::new(PUBLIC_PREFIXES, PROTECTED_PREFIXES)
    }
}

impl RouteRules {
    #[must_use]
    pub fn new<P, Q>(public: P, protected: Q) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            public: public.into_iter().map(Into::into).collect(),
            protected: protected.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.public.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::Public
        } else if self.protected.iter().any(|prefix| matches_prefix(path, prefix)) {
            RouteClass::Protected
        } else {
            RouteClass::Unclassified
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Middleware run in front of every handler.
pub async fn route_gate(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if auth_state.rules().classify(path) != RouteClass::Protected {
        return next.run(request).await;
    }

    let token = extract_session_token(request.headers());
    match auth_state.validator().validate(token.as_deref()) {
        SessionStatus::Authenticated(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        status => {
            let original = request
                .uri()
                .path_and_query()
                .map_or_else(|| request.uri().path(), |pq| pq.as_str());
            debug!(path = %request.uri().path(), ?status, "Protected route without a valid session");
            Redirect::temporary(&login_redirect_target(original)).into_response()
        }
    }
}
