//! Authenticated identity attached to gated requests.
//!
//! The route gate validates the session and stores an [`Identity`] in the
//! request extensions. Handlers read it back with the extractor, or with
//! `Option<Identity>` when a session is optional.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions, StatusCode},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User resolved from a valid session token. Lives for one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Identity the gate attached to this request, if any.
#[must_use]
pub fn current_identity(extensions: &Extensions) -> Option<Identity> {
    extensions.get::<Identity>().cloned()
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(&parts.extensions).ok_or(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn extractor_reads_identity_from_extensions() {
        let identity = Identity {
            user_id: Uuid::new_v4(),
            email: "user@test.com".to_string(),
        };
        let mut request = Request::new(());
        request.extensions_mut().insert(identity.clone());
        let (mut parts, ()) = request.into_parts();

        let extracted = Identity::from_request_parts(&mut parts, &()).await;
        assert_eq!(extracted, Ok(identity));
    }

    #[tokio::test]
    async fn extractor_rejects_missing_identity() {
        let (mut parts, ()) = Request::new(()).into_parts();
        let extracted = Identity::from_request_parts(&mut parts, &()).await;
        assert_eq!(extracted, Err(StatusCode::UNAUTHORIZED));
    }
}
