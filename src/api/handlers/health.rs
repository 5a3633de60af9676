//! Liveness plus database reachability.

use crate::GIT_COMMIT_HASH;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgPool};
use tracing::{debug, error, info_span, Instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

impl Health {
    fn new(database_ok: bool) -> Self {
        Self {
            commit: GIT_COMMIT_HASH.to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if database_ok { "ok" } else { "error" }.to_string(),
        }
    }

    /// `name:version:shorthash`, sent as `X-App`.
    fn app_header(&self) -> HeaderMap {
        let short_hash = self.commit.get(0..7).unwrap_or(&self.commit);
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&format!("{}:{}:{short_hash}", self.name, self.version)) {
            Ok(value) => {
                headers.insert("X-App", value);
            }
            Err(err) => error!("Failed to build X-App header: {err}"),
        }
        headers
    }
}

/// Acquire a pooled connection and ping it.
async fn database_reachable(pool: &PgPool) -> bool {
    let acquire_span = info_span!("db.acquire", db.system = "postgresql", db.operation = "ACQUIRE");
    let mut conn = match pool.acquire().instrument(acquire_span).await {
        Ok(conn) => conn,
        Err(err) => {
            error!("Failed to acquire database connection: {err}");
            return false;
        }
    };

    let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
    match conn.ping().instrument(ping_span).await {
        Ok(()) => true,
        Err(err) => {
            error!("Failed to ping database: {err}");
            false
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database is reachable", body = Health),
        (status = 503, description = "Database is unreachable", body = Health)
    ),
    tag = "health"
)]
pub async fn health(method: Method, pool: Extension<PgPool>) -> Response {
    let database_ok = database_reachable(&pool).await;
    let health = Health::new(database_ok);
    debug!(database = %health.database, "Health check");

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let headers = health.app_header();

    // OPTIONS gets the status and headers only.
    if method == Method::GET {
        (status, headers, Json(health)).into_response()
    } else {
        (status, headers, Body::empty()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_reports_database_state() {
        assert_eq!(Health::new(true).database, "ok");
        assert_eq!(Health::new(false).database, "error");
    }

    #[test]
    fn app_header_uses_short_hash() {
        let health = Health {
            commit: "0123456789abcdef".to_string(),
            name: "ledgerly".to_string(),
            version: "0.1.0".to_string(),
            database: "ok".to_string(),
        };
        let headers = health.app_header();
        assert_eq!(
            headers.get("X-App").and_then(|value| value.to_str().ok()),
            Some("ledgerly:0.1.0:0123456")
        );
    }

    #[test]
    fn app_header_keeps_short_commit() {
        let health = Health {
            commit: "unknown".to_string(),
            name: "ledgerly".to_string(),
            version: "0.1.0".to_string(),
            database: "ok".to_string(),
        };
        assert_eq!(
            health
                .app_header()
                .get("X-App")
                .and_then(|value| value.to_str().ok()),
            Some("ledgerly:0.1.0:unknown")
        );
    }
}
