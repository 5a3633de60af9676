use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Debug)]
pub struct Banner {
    name: String,
    version: String,
    docs: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service name and version", body = Banner)
    ),
    tag = "health"
)]
pub async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(Banner {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            docs: "/openapi.json".to_string(),
        }),
    )
}
