//! Dashboard data endpoints (overview, invoices, customers).
//!
//! Everything here lives under the protected prefixes, so handlers can rely on
//! the route gate having attached an [`Identity`](super::auth::Identity).

pub mod customers;
pub mod format;
pub mod invoices;
pub mod overview;
mod storage;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tracing::error;

#[derive(Debug)]
pub enum DashboardError {
    NotFound,
    Database {
        message: &'static str,
        source: anyhow::Error,
    },
}

impl DashboardError {
    pub(crate) fn database(message: &'static str, source: anyhow::Error) -> Self {
        Self::Database { message, source }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Database { message, source } => {
                error!("{message} {source:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

/// Routes for the dashboard data layer.
pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(overview::overview))
        .route(
            "/dashboard/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/dashboard/invoices/create",
            get(invoices::create_invoice_form),
        )
        .route("/invoices/create", get(invoices::create_invoice_form))
        .route(
            "/dashboard/invoices/:id",
            post(invoices::update_invoice).delete(invoices::delete_invoice),
        )
        .route("/dashboard/invoices/:id/edit", get(invoices::edit_invoice_form))
        .route(
            "/dashboard/invoices/:id/delete",
            post(invoices::delete_invoice_form),
        )
        .route("/dashboard/customers", get(customers::list_customers))
}
