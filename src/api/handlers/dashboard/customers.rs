//! Customer listing with per-customer invoice totals.

use axum::{
    extract::{Extension, Query},
    response::Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{format::format_currency, storage, DashboardError};

/// Customer option for invoice forms.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerField {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomersQuery {
    /// Matches customer name or email.
    pub query: Option<String>,
}

#[utoipa::path(
    get,
    path = "/dashboard/customers",
    params(CustomersQuery),
    responses(
        (status = 200, description = "Customers ordered by name", body = [CustomerSummary]),
        (status = 500, description = "Failed to fetch customer table.")
    ),
    tag = "customers"
)]
pub async fn list_customers(
    pool: Extension<PgPool>,
    Query(params): Query<CustomersQuery>,
) -> Result<Json<Vec<CustomerSummary>>, DashboardError> {
    let search = params.query.unwrap_or_default();
    let rows = storage::fetch_filtered_customers(&pool, &search)
        .await
        .map_err(|err| DashboardError::database("Failed to fetch customer table.", err))?;

    Ok(Json(
        rows.into_iter()
            .map(|row| CustomerSummary {
                id: row.id,
                name: row.name,
                email: row.email,
                image_url: row.image_url,
                total_invoices: row.total_invoices,
                total_pending: format_currency(row.total_pending),
                total_paid: format_currency(row.total_paid),
            })
            .collect(),
    ))
}

/// All customers ordered by name, for the invoice forms.
pub(super) async fn customer_fields(pool: &PgPool) -> Result<Vec<CustomerField>, DashboardError> {
    let rows = storage::fetch_customers(pool)
        .await
        .map_err(|err| DashboardError::database("Failed to fetch all customers.", err))?;
    Ok(rows
        .into_iter()
        .map(|row| CustomerField {
            id: row.id,
            name: row.name,
        })
        .collect())
}
