//! Dashboard landing data: cards, revenue chart, latest invoices.

use axum::{extract::Extension, response::Json};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{format::format_currency, storage, DashboardError};
use crate::api::handlers::auth::Identity;

#[derive(Debug, Serialize, ToSchema)]
pub struct CardData {
    pub number_of_invoices: i64,
    pub number_of_customers: i64,
    pub total_paid_invoices: String,
    pub total_pending_invoices: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Revenue {
    pub month: String,
    /// Whole dollars.
    pub revenue: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestInvoice {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Overview {
    /// Email of the signed-in user.
    pub email: String,
    pub cards: CardData,
    pub revenue: Vec<Revenue>,
    pub latest_invoices: Vec<LatestInvoice>,
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard overview", body = Overview),
        (status = 307, description = "No valid session; redirects to /login"),
        (status = 500, description = "Failed to fetch dashboard data")
    ),
    tag = "dashboard"
)]
pub async fn overview(
    identity: Identity,
    pool: Extension<PgPool>,
) -> Result<Json<Overview>, DashboardError> {
    let (totals, revenue, latest) = tokio::try_join!(
        async {
            storage::fetch_card_totals(&pool)
                .await
                .map_err(|err| DashboardError::database("Failed to fetch card data.", err))
        },
        async {
            storage::fetch_revenue(&pool)
                .await
                .map_err(|err| DashboardError::database("Failed to fetch revenue data.", err))
        },
        async {
            storage::fetch_latest_invoices(&pool)
                .await
                .map_err(|err| DashboardError::database("Failed to fetch the latest invoices.", err))
        },
    )?;

    Ok(Json(Overview {
        email: identity.email,
        cards: CardData {
            number_of_invoices: totals.invoices,
            number_of_customers: totals.customers,
            total_paid_invoices: format_currency(totals.paid),
            total_pending_invoices: format_currency(totals.pending),
        },
        revenue: revenue
            .into_iter()
            .map(|row| Revenue {
                month: row.month,
                revenue: row.revenue,
            })
            .collect(),
        latest_invoices: latest
            .into_iter()
            .map(|row| LatestInvoice {
                id: row.id,
                name: row.name,
                email: row.email,
                image_url: row.image_url,
                amount: format_currency(i64::from(row.amount)),
            })
            .collect(),
    }))
}
