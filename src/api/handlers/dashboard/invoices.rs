//! Invoice listing, creation, editing, and deletion.
//!
//! Form posts follow the browser pattern: success and validation failures both
//! answer `303 See Other`, the latter with `?error=validation` appended to the
//! invoices list.

use axum::{
    extract::{Extension, Form, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    customers::CustomerField,
    format::{cents_to_dollars, current_page, format_currency, total_pages},
    storage, DashboardError,
};
use crate::api::handlers::auth::Identity;

const INVOICES_PATH: &str = "/dashboard/invoices";
const VALIDATION_FAILED_PATH: &str = "/dashboard/invoices?error=validation";

const MSG_SELECT_CUSTOMER: &str = "Please select a customer.";
const MSG_AMOUNT: &str = "Please enter an amount greater than $0.";
const MSG_SELECT_STATUS: &str = "Please select an invoice status.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// Raw invoice form as posted by the browser.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InvoiceFormInput {
    #[serde(default, rename = "customerId")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Validated invoice fields ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceInput {
    pub customer_id: Uuid,
    pub amount_cents: i32,
    pub status: InvoiceStatus,
}

/// Per-field validation messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceFieldErrors {
    pub customer_id: Option<&'static str>,
    pub amount: Option<&'static str>,
    pub status: Option<&'static str>,
}

impl InvoiceFormInput {
    /// Validate the form and convert the dollar amount into cents.
    ///
    /// # Errors
    /// Returns the message for every field that failed.
    pub fn validate(&self) -> Result<InvoiceInput, InvoiceFieldErrors> {
        let customer_id = self
            .customer_id
            .as_deref()
            .and_then(|value| Uuid::parse_str(value.trim()).ok());
        let amount_cents = self.amount.as_deref().and_then(parse_amount_cents);
        let status = self.status.as_deref().and_then(InvoiceStatus::parse);

        match (customer_id, amount_cents, status) {
            (Some(customer_id), Some(amount_cents), Some(status)) => Ok(InvoiceInput {
                customer_id,
                amount_cents,
                status,
            }),
            (customer_id, amount_cents, status) => Err(InvoiceFieldErrors {
                customer_id: customer_id.is_none().then_some(MSG_SELECT_CUSTOMER),
                amount: amount_cents.is_none().then_some(MSG_AMOUNT),
                status: status.is_none().then_some(MSG_SELECT_STATUS),
            }),
        }
    }
}

/// Dollars → whole cents; rejects anything that is not a positive amount.
fn parse_amount_cents(value: &str) -> Option<i32> {
    let amount: f64 = value.trim().parse().ok()?;
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let cents = (amount * 100.0).round();
    if cents < 1.0 || cents > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(cents as i32)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoicesQuery {
    /// Matches customer name/email, amount, date, or status.
    pub query: Option<String>,
    /// 1-based page; values below 1 are treated as 1.
    pub page: Option<String>,
    /// Set to `validation` after a rejected form post.
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub date: NaiveDate,
    pub amount: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoicesPage {
    pub query: String,
    pub page: i64,
    pub total_pages: i64,
    pub validation_failed: bool,
    pub invoices: Vec<InvoiceSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceForm {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Dollars, not cents.
    pub amount: f64,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateInvoicePage {
    pub customers: Vec<CustomerField>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EditInvoicePage {
    pub invoice: InvoiceForm,
    pub customers: Vec<CustomerField>,
}

#[utoipa::path(
    get,
    path = "/dashboard/invoices",
    params(InvoicesQuery),
    responses(
        (status = 200, description = "One page of invoices matching the search", body = InvoicesPage),
        (status = 307, description = "No valid session; redirects to /login"),
        (status = 500, description = "Failed to fetch invoices.")
    ),
    tag = "invoices"
)]
pub async fn list_invoices(
    pool: Extension<PgPool>,
    Query(params): Query<InvoicesQuery>,
) -> Result<Json<InvoicesPage>, DashboardError> {
    let search = params.query.unwrap_or_default();
    let page = current_page(params.page.as_deref().and_then(|p| p.trim().parse().ok()));

    let (rows, count) = tokio::try_join!(
        async {
            storage::fetch_filtered_invoices(&pool, &search, page)
                .await
                .map_err(|err| DashboardError::database("Failed to fetch invoices.", err))
        },
        async {
            storage::count_filtered_invoices(&pool, &search)
                .await
                .map_err(|err| {
                    DashboardError::database("Failed to fetch total number of invoices.", err)
                })
        },
    )?;

    let invoices = rows
        .into_iter()
        .map(|row| InvoiceSummary {
            id: row.id,
            name: row.name,
            email: row.email,
            image_url: row.image_url,
            date: row.date,
            amount: format_currency(i64::from(row.amount)),
            status: row.status,
        })
        .collect();

    Ok(Json(InvoicesPage {
        query: search,
        page,
        total_pages: total_pages(count),
        validation_failed: params.error.as_deref() == Some("validation"),
        invoices,
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard/invoices/create",
    responses(
        (status = 200, description = "Customers to choose from", body = CreateInvoicePage),
        (status = 500, description = "Failed to fetch all customers.")
    ),
    tag = "invoices"
)]
pub async fn create_invoice_form(
    pool: Extension<PgPool>,
) -> Result<Json<CreateInvoicePage>, DashboardError> {
    let customers = super::customers::customer_fields(&pool).await?;
    Ok(Json(CreateInvoicePage { customers }))
}

#[utoipa::path(
    post,
    path = "/dashboard/invoices",
    request_body(
        content = InvoiceFormInput,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 303, description = "Created, or validation failed (`?error=validation`)"),
        (status = 500, description = "Database Error: Failed to Create Invoice.")
    ),
    tag = "invoices"
)]
pub async fn create_invoice(
    identity: Identity,
    pool: Extension<PgPool>,
    Form(form): Form<InvoiceFormInput>,
) -> Result<Response, DashboardError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            warn!(?errors, "Missing Fields. Failed to Create Invoice.");
            return Ok(Redirect::to(VALIDATION_FAILED_PATH).into_response());
        }
    };

    let id = storage::insert_invoice(&pool, &input, Utc::now().date_naive())
        .await
        .map_err(|err| DashboardError::database("Database Error: Failed to Create Invoice.", err))?;

    info!(user_id = %identity.user_id, invoice_id = %id, "Invoice created");
    Ok(Redirect::to(INVOICES_PATH).into_response())
}

#[utoipa::path(
    get,
    path = "/dashboard/invoices/{id}/edit",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice and customers for the edit form", body = EditInvoicePage),
        (status = 404, description = "No such invoice"),
        (status = 500, description = "Failed to fetch invoice.")
    ),
    tag = "invoices"
)]
pub async fn edit_invoice_form(
    pool: Extension<PgPool>,
    Path(id): Path<String>,
) -> Result<Json<EditInvoicePage>, DashboardError> {
    let id = parse_invoice_id(&id)?;

    let (invoice, customers) = tokio::try_join!(
        async {
            storage::fetch_invoice_by_id(&pool, id)
                .await
                .map_err(|err| DashboardError::database("Failed to fetch invoice.", err))
        },
        super::customers::customer_fields(&pool),
    )?;
    let invoice = invoice.ok_or(DashboardError::NotFound)?;

    Ok(Json(EditInvoicePage {
        invoice: InvoiceForm {
            id: invoice.id,
            customer_id: invoice.customer_id,
            amount: cents_to_dollars(invoice.amount),
            status: invoice.status,
        },
        customers,
    }))
}

#[utoipa::path(
    post,
    path = "/dashboard/invoices/{id}",
    params(("id" = String, Path, description = "Invoice id")),
    request_body(
        content = InvoiceFormInput,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 303, description = "Updated, or validation failed (`?error=validation`)"),
        (status = 404, description = "No such invoice"),
        (status = 500, description = "Database Error: Failed to Update Invoice.")
    ),
    tag = "invoices"
)]
pub async fn update_invoice(
    identity: Identity,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
    Form(form): Form<InvoiceFormInput>,
) -> Result<Response, DashboardError> {
    let id = parse_invoice_id(&id)?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            warn!(?errors, invoice_id = %id, "Missing Fields. Failed to Update Invoice.");
            return Ok(Redirect::to(VALIDATION_FAILED_PATH).into_response());
        }
    };

    let updated = storage::update_invoice(&pool, id, &input)
        .await
        .map_err(|err| DashboardError::database("Database Error: Failed to Update Invoice.", err))?;
    if !updated {
        return Err(DashboardError::NotFound);
    }

    info!(user_id = %identity.user_id, invoice_id = %id, "Invoice updated");
    Ok(Redirect::to(INVOICES_PATH).into_response())
}

#[utoipa::path(
    delete,
    path = "/dashboard/invoices/{id}",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 404, description = "No such invoice"),
        (status = 500, description = "Database Error: Failed to Delete Invoice.")
    ),
    tag = "invoices"
)]
pub async fn delete_invoice(
    identity: Identity,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
) -> Result<StatusCode, DashboardError> {
    remove_invoice(&identity, &pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/dashboard/invoices/{id}/delete",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 303, description = "Invoice deleted; redirects to the invoices list"),
        (status = 404, description = "No such invoice"),
        (status = 500, description = "Database Error: Failed to Delete Invoice.")
    ),
    tag = "invoices"
)]
pub async fn delete_invoice_form(
    identity: Identity,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
) -> Result<Redirect, DashboardError> {
    remove_invoice(&identity, &pool, &id).await?;
    Ok(Redirect::to(INVOICES_PATH))
}

async fn remove_invoice(identity: &Identity, pool: &PgPool, id: &str) -> Result<(), DashboardError> {
    let id = parse_invoice_id(id)?;
    let deleted = storage::delete_invoice(pool, id)
        .await
        .map_err(|err| DashboardError::database("Database Error: Failed to Delete Invoice.", err))?;
    if !deleted {
        return Err(DashboardError::NotFound);
    }
    info!(user_id = %identity.user_id, invoice_id = %id, "Invoice deleted");
    Ok(())
}

fn parse_invoice_id(id: &str) -> Result<Uuid, DashboardError> {
    Uuid::parse_str(id).map_err(|_| DashboardError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(customer_id: &str, amount: &str, status: &str) -> InvoiceFormInput {
        InvoiceFormInput {
            customer_id: Some(customer_id.to_string()),
            amount: Some(amount.to_string()),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn validate_converts_dollars_to_cents() {
        let customer = Uuid::new_v4();
        let input = form(&customer.to_string(), "157.95", "paid").validate();
        assert_eq!(
            input,
            Ok(InvoiceInput {
                customer_id: customer,
                amount_cents: 15_795,
                status: InvoiceStatus::Paid,
            })
        );
    }

    #[test]
    fn validate_rounds_to_nearest_cent() {
        let customer = Uuid::new_v4().to_string();
        let input = form(&customer, "19.999", "pending").validate();
        assert_eq!(input.map(|i| i.amount_cents), Ok(2000));
        let input = form(&customer, "0.1", "pending").validate();
        assert_eq!(input.map(|i| i.amount_cents), Ok(10));
    }

    #[test]
    fn validate_reports_every_bad_field() {
        let errors = InvoiceFormInput::default().validate();
        assert_eq!(
            errors,
            Err(InvoiceFieldErrors {
                customer_id: Some("Please select a customer."),
                amount: Some("Please enter an amount greater than $0."),
                status: Some("Please select an invoice status."),
            })
        );
    }

    #[test]
    fn validate_rejects_non_positive_amounts() {
        let customer = Uuid::new_v4().to_string();
        for amount in ["0", "-5", "abc", "NaN", "inf", "0.001"] {
            let errors = form(&customer, amount, "paid").validate();
            assert!(
                matches!(&errors, Err(e) if e.amount == Some(MSG_AMOUNT) && e.customer_id.is_none()),
                "amount {amount:?} should be rejected"
            );
        }
    }

    #[test]
    fn validate_rejects_unknown_status_and_customer() {
        let errors = form("not-a-uuid", "10", "overdue").validate();
        assert_eq!(
            errors,
            Err(InvoiceFieldErrors {
                customer_id: Some(MSG_SELECT_CUSTOMER),
                amount: None,
                status: Some(MSG_SELECT_STATUS),
            })
        );
    }

    #[test]
    fn invoice_status_serializes_lowercase() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Pending)?, "\"pending\"");
        assert_eq!(InvoiceStatus::Paid.as_str(), "paid");
        Ok(())
    }

    #[test]
    fn parse_invoice_id_maps_garbage_to_not_found() {
        assert!(matches!(parse_invoice_id("nope"), Err(DashboardError::NotFound)));
        assert!(parse_invoice_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
