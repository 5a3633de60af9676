//! Database helpers for invoices, customers, and revenue.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::format::{page_offset, ITEMS_PER_PAGE};
use super::invoices::InvoiceInput;

fn db_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

pub(super) struct RevenueRow {
    pub(super) month: String,
    pub(super) revenue: i32,
}

pub(super) struct LatestInvoiceRow {
    pub(super) id: Uuid,
    pub(super) amount: i32,
    pub(super) name: String,
    pub(super) email: String,
    pub(super) image_url: String,
}

pub(super) struct CardTotals {
    pub(super) invoices: i64,
    pub(super) customers: i64,
    pub(super) paid: i64,
    pub(super) pending: i64,
}

pub(super) struct InvoiceTableRow {
    pub(super) id: Uuid,
    pub(super) amount: i32,
    pub(super) date: NaiveDate,
    pub(super) status: String,
    pub(super) name: String,
    pub(super) email: String,
    pub(super) image_url: String,
}

pub(super) struct InvoiceRecord {
    pub(super) id: Uuid,
    pub(super) customer_id: Uuid,
    pub(super) amount: i32,
    pub(super) status: String,
}

pub(super) struct CustomerNameRow {
    pub(super) id: Uuid,
    pub(super) name: String,
}

pub(super) struct CustomerTotalsRow {
    pub(super) id: Uuid,
    pub(super) name: String,
    pub(super) email: String,
    pub(super) image_url: String,
    pub(super) total_invoices: i64,
    pub(super) total_pending: i64,
    pub(super) total_paid: i64,
}

fn like_pattern(query: &str) -> String {
    format!("%{query}%")
}

pub(super) async fn fetch_revenue(pool: &PgPool) -> Result<Vec<RevenueRow>> {
    let query = "SELECT month, revenue FROM revenue";
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to fetch revenue")?;

    Ok(rows
        .into_iter()
        .map(|row| RevenueRow {
            month: row.get("month"),
            revenue: row.get("revenue"),
        })
        .collect())
}

pub(super) async fn fetch_latest_invoices(pool: &PgPool) -> Result<Vec<LatestInvoiceRow>> {
    let query = r"
        SELECT invoices.id, invoices.amount, customers.name, customers.email, customers.image_url
        FROM invoices
        JOIN customers ON invoices.customer_id = customers.id
        ORDER BY invoices.date DESC
        LIMIT 5
    ";
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to fetch latest invoices")?;

    Ok(rows
        .into_iter()
        .map(|row| LatestInvoiceRow {
            id: row.get("id"),
            amount: row.get("amount"),
            name: row.get("name"),
            email: row.get("email"),
            image_url: row.get("image_url"),
        })
        .collect())
}

pub(super) async fn fetch_card_totals(pool: &PgPool) -> Result<CardTotals> {
    let query = r"
        SELECT
            (SELECT COUNT(*) FROM invoices) AS invoices,
            (SELECT COUNT(*) FROM customers) AS customers,
            (SELECT COALESCE(SUM(amount), 0)::BIGINT FROM invoices WHERE status = 'paid') AS paid,
            (SELECT COALESCE(SUM(amount), 0)::BIGINT FROM invoices WHERE status = 'pending') AS pending
    ";
    let row = sqlx::query(query)
        .fetch_one(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to fetch card totals")?;

    Ok(CardTotals {
        invoices: row.get("invoices"),
        customers: row.get("customers"),
        paid: row.get("paid"),
        pending: row.get("pending"),
    })
}

pub(super) async fn fetch_filtered_invoices(
    pool: &PgPool,
    search: &str,
    page: i64,
) -> Result<Vec<InvoiceTableRow>> {
    let query = r"
        SELECT
            invoices.id,
            invoices.amount,
            invoices.date,
            invoices.status,
            customers.name,
            customers.email,
            customers.image_url
        FROM invoices
        JOIN customers ON invoices.customer_id = customers.id
        WHERE
            customers.name ILIKE $1 OR
            customers.email ILIKE $1 OR
            invoices.amount::text ILIKE $1 OR
            invoices.date::text ILIKE $1 OR
            invoices.status ILIKE $1
        ORDER BY invoices.date DESC
        LIMIT $2 OFFSET $3
    ";
    let rows = sqlx::query(query)
        .bind(like_pattern(search))
        .bind(ITEMS_PER_PAGE)
        .bind(page_offset(page))
        .fetch_all(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to fetch filtered invoices")?;

    Ok(rows
        .into_iter()
        .map(|row| InvoiceTableRow {
            id: row.get("id"),
            amount: row.get("amount"),
            date: row.get("date"),
            status: row.get("status"),
            name: row.get("name"),
            email: row.get("email"),
            image_url: row.get("image_url"),
        })
        .collect())
}

pub(super) async fn count_filtered_invoices(pool: &PgPool, search: &str) -> Result<i64> {
    let query = r"
        SELECT COUNT(*) AS count
        FROM invoices
        JOIN customers ON invoices.customer_id = customers.id
        WHERE
            customers.name ILIKE $1 OR
            customers.email ILIKE $1 OR
            invoices.amount::text ILIKE $1 OR
            invoices.date::text ILIKE $1 OR
            invoices.status ILIKE $1
    ";
    let row = sqlx::query(query)
        .bind(like_pattern(search))
        .fetch_one(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to count filtered invoices")?;
    Ok(row.get("count"))
}

pub(super) async fn fetch_invoice_by_id(pool: &PgPool, id: Uuid) -> Result<Option<InvoiceRecord>> {
    let query = "SELECT id, customer_id, amount, status FROM invoices WHERE id = $1 LIMIT 1";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to fetch invoice")?;

    Ok(row.map(|row| InvoiceRecord {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        amount: row.get("amount"),
        status: row.get("status"),
    }))
}

pub(super) async fn fetch_customers(pool: &PgPool) -> Result<Vec<CustomerNameRow>> {
    let query = "SELECT id, name FROM customers ORDER BY name ASC";
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to fetch customers")?;

    Ok(rows
        .into_iter()
        .map(|row| CustomerNameRow {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

pub(super) async fn fetch_filtered_customers(
    pool: &PgPool,
    search: &str,
) -> Result<Vec<CustomerTotalsRow>> {
    let query = r"
        SELECT
            customers.id,
            customers.name,
            customers.email,
            customers.image_url,
            COUNT(invoices.id) AS total_invoices,
            COALESCE(SUM(CASE WHEN invoices.status = 'pending' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_pending,
            COALESCE(SUM(CASE WHEN invoices.status = 'paid' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_paid
        FROM customers
        LEFT JOIN invoices ON customers.id = invoices.customer_id
        WHERE
            customers.name ILIKE $1 OR
            customers.email ILIKE $1
        GROUP BY customers.id, customers.name, customers.email, customers.image_url
        ORDER BY customers.name ASC
    ";
    let rows = sqlx::query(query)
        .bind(like_pattern(search))
        .fetch_all(pool)
        .instrument(db_span("SELECT", query))
        .await
        .context("failed to fetch customer table")?;

    Ok(rows
        .into_iter()
        .map(|row| CustomerTotalsRow {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            image_url: row.get("image_url"),
            total_invoices: row.get("total_invoices"),
            total_pending: row.get("total_pending"),
            total_paid: row.get("total_paid"),
        })
        .collect())
}

pub(super) async fn insert_invoice(pool: &PgPool, input: &InvoiceInput, date: NaiveDate) -> Result<Uuid> {
    let query = r"
        INSERT INTO invoices (customer_id, amount, status, date)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ";
    let row = sqlx::query(query)
        .bind(input.customer_id)
        .bind(input.amount_cents)
        .bind(input.status.as_str())
        .bind(date)
        .fetch_one(pool)
        .instrument(db_span("INSERT", query))
        .await
        .context("failed to create invoice")?;
    Ok(row.get("id"))
}

/// Returns `false` when no invoice has the given id.
pub(super) async fn update_invoice(pool: &PgPool, id: Uuid, input: &InvoiceInput) -> Result<bool> {
    let query = r"
        UPDATE invoices
        SET customer_id = $1, amount = $2, status = $3
        WHERE id = $4
    ";
    let result = sqlx::query(query)
        .bind(input.customer_id)
        .bind(input.amount_cents)
        .bind(input.status.as_str())
        .bind(id)
        .execute(pool)
        .instrument(db_span("UPDATE", query))
        .await
        .context("failed to update invoice")?;
    Ok(result.rows_affected() > 0)
}

/// Returns `false` when no invoice has the given id.
pub(super) async fn delete_invoice(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM invoices WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(db_span("DELETE", query))
        .await
        .context("failed to delete invoice")?;
    Ok(result.rows_affected() > 0)
}
