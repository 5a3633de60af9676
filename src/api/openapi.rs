use super::handlers::{auth, dashboard, health, root};
use axum::Json;
use utoipa::{
    openapi::{Contact, License, OpenApi as OpenApiDoc, Tag},
    OpenApi,
};

/// Every documented route. Keep in sync with the router in `api::router`.
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::login::login_page,
        auth::login::login,
        auth::login::logout,
        dashboard::overview::overview,
        dashboard::invoices::list_invoices,
        dashboard::invoices::create_invoice_form,
        dashboard::invoices::create_invoice,
        dashboard::invoices::edit_invoice_form,
        dashboard::invoices::update_invoice,
        dashboard::invoices::delete_invoice,
        dashboard::invoices::delete_invoice_form,
        dashboard::customers::list_customers,
    ),
    components(schemas(
        auth::Identity,
        dashboard::invoices::InvoiceStatus,
    ))
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();

    // Use Cargo.toml metadata for the document info.
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = optional_str(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
    doc.info.contact = cargo_contact();
    doc.info.license = cargo_license();

    doc.tags = Some(vec![
        tag("auth", "Login, logout, and session cookies"),
        tag("dashboard", "Overview cards, revenue, latest invoices"),
        tag("invoices", "Invoice listing and editing"),
        tag("customers", "Customers with invoice totals"),
        tag("health", "Service status"),
    ]);

    doc
}

pub(super) async fn openapi_json() -> Json<OpenApiDoc> {
    Json(openapi())
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `:` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(':').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, rest)) => (non_empty(name), non_empty(rest.trim_end_matches('>'))),
        None => (non_empty(author), None),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, "ledgerly");
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));

        let contact = doc.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Ledgerly"));
            assert_eq!(contact.email.as_deref(), Some("team@ledgerly.dev"));
        }

        let license = doc.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_documents_gated_routes() {
        let doc = openapi();
        for path in [
            "/",
            "/health",
            "/login",
            "/logout",
            "/dashboard",
            "/dashboard/invoices",
            "/dashboard/invoices/{id}",
            "/dashboard/invoices/{id}/edit",
            "/dashboard/customers",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let tags = doc.tags.unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
    }

    #[test]
    fn parse_author_splits_name_and_email() {
        assert_eq!(
            parse_author("Team Ledgerly <team@ledgerly.dev>"),
            (Some("Team Ledgerly"), Some("team@ledgerly.dev"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
    }
}
