//! Small helpers for login input handling and redirect targets.

use regex::Regex;

/// Where a successful login lands when no usable callback was supplied.
pub(crate) const DEFAULT_CALLBACK: &str = "/dashboard";

/// Login entry point the gate redirects to.
pub(crate) const LOGIN_PATH: &str = "/login";

/// Minimum password length accepted by the login form.
pub(super) const MIN_PASSWORD_LEN: usize = 6;

/// Normalize an email for credential lookup.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Only same-origin relative paths are honoured as post-login destinations.
pub(super) fn sanitize_callback(callback: Option<&str>) -> String {
    let Some(callback) = callback.map(str::trim).filter(|value| !value.is_empty()) else {
        return DEFAULT_CALLBACK.to_string();
    };
    let same_origin = callback.starts_with('/')
        && !callback.starts_with("//")
        && !callback.starts_with("/\\")
        && !callback.chars().any(char::is_control);
    if same_origin {
        callback.to_string()
    } else {
        DEFAULT_CALLBACK.to_string()
    }
}

/// Build `/login?callbackUrl=<encoded>` for a gated request.
pub(super) fn login_redirect_target(path_and_query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(path_and_query.as_bytes()).collect();
    format!("{LOGIN_PATH}?callbackUrl={encoded}")
}

/// Escape text for use inside HTML element content and quoted attributes.
pub(super) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" USER@TEST.com "), "user@test.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("user@test.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn sanitize_callback_defaults_to_dashboard() {
        assert_eq!(sanitize_callback(None), "/dashboard");
        assert_eq!(sanitize_callback(Some("  ")), "/dashboard");
    }

    #[test]
    fn sanitize_callback_keeps_relative_paths() {
        assert_eq!(
            sanitize_callback(Some("/dashboard/invoices?page=2")),
            "/dashboard/invoices?page=2"
        );
    }

    #[test]
    fn sanitize_callback_rejects_foreign_targets() {
        assert_eq!(sanitize_callback(Some("https://evil.test")), "/dashboard");
        assert_eq!(sanitize_callback(Some("//evil.test/path")), "/dashboard");
        assert_eq!(sanitize_callback(Some("/\\evil.test")), "/dashboard");
        assert_eq!(sanitize_callback(Some("dashboard")), "/dashboard");
    }

    #[test]
    fn login_redirect_target_encodes_path() {
        assert_eq!(
            login_redirect_target("/dashboard/invoices"),
            "/login?callbackUrl=%2Fdashboard%2Finvoices"
        );
        assert_eq!(
            login_redirect_target("/dashboard/invoices?query=a b&page=2"),
            "/login?callbackUrl=%2Fdashboard%2Finvoices%3Fquery%3Da+b%26page%3D2"
        );
    }

    #[test]
    fn escape_html_escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }
}
