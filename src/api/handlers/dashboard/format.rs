//! Currency and pagination helpers shared by the dashboard endpoints.

/// Rows per page on the invoices table.
pub const ITEMS_PER_PAGE: i64 = 6;

/// Render cents as US dollars, e.g. `123456` → `$1,234.56`.
#[must_use]
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = abs / 100;
    let remainder = abs % 100;
    format!("{sign}${}.{remainder:02}", group_thousands(dollars))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Number of pages needed for `count` rows.
#[must_use]
pub fn total_pages(count: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (count + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE
    }
}

/// Clamp a requested page to at least 1.
#[must_use]
pub fn current_page(requested: Option<i64>) -> i64 {
    requested.unwrap_or(1).max(1)
}

/// Row offset for a (clamped) page number.
#[must_use]
pub fn page_offset(page: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(ITEMS_PER_PAGE)
}

/// Cents stored in the database back to dollars for edit forms.
#[must_use]
pub fn cents_to_dollars(cents: i32) -> f64 {
    f64::from(cents) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_currency_groups_thousands() {
        assert_eq!(format_currency(0), "$0.00");
        assert_eq!(format_currency(5), "$0.05");
        assert_eq!(format_currency(15_795), "$157.95");
        assert_eq!(format_currency(123_456), "$1,234.56");
        assert_eq!(format_currency(100_000_000), "$1,000,000.00");
    }

    #[test]
    fn format_currency_negative() {
        assert_eq!(format_currency(-500), "-$5.00");
        assert_eq!(format_currency(-123_456), "-$1,234.56");
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(6), 1);
        assert_eq!(total_pages(7), 2);
        assert_eq!(total_pages(13), 3);
    }

    #[test]
    fn current_page_clamps_to_one() {
        assert_eq!(current_page(None), 1);
        assert_eq!(current_page(Some(0)), 1);
        assert_eq!(current_page(Some(-4)), 1);
        assert_eq!(current_page(Some(3)), 3);
    }

    #[test]
    fn page_offset_uses_page_size() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), 6);
        assert_eq!(page_offset(4), 18);
    }

    #[test]
    fn cents_to_dollars_divides() {
        assert!((cents_to_dollars(15_795) - 157.95).abs() < f64::EPSILON);
    }
}
