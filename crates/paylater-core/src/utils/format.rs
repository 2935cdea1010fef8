use std::cmp::Ordering;

use chrono::NaiveDateTime;

/// Currency symbol used by the service for all amounts
pub const CURRENCY_SYMBOL: &str = "₹";

/// Format an amount with the currency symbol and two decimals
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-{}{:.2}", CURRENCY_SYMBOL, amount.abs())
    } else {
        format!("{}{:.2}", CURRENCY_SYMBOL, amount)
    }
}

/// Format a fee percentage, dropping a trailing ".0"
pub fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        let s = format!("{:.2}", value);
        format!("{}%", s.trim_end_matches('0').trim_end_matches('.'))
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        // The service sends naive timestamps
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

/// Case-insensitive substring match; an empty needle matches everything
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive ordering for display sorting
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
