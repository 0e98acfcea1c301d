//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Length of the order reference shown in tables.
const SHORT_ID_LEN: usize = 8;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shorten a UUID to its first eight characters, for order references.
///
/// Usage in templates: `{{ order.id|short_id }}`
#[askama::filter_fn]
pub fn short_id(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string()))
}

fn shorten(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("3f2a9c1e-0b7d-4e55-9a61-2c8f0d4b7e13"), "3f2a9c1e");
        assert_eq!(shorten("abc"), "abc");
    }
}
