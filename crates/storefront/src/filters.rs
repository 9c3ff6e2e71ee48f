//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Turns a Shopify enum value into a label: `PARTIALLY_FULFILLED` → `Partially fulfilled`.
///
/// Usage in templates: `{{ order.financial_status|status_label }}`
#[askama::filter_fn]
pub fn status_label(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(humanize_enum(&value.to_string()))
}

/// Percent-encodes a value for use in a query string.
///
/// Usage in templates: `/search?q={{ suggestion.text|query_param }}`
#[askama::filter_fn]
pub fn query_param(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(encode_query(&value.to_string()))
}

fn encode_query(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn humanize_enum(value: &str) -> String {
    let lower = value.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
