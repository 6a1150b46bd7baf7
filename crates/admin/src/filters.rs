//! Custom Askama template filters for the admin pages.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens long text for table cells.
///
/// Usage in templates: `{{ review.body|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string(), EXCERPT_CHARS))
}

const EXCERPT_CHARS: usize = 120;

fn shorten(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}
