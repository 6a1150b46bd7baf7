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

/// Renders a 1-5 rating as filled and empty stars.
///
/// Usage in templates: `{{ review.rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(&rating.to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5
fn star_string(rating: &str) -> String {
    let filled = rating
        .parse::<f64>()
        .map_or(0, |r| r.round().clamp(0.0, 5.0) as usize);
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_string() {
        assert_eq!(star_string("4"), "★★★★☆");
        assert_eq!(star_string("4.6"), "★★★★★");
        assert_eq!(star_string("9"), "★★★★★");
        assert_eq!(star_string("n/a"), "☆☆☆☆☆");
    }
}
