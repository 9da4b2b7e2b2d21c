//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same rules.

use chrono::{DateTime, Utc};

use crate::{EngineError, ResultEngine};

/// Default and maximum page sizes for list operations.
pub(crate) const DEFAULT_PAGE_SIZE: u64 = 20;
pub(crate) const MAX_PAGE_SIZE: u64 = 100;

/// Trims `value` and checks it has at least `min_chars` characters.
pub(crate) fn normalize_required(value: &str, label: &str, min_chars: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < min_chars {
        return Err(EngineError::Validation(format!(
            "{label} must have at least {min_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims optional free text, mapping blank strings to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Lowercases an email and checks its rough shape (`local@domain.tld`).
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(EngineError::Validation(format!("invalid email: {email}")));
    }
    Ok(email)
}

/// Accepts only absolute `http(s)` URLs.
pub(crate) fn validate_url(value: &str) -> ResultEngine<String> {
    let url = value.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !url.chars().any(char::is_whitespace) => {
            Ok(url.to_string())
        }
        _ => Err(EngineError::Validation(format!("invalid url: {url}"))),
    }
}

pub(crate) fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> ResultEngine<()> {
    if end <= start {
        return Err(EngineError::Validation(
            "end_date must be after start_date".to_string(),
        ));
    }
    Ok(())
}

/// Clamps 1-based pagination input and returns `(page, page_size)`.
pub(crate) fn page_bounds(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn emails() {
        assert_eq!(normalize_email(" Ana@Trekko.com.br ").unwrap(), "ana@trekko.com.br");
        assert!(normalize_email("ana").is_err());
        assert!(normalize_email("@trekko.com").is_err());
        assert!(normalize_email("ana@trekko").is_err());
        assert!(normalize_email("ana@@trekko.com").is_err());
        assert!(normalize_email("a na@trekko.com").is_err());
    }

    #[test]
    fn urls() {
        assert!(validate_url("https://cdn.trekko.com/a.jpg").is_ok());
        assert!(validate_url("http://x").is_ok());
        assert!(validate_url("ftp://x").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("https://a b").is_err());
    }

    #[test]
    fn names_and_text() {
        assert_eq!(normalize_required("  Pico  ", "name", 2).unwrap(), "Pico");
        assert!(normalize_required(" a ", "name", 2).is_err());
        assert_eq!(normalize_optional_text(Some("   ")), None);
        assert_eq!(normalize_optional_text(Some(" hi ")), Some("hi".to_string()));
    }

    #[test]
    fn dates_and_pages() {
        let now = Utc::now();
        assert!(validate_date_range(now, now + Duration::hours(1)).is_ok());
        assert!(validate_date_range(now, now).is_err());
        assert_eq!(page_bounds(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(page_bounds(Some(0), Some(1_000)), (1, MAX_PAGE_SIZE));
        assert_eq!(page_bounds(Some(3), Some(0)), (3, 1));
    }
}
