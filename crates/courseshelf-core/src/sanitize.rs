//! File name sanitizing and validation.
//!
//! Uploaded display names are turned into ASCII storage key segments:
//! accents are stripped through canonical decomposition, and anything outside
//! `[A-Za-z0-9._-]` becomes `-`.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{ResourceError, ResourceResult};

/// Strip diacritics by decomposing to NFD and dropping combining marks.
pub(crate) fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Sanitize an uploaded file name into a safe storage key segment.
///
/// The result is idempotent: sanitizing it again yields the same string.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidName`] if nothing is left after
/// sanitizing, or if the result is the reserved segment `.` or `..`.
///
/// # Examples
///
/// ```
/// use courseshelf_core::sanitize::sanitize;
///
/// assert_eq!(sanitize("Tárea Final #1.pdf").unwrap(), "Tarea-Final--1.pdf");
/// assert!(sanitize("").is_err());
/// ```
pub fn sanitize(original_name: &str) -> ResourceResult<String> {
    let sanitized: String = strip_diacritics(original_name)
        .chars()
        .map(|c| if is_allowed(c) { c } else { '-' })
        .collect();

    if sanitized.is_empty() {
        return Err(ResourceError::invalid_name(
            original_name,
            "name is empty after sanitizing",
        ));
    }
    if sanitized == "." || sanitized == ".." {
        return Err(ResourceError::invalid_name(
            original_name,
            "name is a reserved path segment",
        ));
    }
    Ok(sanitized)
}

/// Check that a caller-supplied name can be used as a single key segment.
///
/// Unlike [`sanitize`] this does not rewrite the name; it only rejects names
/// that would escape or split the course folder.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidName`] for empty names, `.`/`..`, names
/// containing `/`, and names with control characters.
pub fn validate_segment(name: &str) -> ResourceResult<()> {
    if name.is_empty() {
        return Err(ResourceError::invalid_name(name, "name is empty"));
    }
    if name == "." || name == ".." {
        return Err(ResourceError::invalid_name(
            name,
            "name is a reserved path segment",
        ));
    }
    if name.contains('/') {
        return Err(ResourceError::invalid_name(name, "name contains '/'"));
    }
    if name.chars().any(char::is_control) {
        return Err(ResourceError::invalid_name(
            name,
            "name contains control characters",
        ));
    }
    Ok(())
}

/// Sort key for locale-aware, case- and accent-insensitive name ordering.
#[must_use]
pub fn collation_key(name: &str) -> String {
    strip_diacritics(name).to_lowercase()
}
