//! Course identifier to storage path resolution.
//!
//! A course code such as `cii-2750` is stored under a category folder derived
//! from its prefix: `eii/CII-2750`. Identifiers that do not match any rule
//! are treated as free-form folder paths and kept exactly as supplied.
//!
//! The rules are plain data ([`EXACT_EXCEPTIONS`] and [`PREFIX_RULES`]),
//! evaluated first-match-wins, so adding a category means adding a row.
//!
//! # Examples
//!
//! ```
//! use courseshelf_core::path::{CategoryTag, resolve};
//!
//! let path = resolve("cii-2750").unwrap();
//! assert_eq!(path.as_str(), "eii/CII-2750");
//! assert_eq!(path.category(), CategoryTag::Eii);
//!
//! // Exact-code exceptions win over the prefix table.
//! assert_eq!(resolve("CIT-1000").unwrap().as_str(), "plan-comun/CIT-1000");
//!
//! // Unknown identifiers are not force-cased.
//! assert_eq!(resolve("Apuntes/2024").unwrap().as_str(), "Apuntes/2024");
//! ```

use std::fmt;

use crate::error::{ResourceError, ResourceResult};

/// Academic program category a course is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryTag {
    /// Common core courses shared across programs.
    PlanComun,
    /// Industrial engineering.
    Eii,
    /// Telematics engineering.
    Eit,
    /// Civil engineering.
    Eoc,
    /// Not a recognized course code.
    None,
}

impl CategoryTag {
    /// The folder name used in storage keys, or `None` for [`CategoryTag::None`].
    #[must_use]
    pub fn folder(self) -> Option<&'static str> {
        match self {
            Self::PlanComun => Some("plan-comun"),
            Self::Eii => Some("eii"),
            Self::Eit => Some("eit"),
            Self::Eoc => Some("eoc"),
            Self::None => None,
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder().unwrap_or("none"))
    }
}

/// Course codes filed under `plan-comun` regardless of their prefix.
pub const EXACT_EXCEPTIONS: &[&str] = &["CIT-1000"];

/// Ordered prefix table; the first matching prefix decides the category.
pub const PREFIX_RULES: &[(&str, CategoryTag)] = &[
    ("CBM-", CategoryTag::PlanComun),
    ("CBF-", CategoryTag::PlanComun),
    ("CBQ-", CategoryTag::PlanComun),
    ("CBE-", CategoryTag::PlanComun),
    ("FIC-", CategoryTag::PlanComun),
    ("CII-", CategoryTag::Eii),
    ("CIT-", CategoryTag::Eit),
    ("COC-", CategoryTag::Eoc),
];

/// Infer the category of a course identifier. Matching is case-insensitive.
#[must_use]
pub fn categorize(identifier: &str) -> CategoryTag {
    let upper = identifier.trim().to_uppercase();
    if EXACT_EXCEPTIONS.contains(&upper.as_str()) {
        return CategoryTag::PlanComun;
    }
    PREFIX_RULES
        .iter()
        .find(|(prefix, _)| upper.starts_with(prefix))
        .map_or(CategoryTag::None, |&(_, tag)| tag)
}

/// Canonical storage key prefix for a course or folder.
///
/// Segments are joined with `/` and never include `.`, `..`, empty segments,
/// or control characters. The empty path denotes the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResourcePath {
    segments: Vec<String>,
    joined: String,
    category: Option<CategoryTag>,
}

impl ResourcePath {
    /// The root path (no segments).
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from a raw `/`-separated string, dropping empty segments.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidPath`] if a segment is `.` or `..`, or
    /// if the path contains a control character.
    pub fn parse(raw: &str) -> ResourceResult<Self> {
        if raw.chars().any(char::is_control) {
            return Err(ResourceError::invalid_path(
                raw,
                "control characters are not allowed",
            ));
        }
        let segments: Vec<String> = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        if segments.iter().any(|s| s == "." || s == "..") {
            return Err(ResourceError::invalid_path(
                raw,
                "relative segments are not allowed",
            ));
        }
        Ok(Self::from_segments(segments, None))
    }

    fn from_segments(segments: Vec<String>, category: Option<CategoryTag>) -> Self {
        let joined = segments.join("/");
        Self {
            segments,
            joined,
            category,
        }
    }

    /// The path as a storage key prefix, without leading or trailing slash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    /// The individual segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the store root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Category the path was resolved under; [`CategoryTag::None`] for free-form paths.
    #[must_use]
    pub fn category(&self) -> CategoryTag {
        self.category.unwrap_or(CategoryTag::None)
    }

    /// Full key of a file directly under this path.
    #[must_use]
    pub fn child_key(&self, name: &str) -> String {
        if self.is_root() {
            name.to_owned()
        } else {
            format!("{}/{name}", self.joined)
        }
    }

    /// Prefix that every direct child key starts with (`""` at the root).
    #[must_use]
    pub fn list_prefix(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("{}/", self.joined)
        }
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

/// Resolve a course identifier (or free-form folder path) to its storage path.
///
/// Recognized course codes become `<category>/<UPPERCASE CODE>`. Anything
/// else is kept as supplied, apart from surrounding whitespace and empty
/// segments. The empty identifier resolves to the root.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidPath`] for free-form paths containing `.`
/// or `..` segments or control characters.
pub fn resolve(identifier: &str) -> ResourceResult<ResourcePath> {
    let trimmed = identifier.trim();
    let category = categorize(trimmed);
    match category.folder() {
        Some(folder) => {
            let code = ResourcePath::parse(&trimmed.to_uppercase())?;
            let mut segments = Vec::with_capacity(code.segments.len() + 1);
            segments.push(folder.to_owned());
            segments.extend(code.segments);
            Ok(ResourcePath::from_segments(segments, Some(category)))
        }
        None => ResourcePath::parse(trimmed),
    }
}
