//! Request body and query parsing.
//!
//! JSON bodies keep the field names the web client sends (`curso`,
//! `carpeta`, `nombreActual`, ...). Every field is optional at the parsing
//! stage so that a missing field surfaces as
//! [`ResourceError::MissingParameter`] from the resource service rather
//! than as a malformed body.

use courseshelf_core::error::ResourceError;
use courseshelf_core::service::Page;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::router::RoutingContext;

/// Body of a bulk upload request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkUploadRequest {
    /// Course identifier.
    #[serde(default)]
    pub curso: Option<String>,
    /// Local folder to upload from.
    #[serde(default)]
    pub carpeta: Option<String>,
}

/// Body of a rename request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// Course identifier.
    #[serde(default)]
    pub curso: Option<String>,
    /// Current file name.
    #[serde(default)]
    pub nombre_actual: Option<String>,
    /// New file name.
    #[serde(default)]
    pub nombre_nuevo: Option<String>,
}

/// Body of a delete request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Course identifier.
    #[serde(default)]
    pub curso: Option<String>,
    /// Name of the file to delete.
    #[serde(default)]
    pub nombre_archivo: Option<String>,
}

/// Parse a JSON request body.
///
/// An empty body is treated as `{}`. A `Content-Type` other than JSON is
/// rejected; a missing one is accepted.
///
/// # Errors
///
/// Returns [`ApiError::UnsupportedMediaType`] for non-JSON content types and
/// [`ApiError::MalformedBody`] for bodies that are not a JSON object of the
/// expected shape.
pub fn parse_json_body<T>(headers: &http::HeaderMap, body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if let Some(value) = headers.get(http::header::CONTENT_TYPE) {
        let content_type = value
            .to_str()
            .map_err(|_| ApiError::UnsupportedMediaType("<non-ascii>".to_owned()))?;
        if !is_json(content_type) {
            return Err(ApiError::UnsupportedMediaType(content_type.to_owned()));
        }
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}

fn is_json(content_type: &str) -> bool {
    content_type.parse::<mime::Mime>().is_ok_and(|m| {
        m.type_() == mime::APPLICATION
            && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
    })
}

/// Read `limit` and `offset` from the query string, defaulting to 100 and 0.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidParameter`] when either value is not a
/// non-negative integer.
pub fn parse_page(ctx: &RoutingContext) -> Result<Page, ApiError> {
    let defaults = Page::default();
    Ok(Page {
        limit: parse_count(ctx, "limit")?.unwrap_or(defaults.limit),
        offset: parse_count(ctx, "offset")?.unwrap_or(defaults.offset),
    })
}

fn parse_count(ctx: &RoutingContext, name: &str) -> Result<Option<usize>, ApiError> {
    let Some(raw) = ctx.query_param(name).map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<usize>().map(Some).map_err(|_| {
        ApiError::Resource(ResourceError::InvalidParameter {
            name: name.to_owned(),
            reason: format!("expected a non-negative integer, got {raw:?}"),
        })
    })
}
