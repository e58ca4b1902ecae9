//! JSON response bodies and error formatting.
//!
//! Success bodies follow the web client's contract: listings are bare
//! arrays, mutations answer `{mensaje, data}`, and bulk uploads answer
//! `{mensaje, resultados, exitosos, fallidos}`. Errors are always
//! `{error, code, detalle?}`.

use chrono::{DateTime, Utc};
use courseshelf_core::aggregate::{BulkReport, BulkResult};
use courseshelf_core::service::{StoredObject, WrittenObject};
use http::StatusCode;
use http::header::{CONTENT_TYPE as CONTENT_TYPE_HEADER, HeaderValue};
use serde::Serialize;
use tracing::error;

use crate::body::ResponseBody;
use crate::error::ApiError;

/// Content type of every JSON response.
pub const CONTENT_TYPE: &str = "application/json";

/// Success message of an upload.
pub const UPLOADED_MESSAGE: &str = "Archivo subido correctamente";
/// Success message of a bulk upload.
pub const BULK_UPLOADED_MESSAGE: &str = "Carga masiva finalizada";
/// Success message of a rename.
pub const RENAMED_MESSAGE: &str = "Archivo renombrado correctamente";
/// Success message of a delete.
pub const DELETED_MESSAGE: &str = "Archivo eliminado correctamente";

/// One entry of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    /// File name (last key segment).
    pub name: String,
    /// Full storage key.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Public URL, if configured.
    pub url: Option<String>,
}

impl From<StoredObject> for ResourceEntry {
    fn from(obj: StoredObject) -> Self {
        Self {
            name: obj.display_name,
            path: obj.key,
            size: obj.size,
            last_modified: obj.last_modified,
            url: obj.public_url,
        }
    }
}

/// The `data` of a mutation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectData {
    /// Full storage key.
    pub name: String,
    /// Public URL, if configured.
    pub url: Option<String>,
}

impl From<WrittenObject> for ObjectData {
    fn from(obj: WrittenObject) -> Self {
        Self {
            name: obj.key,
            url: obj.public_url,
        }
    }
}

/// `{mensaje, data}` body of upload, rename, and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub mensaje: &'static str,
    /// The object written or removed.
    pub data: ObjectData,
}

/// One entry of `resultados`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkEntry {
    /// Local file name.
    pub archivo: String,
    /// The uploaded object, on success.
    pub data: Option<ObjectData>,
    /// Failure description, on failure.
    pub error: Option<String>,
}

impl From<BulkResult> for BulkEntry {
    fn from(result: BulkResult) -> Self {
        Self {
            archivo: result.input_name,
            data: result.resulting_key.map(|name| ObjectData { name, url: None }),
            error: result.error_description,
        }
    }
}

/// Body of a bulk upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkUploadResponse {
    /// Human-readable outcome.
    pub mensaje: &'static str,
    /// Per-file results in processing order.
    pub resultados: Vec<BulkEntry>,
    /// Number of uploaded files.
    pub exitosos: usize,
    /// Number of failed files.
    pub fallidos: usize,
}

impl BulkUploadResponse {
    /// Build the response body from a report, attaching public URLs with `url_for`.
    pub fn from_report(report: BulkReport, url_for: impl Fn(&str) -> Option<String>) -> Self {
        let exitosos = report.succeeded();
        let fallidos = report.failed();
        let resultados = report
            .results
            .into_iter()
            .map(|result| {
                let mut entry = BulkEntry::from(result);
                if let Some(data) = entry.data.as_mut() {
                    data.url = url_for(&data.name);
                }
                entry
            })
            .collect();
        Self {
            mensaje: BULK_UPLOADED_MESSAGE,
            resultados,
            exitosos,
            fallidos,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detalle: Option<&'a str>,
}

/// Build a JSON response with `status`.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] if `value` cannot be serialized.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<http::Response<ResponseBody>, ApiError> {
    let json = serde_json::to_vec(value).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(raw_json_response(status, json))
}

fn raw_json_response(status: StatusCode, json: Vec<u8>) -> http::Response<ResponseBody> {
    let mut response = http::Response::new(ResponseBody::from_json(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE_HEADER, HeaderValue::from_static(CONTENT_TYPE));
    response
}

/// Convert an [`ApiError`] into a complete HTTP error response.
#[must_use]
pub fn error_to_response(err: &ApiError, request_id: &str) -> http::Response<ResponseBody> {
    let body = ErrorBody {
        error: err.message(),
        code: err.code(),
        detalle: err.detail(),
    };
    let json = serde_json::to_vec(&body).unwrap_or_else(|e| {
        error!(error = %e, request_id, "failed to serialize error body");
        br#"{"error":"internal error","code":"InternalError"}"#.to_vec()
    });
    raw_json_response(err.status_code(), json)
}
