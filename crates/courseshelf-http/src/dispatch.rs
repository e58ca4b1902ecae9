//! Operation dispatch: runs a routed request against the [`ResourceService`].
//!
//! [`dispatch_operation`] bridges routing and the resource service. For each
//! operation it parses the request (query, JSON, or multipart), calls the
//! service, and serializes the outcome into a JSON response.

use std::path::Path;

use bytes::Bytes;
use courseshelf_core::error::ResourceError;
use courseshelf_core::path::resolve;
use courseshelf_core::service::ResourceService;
use http::StatusCode;

use crate::body::ResponseBody;
use crate::error::ApiError;
use crate::multipart::{FILE_FIELD, extract_boundary, parse_multipart};
use crate::request::{
    BulkUploadRequest, DeleteRequest, RenameRequest, parse_json_body, parse_page,
};
use crate::response::{
    BulkUploadResponse, DELETED_MESSAGE, MessageResponse, ObjectData, RENAMED_MESSAGE,
    ResourceEntry, UPLOADED_MESSAGE, json_response,
};
use crate::router::{ResourceOperation, RoutingContext};

/// Dispatch a routed request to the resource service.
///
/// # Errors
///
/// Returns the [`ApiError`] to be rendered with
/// [`error_to_response`](crate::response::error_to_response).
pub async fn dispatch_operation(
    service: &ResourceService,
    parts: &http::request::Parts,
    body: Bytes,
    ctx: RoutingContext,
) -> Result<http::Response<ResponseBody>, ApiError> {
    tracing::debug!(operation = %ctx.operation, path = %ctx.path, "dispatching operation");
    match ctx.operation {
        ResourceOperation::ListResources => handle_list(service, &ctx).await,
        ResourceOperation::UploadResource => handle_upload(service, parts, body, &ctx).await,
        ResourceOperation::BulkUpload => handle_bulk_upload(service, parts, &body).await,
        ResourceOperation::RenameResource => handle_rename(service, parts, &body).await,
        ResourceOperation::DeleteResource => handle_delete(service, parts, &body).await,
    }
}

async fn handle_list(
    service: &ResourceService,
    ctx: &RoutingContext,
) -> Result<http::Response<ResponseBody>, ApiError> {
    let page = parse_page(ctx)?;
    let path = resolve(&ctx.path)?;
    let entries: Vec<ResourceEntry> = service
        .list(&path, page)
        .await?
        .into_iter()
        .map(ResourceEntry::from)
        .collect();
    json_response(StatusCode::OK, &entries)
}

async fn handle_upload(
    service: &ResourceService,
    parts: &http::request::Parts,
    body: Bytes,
    ctx: &RoutingContext,
) -> Result<http::Response<ResponseBody>, ApiError> {
    let content_type = parts
        .headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    // Without a multipart body there is no file to upload.
    let boundary = extract_boundary(content_type).map_err(|err| match err {
        ApiError::UnsupportedMediaType(_) => ApiError::from(ResourceError::EmptyUpload),
        other => other,
    })?;
    let mut form = parse_multipart(&body, &boundary)?;
    let Some(file) = form.files.remove(FILE_FIELD) else {
        return Err(ResourceError::EmptyUpload.into());
    };

    let path = resolve(&ctx.path)?;
    let written = service
        .upload(
            &path,
            file.data,
            file.filename.as_deref().unwrap_or_default(),
            file.content_type.as_deref(),
        )
        .await?;
    json_response(
        StatusCode::OK,
        &MessageResponse {
            mensaje: UPLOADED_MESSAGE,
            data: ObjectData::from(written),
        },
    )
}

async fn handle_bulk_upload(
    service: &ResourceService,
    parts: &http::request::Parts,
    body: &[u8],
) -> Result<http::Response<ResponseBody>, ApiError> {
    let request: BulkUploadRequest = parse_json_body(&parts.headers, body)?;
    let course = request.curso.unwrap_or_default();
    let folder = request.carpeta.unwrap_or_default();

    let report = service
        .bulk_upload_from_folder(&course, Path::new(&folder))
        .await?;
    json_response(
        StatusCode::OK,
        &BulkUploadResponse::from_report(report, |key| service.public_url(key)),
    )
}

async fn handle_rename(
    service: &ResourceService,
    parts: &http::request::Parts,
    body: &[u8],
) -> Result<http::Response<ResponseBody>, ApiError> {
    let request: RenameRequest = parse_json_body(&parts.headers, body)?;
    let written = service
        .rename(
            request.curso.as_deref().unwrap_or_default(),
            request.nombre_actual.as_deref().unwrap_or_default(),
            request.nombre_nuevo.as_deref().unwrap_or_default(),
        )
        .await?;
    json_response(
        StatusCode::OK,
        &MessageResponse {
            mensaje: RENAMED_MESSAGE,
            data: ObjectData::from(written),
        },
    )
}

async fn handle_delete(
    service: &ResourceService,
    parts: &http::request::Parts,
    body: &[u8],
) -> Result<http::Response<ResponseBody>, ApiError> {
    let request: DeleteRequest = parse_json_body(&parts.headers, body)?;
    let key = service
        .delete(
            request.curso.as_deref().unwrap_or_default(),
            request.nombre_archivo.as_deref().unwrap_or_default(),
        )
        .await?;
    json_response(
        StatusCode::OK,
        &MessageResponse {
            mensaje: DELETED_MESSAGE,
            data: ObjectData {
                name: key,
                url: None,
            },
        },
    )
}
