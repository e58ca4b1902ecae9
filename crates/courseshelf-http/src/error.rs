//! HTTP-level errors and their status codes.
//!
//! [`ApiError`] wraps [`ResourceError`] and adds the failures that only
//! exist at the HTTP boundary: unparseable bodies, unknown routes, and
//! unsupported methods. Every variant maps to a status code, a stable
//! `code`, and the user-facing `error` message sent to clients.

use courseshelf_core::error::ResourceError;
use http::StatusCode;

/// Error produced while handling an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The resource operation failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The request body could not be parsed.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// The request body has a content type the route does not accept.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The request body exceeds the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// No route matches the request path.
    #[error("no route for {method} {path}")]
    NoSuchRoute {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// The route exists but does not accept the request method.
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Unexpected failure inside the HTTP layer.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code of the error response.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Resource(err) => match err {
                ResourceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ResourceError::StoreUnavailable(_)
                | ResourceError::ReadFailed { .. }
                | ResourceError::RenameCopyFailed { .. }
                | ResourceError::RenamedButOriginalNotRemoved { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ResourceError::MissingParameter(_)
                | ResourceError::InvalidParameter { .. }
                | ResourceError::InvalidName { .. }
                | ResourceError::InvalidPath { .. }
                | ResourceError::InvalidFolder(_)
                | ResourceError::EmptyUpload => StatusCode::BAD_REQUEST,
            },
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NoSuchRoute { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error name.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Resource(err) => err.code(),
            Self::MalformedBody(_) => "MalformedBody",
            Self::UnsupportedMediaType(_) => "UnsupportedMediaType",
            Self::PayloadTooLarge { .. } => "PayloadTooLarge",
            Self::NoSuchRoute { .. } => "NoSuchRoute",
            Self::MethodNotAllowed { .. } => "MethodNotAllowed",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Message shown to the user in the `error` field.
    ///
    /// Store failures get a fixed message; their raw description goes to
    /// [`detail`](Self::detail).
    #[must_use]
    pub fn message(&self) -> String {
        let Self::Resource(err) = self else {
            return self.to_string();
        };
        match err {
            ResourceError::MissingParameter(name) => {
                format!("Faltan parámetros: {name} es requerido")
            }
            ResourceError::EmptyUpload => "No se envió archivo".to_owned(),
            ResourceError::InvalidFolder(_) => {
                "La carpeta especificada no existe o no es un directorio".to_owned()
            }
            ResourceError::NotFound { key } => format!("El archivo {key} no existe"),
            ResourceError::StoreUnavailable(_) => {
                "No se pudo completar la operación en el almacenamiento".to_owned()
            }
            ResourceError::RenameCopyFailed { .. } => {
                "No se pudo subir el archivo con el nuevo nombre".to_owned()
            }
            ResourceError::RenamedButOriginalNotRemoved { .. } => {
                "Archivo renombrado, pero no se pudo eliminar el original".to_owned()
            }
            other => other.to_string(),
        }
    }

    /// Verbatim store error description, when the failure came from the store.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Resource(err) => err.store_detail(),
            _ => None,
        }
    }
}
