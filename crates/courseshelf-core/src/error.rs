//! Error types for CourseShelf resource operations.
//!
//! Two layers of errors exist:
//!
//! - [`StoreError`] is what an [`ObjectStore`](crate::store::ObjectStore)
//!   backend reports. It only distinguishes "the key is absent" from "the
//!   store could not be reached or refused the call".
//! - [`ResourceError`] is the taxonomy exposed to callers of
//!   [`ResourceService`](crate::service::ResourceService). Each variant has a
//!   stable [`code`](ResourceError::code) that the HTTP layer forwards so
//!   clients can tell, for example, a failed rename from a partial one.
//!
//! # Usage
//!
//! ```
//! use courseshelf_core::error::{ResourceError, StoreError};
//!
//! let err: ResourceError = StoreError::Unavailable("connection reset".to_owned()).into();
//! assert_eq!(err.code(), "StoreUnavailable");
//! ```

/// Error reported by an object store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested key does not exist.
    #[error("object not found: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// Transport, authentication, or service failure from the store.
    #[error("{0}")]
    Unavailable(String),
}

/// Convenience result type for object store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by resource operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A required request parameter is missing or empty.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// A request parameter is present but malformed.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A file name is unusable as a storage key segment.
    #[error("invalid file name {name:?}: {reason}")]
    InvalidName {
        /// The offending name as supplied.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// A resource path contains a forbidden segment or character.
    #[error("invalid resource path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path as supplied.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// The local folder for a bulk upload does not exist or is not a directory.
    #[error("folder does not exist or is not a directory: {0}")]
    InvalidFolder(String),

    /// The upload carried no file content.
    #[error("no file was sent")]
    EmptyUpload,

    /// A local file selected for upload could not be read.
    #[error("could not read {path}: {detail}")]
    ReadFailed {
        /// The local file path.
        path: String,
        /// I/O error description.
        detail: String,
    },

    /// The source object of a rename does not exist.
    #[error("object not found: {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// The object store could not complete the call.
    #[error("object store unavailable: {0}")]
    StoreUnavailable(String),

    /// The copy step of a rename failed; the source object is untouched.
    #[error("could not copy {source_key} to {destination_key}: {detail}")]
    RenameCopyFailed {
        /// Key of the object being renamed.
        source_key: String,
        /// Key the object was being renamed to.
        destination_key: String,
        /// Store error description.
        detail: String,
    },

    /// The copy step of a rename succeeded but removing the original failed.
    ///
    /// Both keys exist afterwards. This is a partial success: the new object
    /// is complete and the caller only needs to clean up `source_key`.
    #[error("renamed to {destination_key}, but the original {source_key} could not be removed: {detail}")]
    RenamedButOriginalNotRemoved {
        /// Key of the original object, still present.
        source_key: String,
        /// Key of the new object.
        destination_key: String,
        /// Store error description.
        detail: String,
    },
}

impl ResourceError {
    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "MissingParameter",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::InvalidName { .. } => "InvalidName",
            Self::InvalidPath { .. } => "InvalidPath",
            Self::InvalidFolder(_) => "InvalidFolder",
            Self::EmptyUpload => "EmptyUpload",
            Self::ReadFailed { .. } => "ReadFailed",
            Self::NotFound { .. } => "NotFound",
            Self::StoreUnavailable(_) => "StoreUnavailable",
            Self::RenameCopyFailed { .. } => "RenameCopyFailed",
            Self::RenamedButOriginalNotRemoved { .. } => "RenamedButOriginalNotRemoved",
        }
    }

    /// Whether the error was caused by the caller's input rather than the store.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::InvalidParameter { .. }
                | Self::InvalidName { .. }
                | Self::InvalidPath { .. }
                | Self::InvalidFolder(_)
                | Self::EmptyUpload
        )
    }

    /// The verbatim store error description, when the error came from the store.
    #[must_use]
    pub fn store_detail(&self) -> Option<&str> {
        match self {
            Self::StoreUnavailable(detail)
            | Self::RenameCopyFailed { detail, .. }
            | Self::RenamedButOriginalNotRemoved { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for ResourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => Self::NotFound { key },
            StoreError::Unavailable(detail) => Self::StoreUnavailable(detail),
        }
    }
}

/// Convenience result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
