//! Request routing: maps method and path to a resource operation.
//!
//! Routes live under two equivalent prefixes, `/resources` and the Spanish
//! `/recursos`. Each prefix has three fixed routes (bulk upload, rename,
//! delete) and a catch-all `{path}` route for listing (GET) and uploading
//! (POST). A fixed route wins over the catch-all for its own method, so
//! `POST /resources/bulk-upload` is a bulk upload, while
//! `GET /resources/bulk-upload` lists a folder called `bulk-upload`.

use std::fmt;

use http::Method;
use percent_encoding::percent_decode_str;

use crate::error::ApiError;

/// The operation a request was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceOperation {
    /// `GET {prefix}/{path}`.
    ListResources,
    /// `POST {prefix}/{path}` with a multipart body.
    UploadResource,
    /// `POST {prefix}/bulk-upload` with a JSON body.
    BulkUpload,
    /// `PATCH {prefix}/rename` with a JSON body.
    RenameResource,
    /// `DELETE {prefix}/delete` with a JSON body.
    DeleteResource,
}

impl ResourceOperation {
    /// Operation name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListResources => "ListResources",
            Self::UploadResource => "UploadResource",
            Self::BulkUpload => "BulkUpload",
            Self::RenameResource => "RenameResource",
            Self::DeleteResource => "DeleteResource",
        }
    }
}

impl fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A route prefix and the names of its fixed routes.
#[derive(Debug, Clone, Copy)]
struct RouteSet {
    prefix: &'static str,
    bulk_upload: &'static str,
    rename: &'static str,
    delete: &'static str,
}

const ROUTE_SETS: &[RouteSet] = &[
    RouteSet {
        prefix: "/resources",
        bulk_upload: "bulk-upload",
        rename: "rename",
        delete: "delete",
    },
    RouteSet {
        prefix: "/recursos",
        bulk_upload: "subir-carpeta",
        rename: "renombrar",
        delete: "eliminar",
    },
];

/// The result of routing an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingContext {
    /// The identified operation.
    pub operation: ResourceOperation,
    /// Percent-decoded `{path}` for list and upload; empty for fixed routes.
    pub path: String,
    /// Parsed query parameters from the request URI.
    pub query_params: Vec<(String, String)>,
}

impl RoutingContext {
    /// Value of the first query parameter called `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Maps requests to [`ResourceOperation`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceRouter;

impl ResourceRouter {
    /// Create a router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve a request to a routing context.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoSuchRoute`] for paths outside the route
    /// prefixes and [`ApiError::MethodNotAllowed`] for methods a matched
    /// route does not accept.
    pub fn resolve<B>(&self, req: &http::Request<B>) -> Result<RoutingContext, ApiError> {
        self.route(req.method(), req.uri().path(), req.uri().query())
    }

    /// Route a method, raw path, and raw query string.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn route(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
    ) -> Result<RoutingContext, ApiError> {
        let (set, rest) = ROUTE_SETS
            .iter()
            .find_map(|set| match_prefix(path, set.prefix).map(|rest| (set, rest)))
            .ok_or_else(|| ApiError::NoSuchRoute {
                method: method.to_string(),
                path: path.to_owned(),
            })?;

        let fixed = if rest == set.bulk_upload {
            Some((Method::POST, ResourceOperation::BulkUpload))
        } else if rest == set.rename {
            Some((Method::PATCH, ResourceOperation::RenameResource))
        } else if rest == set.delete {
            Some((Method::DELETE, ResourceOperation::DeleteResource))
        } else {
            None
        };

        let (operation, resource_path) = match fixed {
            Some((fixed_method, operation)) if *method == fixed_method => {
                (operation, String::new())
            }
            _ if *method == Method::GET => (ResourceOperation::ListResources, decode(rest)),
            _ if *method == Method::POST => (ResourceOperation::UploadResource, decode(rest)),
            _ => {
                return Err(ApiError::MethodNotAllowed {
                    method: method.to_string(),
                    path: path.to_owned(),
                });
            }
        };

        Ok(RoutingContext {
            operation,
            path: resource_path,
            query_params: parse_query_params(query.unwrap_or("")),
        })
    }
}

/// Strip `prefix` from `path`, returning the remainder without its leading
/// slash. `/resourcesX` does not match `/resources`.
fn match_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Decode a percent-encoded URI component.
fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into key-value pairs.
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_query(key), decode_query(value)),
            None => (decode_query(pair), String::new()),
        })
        .collect()
}

fn decode_query(s: &str) -> String {
    decode(&s.replace('+', " "))
}
