//! `multipart/form-data` parser for single-file uploads.
//!
//! Parses an already-collected body into text fields and file parts. The
//! upload route reads the file from the [`FILE_FIELD`] part.

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::ApiError;

/// Form field that carries the uploaded file.
pub const FILE_FIELD: &str = "archivo";

/// One file part of a form.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Client-side file name from `Content-Disposition`, if sent.
    pub filename: Option<String>,
    /// The part's `Content-Type`, if sent.
    pub content_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

/// A parsed multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    /// Text fields (name to value).
    pub fields: HashMap<String, String>,
    /// File parts (field name to file).
    pub files: HashMap<String, FilePart>,
}

impl MultipartForm {
    /// The file sent in field `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.get(name)
    }
}

/// Extract the boundary from a `multipart/form-data; boundary=...` content type.
///
/// # Errors
///
/// Returns [`ApiError::UnsupportedMediaType`] if the content type is not
/// `multipart/form-data`, and [`ApiError::MalformedBody`] if the boundary
/// parameter is missing or empty.
pub fn extract_boundary(content_type: &str) -> Result<String, ApiError> {
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return Err(ApiError::UnsupportedMediaType(content_type.to_owned()));
    }

    for part in content_type.split(';') {
        let Some((name, value)) = part.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("boundary") {
            let boundary = value.trim().trim_matches('"');
            if boundary.is_empty() {
                return Err(ApiError::MalformedBody(
                    "empty boundary in Content-Type".to_owned(),
                ));
            }
            return Ok(boundary.to_owned());
        }
    }

    Err(ApiError::MalformedBody(
        "missing boundary in Content-Type".to_owned(),
    ))
}

/// Parse a multipart body.
///
/// A part is a file part when its `Content-Disposition` carries a
/// `filename` parameter. The last part wins when a field name repeats.
///
/// # Errors
///
/// Returns [`ApiError::MalformedBody`] if the body contains no boundary
/// delimiter at all.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<MultipartForm, ApiError> {
    let delimiter = format!("--{boundary}");
    let end_delimiter = format!("--{boundary}--");

    if find_bytes(body, delimiter.as_bytes()).is_none() {
        return Err(ApiError::MalformedBody(
            "multipart body contains no boundary".to_owned(),
        ));
    }

    let mut form = MultipartForm::default();
    for part_bytes in split_parts(body, delimiter.as_bytes(), end_delimiter.as_bytes()) {
        let Some((headers_section, part_body)) = split_headers_body(part_bytes) else {
            continue;
        };
        let headers = String::from_utf8_lossy(headers_section);
        let disposition = parse_content_disposition(&headers);
        let Some(field_name) = disposition.name else {
            continue;
        };

        if disposition.filename.is_some() {
            form.files.insert(
                field_name,
                FilePart {
                    filename: disposition.filename,
                    content_type: parse_part_content_type(&headers),
                    data: Bytes::copy_from_slice(part_body),
                },
            );
        } else {
            let value = String::from_utf8_lossy(part_body).into_owned();
            form.fields.insert(field_name, value);
        }
    }

    Ok(form)
}

/// Split the body into parts by boundary.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8], end_delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let Some(first) = find_bytes(body, delimiter) else {
        return parts;
    };
    let mut remaining = skip_crlf(&body[first + delimiter.len()..]);

    loop {
        if remaining.starts_with(b"--")
            || remaining.starts_with(end_delimiter)
            || remaining
                .strip_prefix(b"\r\n")
                .is_some_and(|r| r.starts_with(end_delimiter))
        {
            break;
        }

        if let Some(pos) = find_bytes(remaining, delimiter) {
            parts.push(strip_trailing_crlf(&remaining[..pos]));
            remaining = skip_crlf(&remaining[pos + delimiter.len()..]);
        } else {
            let part = strip_trailing_crlf(remaining);
            if !part.is_empty() {
                parts.push(part);
            }
            break;
        }
    }

    parts
}

/// Split a part into headers and body at the first blank line.
fn split_headers_body(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let separator = b"\r\n\r\n";
    find_bytes(part, separator).map(|pos| (&part[..pos], &part[pos + separator.len()..]))
}

struct ContentDisposition {
    name: Option<String>,
    filename: Option<String>,
}

fn parse_content_disposition(headers: &str) -> ContentDisposition {
    let mut disposition = ContentDisposition {
        name: None,
        filename: None,
    };

    for line in headers.split("\r\n") {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        if !header.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        for (param, param_value) in header_params(value) {
            if param.eq_ignore_ascii_case("name") {
                disposition.name = Some(param_value);
            } else if param.eq_ignore_ascii_case("filename") {
                disposition.filename = Some(param_value);
            }
        }
    }

    disposition
}

/// Split `form-data; name="a"; filename="b; c.pdf"` into `(param, value)`
/// pairs, honoring quotes so separators inside quoted values are kept.
///
/// Inside quotes only `\"` is an escape; browsers send other backslashes
/// (Windows paths, literal names) as-is.
fn header_params(value: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '\\' if in_quotes && chars.peek() == Some(&'"') => {
                if let Some(quote) = chars.next() {
                    current.push(quote);
                }
            }
            ';' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
        .iter()
        .filter_map(|segment| {
            let (name, raw) = segment.split_once('=')?;
            let raw = raw.trim();
            let unquoted = raw
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
                .unwrap_or(raw);
            Some((name.trim().to_owned(), unquoted.to_owned()))
        })
        .collect()
}

fn parse_part_content_type(headers: &str) -> Option<String> {
    headers.split("\r\n").find_map(|line| {
        let (header, value) = line.split_once(':')?;
        header
            .trim()
            .eq_ignore_ascii_case("content-type")
            .then(|| value.trim().to_owned())
    })
}

/// Find the position of a needle in a haystack.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn skip_crlf(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n").unwrap_or(data)
}

fn strip_trailing_crlf(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n").unwrap_or(data)
}
