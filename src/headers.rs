//! Header codec for the S3 surface.
//!
//! Handles the `x-amz-meta-*` user-metadata namespace in both
//! directions, the fixed set of standard object response headers, and
//! the `X-Amz-Copy-Source*` header family.

use std::collections::HashMap;

use axum::http::header::HeaderName;
use axum::http::{HeaderMap, HeaderValue};

use crate::backend::types::{CopyConditions, GrantSet, ObjectInfo};
use crate::errors::S3Error;

/// Prefix of the user-metadata header namespace.
pub const USER_METADATA_PREFIX: &str = "x-amz-meta-";

/// Collect user metadata from request headers.
///
/// Every header whose name starts (case-insensitively) with
/// `x-amz-meta-` contributes an entry keyed by the lowercased suffix.
/// The value is preserved verbatim.
pub fn user_metadata_from_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut meta = HashMap::new();
    for (name, value) in headers.iter() {
        // HeaderName is already lowercase.
        if let Some(suffix) = name.as_str().strip_prefix(USER_METADATA_PREFIX) {
            if let Ok(val) = value.to_str() {
                meta.insert(suffix.to_string(), val.to_string());
            }
        }
    }
    meta
}

/// Emit user metadata onto a response header map as
/// `x-amz-meta-{suffix}: {value}` pairs.
pub fn apply_user_metadata(headers: &mut HeaderMap, metadata: &HashMap<String, String>) {
    for (suffix, value) in metadata {
        let name = format!("{USER_METADATA_PREFIX}{suffix}");
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
}

/// Emit the standard object response headers in fixed order:
/// Content-Length (always, `0` included), Content-Type,
/// Content-Encoding, ETag, Last-Modified.
///
/// Absent optional fields are written as empty values so that header
/// presence is stable across backends.  Last-Modified is RFC 1123 in
/// GMT (`Mon, 02 Jan 2006 15:04:05 GMT`) or empty when the backend did
/// not provide a timestamp.
pub fn apply_object_headers(headers: &mut HeaderMap, info: &ObjectInfo) {
    let last_modified = info
        .last_modified
        .map(httpdate::fmt_http_date)
        .unwrap_or_default();

    let pairs = [
        ("content-length", info.content_length.to_string()),
        ("content-type", info.content_type.clone().unwrap_or_default()),
        (
            "content-encoding",
            info.content_encoding.clone().unwrap_or_default(),
        ),
        ("etag", info.etag.clone().unwrap_or_default()),
        ("last-modified", last_modified),
    ];

    for (name, value) in pairs {
        let value =
            HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""));
        headers.insert(HeaderName::from_static(name), value);
    }

    apply_user_metadata(headers, &info.metadata);
}

/// Split an `X-Amz-Copy-Source` value into (source bucket, source key).
///
/// The value is percent-decoded, an optional leading `/` is stripped,
/// and the remainder splits on the first `/`.  A value without a key
/// portion is a protocol error.
pub fn parse_copy_source(value: &str) -> Result<(String, String), S3Error> {
    let decoded = percent_encoding::percent_decode_str(value).decode_utf8_lossy();
    let path = decoded.strip_prefix('/').unwrap_or(&decoded);

    match path.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            Ok((bucket.to_string(), key.to_string()))
        }
        _ => Err(S3Error::InvalidRequest),
    }
}

/// Collect the five `x-amz-grant-*` headers of an ACL request.
pub fn grant_set_from_headers(headers: &HeaderMap) -> GrantSet {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };

    GrantSet {
        full_control: get("x-amz-grant-full-control"),
        read: get("x-amz-grant-read"),
        read_acp: get("x-amz-grant-read-acp"),
        write: get("x-amz-grant-write"),
        write_acp: get("x-amz-grant-write-acp"),
    }
}

/// Read the conditional-copy headers so they can be forwarded to the
/// backend, which owns precondition evaluation.
pub fn copy_conditions_from_headers(headers: &HeaderMap) -> CopyConditions {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };

    CopyConditions {
        if_match: get("x-amz-copy-source-if-match"),
        if_none_match: get("x-amz-copy-source-if-none-match"),
        if_modified_since: get("x-amz-copy-source-if-modified-since"),
        if_unmodified_since: get("x-amz-copy-source-if-unmodified-since"),
    }
}
