//! Response writer.
//!
//! Handlers produce success responses through exactly two constructors:
//! [`send_empty`] for bodyless 200s and [`send_xml`] for marshalled
//! documents.  Error responses come from `S3Error`'s `IntoResponse`
//! implementation.  Nothing else in the crate writes a status code.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::backend::ByteStream;

/// Status 200 with an empty body.
pub fn send_empty() -> Response {
    StatusCode::OK.into_response()
}

/// Status 200 with a streamed object body.
///
/// The caller applies the standard object headers afterwards; the
/// payload itself flows through untouched.
pub fn send_stream(body: ByteStream) -> Response {
    Response::new(Body::from_stream(body))
}

/// Status 200 with a marshalled XML body.
///
/// `Content-Type: application/xml` is set only when the body is
/// non-empty, so operations whose result marshals to nothing stay
/// indistinguishable from [`send_empty`].
pub fn send_xml(body: String) -> Response {
    if body.is_empty() {
        return send_empty();
    }

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        )],
        body,
    )
        .into_response()
}
