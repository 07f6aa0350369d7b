//! S3-compatible error catalog.
//!
//! Every variant maps to a well-known S3 error code with a fixed HTTP
//! status and default message.  The enum implements
//! [`axum::response::IntoResponse`] so dispatch code can simply return
//! `Err(S3Error::NoSuchBucket { .. })` and the correct error document
//! is rendered.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::xml::render_error;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// S3 error codes expressed as a Rust enum.
///
/// Backends surface domain failures as catalog variants; anything else
/// converts into [`S3Error::InternalError`] via `?` and renders as a 500.
#[derive(Debug, Error)]
pub enum S3Error {
    /// Catch-all protocol error for malformed or contradictory requests.
    #[error("Invalid Request")]
    InvalidRequest,

    /// The `max-parts` query argument did not parse as a positive integer.
    #[error("Argument max-parts must be an integer between 1 and 10000")]
    InvalidMaxParts,

    /// The `part-number-marker` query argument did not parse as a positive integer.
    #[error("Argument part-number-marker must be an integer")]
    InvalidPartNumberMarker,

    /// A multipart part number or entity tag was not valid.
    #[error("One or more of the specified parts could not be found. The part may not have been uploaded, or the specified entity tag may not match the part's entity tag.")]
    InvalidPart,

    /// Malformed XML in a request body.
    #[error("The XML you provided was not well-formed or did not validate against our published schema.")]
    MalformedXml,

    /// A request argument is invalid.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist")]
    NoSuchBucket { bucket: String },

    /// The specified key does not exist.
    #[error("The specified key does not exist.")]
    NoSuchKey { key: String },

    /// The specified multipart upload does not exist.
    #[error("The specified upload does not exist. The upload ID may be invalid, or the upload may have been aborted or completed.")]
    NoSuchUpload { upload_id: String },

    /// A bucket with the requested name already exists.
    #[error("The requested bucket name is not available. The bucket namespace is shared by all users of the system. Please select a different name and try again.")]
    BucketAlreadyExists { bucket: String },

    /// The bucket you tried to delete is not empty.
    #[error("The bucket you tried to delete is not empty")]
    BucketNotEmpty { bucket: String },

    /// Access denied.
    #[error("Access Denied")]
    AccessDenied { message: String },

    /// A forwarded precondition (e.g. a conditional copy) did not hold.
    #[error("At least one of the pre-conditions you specified did not hold")]
    PreconditionFailed,

    /// The backend does not implement the requested capability.
    #[error("A header or query you provided implies functionality that is not implemented")]
    NotImplemented,

    /// Catch-all for unexpected internal errors.
    #[error("We encountered an internal error, please try again.")]
    InternalError(#[from] anyhow::Error),
}

impl S3Error {
    /// Return the S3 XML error code string.
    pub fn code(&self) -> &'static str {
        match self {
            S3Error::InvalidRequest => "InvalidRequest",
            S3Error::InvalidMaxParts => "InvalidMaxParts",
            S3Error::InvalidPartNumberMarker => "InvalidPartNumberMarker",
            S3Error::InvalidPart => "InvalidPart",
            S3Error::MalformedXml => "MalformedXML",
            S3Error::InvalidArgument { .. } => "InvalidArgument",
            S3Error::NoSuchBucket { .. } => "NoSuchBucket",
            S3Error::NoSuchKey { .. } => "NoSuchKey",
            S3Error::NoSuchUpload { .. } => "NoSuchUpload",
            S3Error::BucketAlreadyExists { .. } => "BucketAlreadyExists",
            S3Error::BucketNotEmpty { .. } => "BucketNotEmpty",
            S3Error::AccessDenied { .. } => "AccessDenied",
            S3Error::PreconditionFailed => "PreconditionFailed",
            S3Error::NotImplemented => "NotImplemented",
            S3Error::InternalError(_) => "InternalError",
        }
    }

    /// Return the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            S3Error::InvalidRequest => StatusCode::BAD_REQUEST,
            S3Error::InvalidMaxParts => StatusCode::BAD_REQUEST,
            S3Error::InvalidPartNumberMarker => StatusCode::BAD_REQUEST,
            S3Error::InvalidPart => StatusCode::BAD_REQUEST,
            S3Error::MalformedXml => StatusCode::BAD_REQUEST,
            S3Error::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            S3Error::NoSuchBucket { .. } => StatusCode::NOT_FOUND,
            S3Error::NoSuchKey { .. } => StatusCode::NOT_FOUND,
            S3Error::NoSuchUpload { .. } => StatusCode::NOT_FOUND,
            S3Error::BucketAlreadyExists { .. } => StatusCode::CONFLICT,
            S3Error::BucketNotEmpty { .. } => StatusCode::CONFLICT,
            S3Error::AccessDenied { .. } => StatusCode::FORBIDDEN,
            S3Error::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            S3Error::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            S3Error::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for S3Error {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let status = self.status_code();
        let date = httpdate::fmt_http_date(std::time::SystemTime::now());

        // Non-catalog failures carry no client-safe detail; log them with
        // the request id before collapsing into the InternalError document.
        if let S3Error::InternalError(ref err) = self {
            tracing::error!(%request_id, error = %err, "internal error");
        }

        let body = render_error(self.code(), &self.to_string(), "", &request_id);

        (
            status,
            [
                ("content-type", "application/xml".to_string()),
                ("x-amz-request-id", request_id),
                ("date", date),
                ("server", "Portico".to_string()),
            ],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_shape() {
        let id = generate_request_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn test_catalog_status_codes() {
        assert_eq!(
            S3Error::InvalidRequest.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            S3Error::InvalidMaxParts.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            S3Error::InvalidPartNumberMarker.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(S3Error::InvalidPart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            S3Error::NoSuchBucket {
                bucket: "b".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            S3Error::NoSuchKey {
                key: "k".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            S3Error::BucketAlreadyExists {
                bucket: "b".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            S3Error::AccessDenied {
                message: String::new()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            S3Error::InternalError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_code_strings() {
        assert_eq!(S3Error::MalformedXml.code(), "MalformedXML");
        assert_eq!(S3Error::InvalidRequest.code(), "InvalidRequest");
        assert_eq!(
            S3Error::InternalError(anyhow::anyhow!("boom")).code(),
            "InternalError"
        );
    }

    #[test]
    fn test_anyhow_conversion() {
        fn fails() -> Result<(), S3Error> {
            let io: Result<(), std::io::Error> =
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
            io.map_err(anyhow::Error::from)?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, S3Error::InternalError(_)));
    }
}
