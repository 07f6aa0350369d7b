//! S3 operation handlers.
//!
//! One function per backend operation.  The dispatch ladders in
//! [`crate::server`] decide which handler a request reaches; handlers
//! validate operation-level inputs, call the backend, and render the
//! result through the response writer.

pub mod bucket;
pub mod multipart;
pub mod object;
