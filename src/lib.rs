//! Portico library — S3-compatible object storage gateway.
//!
//! This crate implements the request-dispatch core of an S3-compatible
//! gateway: it decodes the overloaded, query-string-disambiguated S3
//! URL and header vocabulary into typed operations against a pluggable
//! [`backend::Backend`], validates protocol-level preconditions,
//! marshals the XML request/response bodies, and renders S3 error
//! documents with the correct HTTP status codes.

use std::sync::Arc;

pub mod backend;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod headers;
pub mod metrics;
pub mod response;
pub mod server;
pub mod xml;

use crate::backend::Backend;
use crate::config::Config;

/// Shared application state passed to all handlers via
/// `axum::extract::State`.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// The storage backend behind the dispatch core.
    pub backend: Arc<dyn Backend>,
}

/// The authenticated principal of a request.
///
/// Populated by middleware before dispatch; the bundled middleware
/// fills in the configured gateway owner, which is the seam where an
/// upstream signature verifier plugs in.
#[derive(Debug, Clone)]
pub struct Principal(pub String);
