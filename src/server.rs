//! Axum router and the S3 dispatch ladders.
//!
//! S3 overloads its URL space: the same `{METHOD} /{bucket}/{key}`
//! shape means different operations depending on query parameters and
//! headers.  Each route below therefore maps to one handler per
//! (method, path shape), and each handler runs a strict priority
//! ladder; the first matching rule wins and no further rules apply.
//!
//! Ladder inputs are the reconstructed key, the query-argument map, and
//! the header map.  Query-parameter *presence* is distinct from value:
//! `?acl` with an empty value still selects the ACL branch.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, head, post, put},
    Extension, Router,
};
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::backend::types::{
    AbortMultipartUploadRequest, AclSource, CopyObjectRequest, GetObjectRequest,
    ListObjectsRequest, Owner, PutBucketAclRequest, PutObjectAclRequest, PutObjectRequest,
};
use crate::backend::ByteStream;
use crate::errors::{generate_request_id, S3Error};
use crate::headers::{
    copy_conditions_from_headers, grant_set_from_headers, parse_copy_source,
    user_metadata_from_headers,
};
use crate::metrics::{metrics_handler, metrics_middleware, record_operation};
use crate::{handlers, AppState, Principal};

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the Portico S3-compatible API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portico S3-Compatible API",
        version = "0.1.0",
        description = "S3-compatible object storage gateway"
    ),
    paths(
        health_check,
        crate::handlers::bucket::list_buckets,
        crate::handlers::bucket::head_bucket,
        crate::handlers::bucket::put_bucket,
        crate::handlers::bucket::delete_bucket,
        crate::handlers::bucket::put_bucket_acl,
        crate::handlers::bucket::get_bucket_acl,
        crate::handlers::bucket::list_objects,
        crate::handlers::bucket::list_objects_v2,
        crate::handlers::bucket::list_multipart_uploads,
        crate::handlers::bucket::delete_objects,
        crate::handlers::object::get_object,
        crate::handlers::object::head_object,
        crate::handlers::object::put_object,
        crate::handlers::object::copy_object,
        crate::handlers::object::delete_object,
        crate::handlers::object::get_object_acl,
        crate::handlers::object::put_object_acl,
        crate::handlers::object::get_object_attributes,
        crate::handlers::object::restore_object,
        crate::handlers::multipart::create_multipart_upload,
        crate::handlers::multipart::put_object_part,
        crate::handlers::multipart::list_object_parts,
        crate::handlers::multipart::complete_multipart_upload,
        crate::handlers::multipart::abort_multipart_upload,
    ),
    tags(
        (name = "Bucket", description = "S3 bucket operations"),
        (name = "Object", description = "S3 object operations"),
        (name = "Multipart", description = "S3 multipart upload operations"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all S3-compatible routes.
pub fn app(state: Arc<AppState>) -> Router {
    let openapi = ApiDoc::openapi();

    Router::new()
        // Infrastructure endpoints (not part of the S3 API).
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        // Service-level: GET / -> ListBuckets
        .route("/", get(handle_get_service))
        // Bucket-level routes
        .route("/:bucket", get(handle_get_bucket))
        .route("/:bucket", put(handle_put_bucket))
        .route("/:bucket", delete(handle_delete_bucket))
        .route("/:bucket", head(handle_head_bucket))
        // Object-level routes (wildcard key captures embedded slashes)
        .route("/:bucket/*key", get(handle_get_object))
        .route("/:bucket/*key", put(handle_put_object))
        .route("/:bucket/*key", delete(handle_delete_object))
        .route("/:bucket/*key", head(handle_head_object))
        .route("/:bucket/*key", post(handle_post_object))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi))
        .with_state(state.clone())
        // Inner layers run first: the principal must exist before any
        // dispatch ladder consumes it.
        .layer(middleware::from_fn_with_state(state, principal_middleware))
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        // S3 objects can be large; drop the default body cap.
        .layer(DefaultBodyLimit::disable())
}

// -- Middleware ---------------------------------------------------------------

/// Inject the authenticated principal.
///
/// Signature verification is upstream middleware's job; this gateway
/// build trusts its configured owner.  A verifier replaces this layer
/// and inserts the principal it authenticated.
async fn principal_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    req.extensions_mut()
        .insert(Principal(state.config.gateway.owner.clone()));
    next.run(req).await
}

/// Add the common S3 response headers to every response:
/// `x-amz-request-id`, `Date` (RFC 7231), and `Server`.
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    if !headers.contains_key("x-amz-request-id") {
        let request_id = generate_request_id();
        headers.insert(
            "x-amz-request-id",
            HeaderValue::from_str(&request_id).unwrap(),
        );
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    headers.insert("date", HeaderValue::from_str(&date).unwrap());
    headers.insert("server", HeaderValue::from_static("Portico"));

    response
}

// -- Health check -------------------------------------------------------------

/// `GET /health` -- Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Bucket",
    operation_id = "HealthCheck",
    responses((status = 200, description = "Health check OK"))
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

// -- Request decoding helpers -------------------------------------------------

/// Parse a raw query string into a map.  Parameters without a value
/// (e.g. `?acl`, `?uploads`) map to an empty string, so presence and
/// value stay distinguishable.
fn parse_query(raw: Option<String>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(qs) = raw {
        for part in qs.split('&') {
            if part.is_empty() {
                continue;
            }
            let (k, v) = part.split_once('=').unwrap_or((part, ""));
            let decode = |s: &str| {
                percent_encoding::percent_decode_str(s)
                    .decode_utf8_lossy()
                    .into_owned()
            };
            map.insert(decode(k), decode(v));
        }
    }
    map
}

/// A query argument counts as supplied only when it has a non-empty
/// value (`uploadId`, `partNumber`).
fn query_value<'a>(query: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    query.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

/// Validate an optional positive integer query argument.  Absent (or
/// empty) means 0 and is legal; a supplied value must parse as a
/// positive integer.
fn positive_query_arg(query: &HashMap<String, String>, name: &str) -> Option<u32> {
    match query_value(query, name) {
        None => Some(0),
        Some(raw) => raw.parse::<u32>().ok().filter(|v| *v > 0),
    }
}

fn int_query_arg(query: &HashMap<String, String>, name: &str) -> i32 {
    query_value(query, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Preserve a trailing `/` from the raw path on the reconstructed key,
/// so zero-byte directory markers keep their identity.
fn object_key(uri: &Uri, key: String) -> String {
    if uri.path().ends_with('/') && !key.ends_with('/') {
        key + "/"
    } else {
        key
    }
}

/// Adapt the request body into the backend's streaming type.
fn body_stream(body: axum::body::Body) -> ByteStream {
    body.into_data_stream()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))
        .boxed()
}

/// Parse the `Content-Length` header; absent means 0, garbage is a
/// protocol error.
fn content_length(headers: &HeaderMap) -> Result<i64, S3Error> {
    match header_value(headers, "content-length") {
        None => Ok(0),
        Some(raw) => raw.parse::<i64>().map_err(|_| S3Error::InvalidRequest),
    }
}

/// Decode the mutually exclusive ACL forms from headers.
///
/// Returns `None` when neither form is present.  A request carrying
/// both a canned ACL and any grant header is contradictory and fails
/// before any backend call.
fn acl_source_from_headers(headers: &HeaderMap) -> Result<Option<AclSource>, S3Error> {
    let canned = header_value(headers, "x-amz-acl").unwrap_or_default();
    let grants = grant_set_from_headers(headers);

    match (canned.is_empty(), grants.is_present()) {
        (true, false) => Ok(None),
        (false, false) => Ok(Some(AclSource::Canned(canned))),
        (true, true) => Ok(Some(AclSource::Grants(grants))),
        (false, true) => Err(S3Error::InvalidRequest),
    }
}

// -- Service-level dispatch ---------------------------------------------------

/// `GET /` -- ListBuckets.
async fn handle_get_service(State(state): State<Arc<AppState>>) -> Result<Response, S3Error> {
    record_operation("ListBuckets");
    handlers::bucket::list_buckets(state).await
}

// -- Bucket-level dispatch ----------------------------------------------------

/// `GET /:bucket` priority ladder:
/// 1. `?acl`          -> GetBucketAcl
/// 2. `?uploads`      -> ListMultipartUploads
/// 3. `?list-type=2`  -> ListObjectsV2
/// 4. default         -> ListObjects (v1)
async fn handle_get_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, S3Error> {
    let query = parse_query(raw_query);

    if query.contains_key("acl") {
        record_operation("GetBucketAcl");
        return handlers::bucket::get_bucket_acl(state, &bucket).await;
    }

    if query.contains_key("uploads") {
        record_operation("ListMultipartUploads");
        return handlers::bucket::list_multipart_uploads(state, &bucket).await;
    }

    let prefix = query.get("prefix").cloned().unwrap_or_default();
    let delimiter = query.get("delimiter").cloned().unwrap_or_default();
    let max_keys = int_query_arg(&query, "max-keys");

    if query.get("list-type").is_some_and(|v| v == "2") {
        record_operation("ListObjectsV2");
        let request = ListObjectsRequest {
            bucket,
            prefix,
            marker: query.get("continuation-token").cloned().unwrap_or_default(),
            delimiter,
            max_keys,
        };
        return handlers::bucket::list_objects_v2(state, request).await;
    }

    // v1 pagination: `marker`, with `continuation-token` tolerated as an
    // alias for clients of older builds of this gateway.
    let marker = query
        .get("marker")
        .or_else(|| query.get("continuation-token"))
        .cloned()
        .unwrap_or_default();

    record_operation("ListObjects");
    let request = ListObjectsRequest {
        bucket,
        prefix,
        marker,
        delimiter,
        max_keys,
    };
    handlers::bucket::list_objects(state, request).await
}

/// `PUT /:bucket` priority ladder:
/// 1. canned ACL or grant headers -> PutBucketAcl (both at once is a
///    protocol error; owner = authenticated principal)
/// 2. default                     -> PutBucket
async fn handle_put_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
) -> Result<Response, S3Error> {
    if let Some(source) = acl_source_from_headers(&headers)? {
        record_operation("PutBucketAcl");
        let request = PutBucketAclRequest {
            bucket,
            owner: Owner::new(&principal.0),
            source,
        };
        return handlers::bucket::put_bucket_acl(state, request).await;
    }

    record_operation("PutBucket");
    handlers::bucket::put_bucket(state, &bucket, &principal).await
}

/// `DELETE /:bucket` priority ladder:
/// 1. `?delete` -> DeleteObjects (XML `<Delete>` body)
/// 2. default   -> DeleteBucket
async fn handle_delete_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> Result<Response, S3Error> {
    let query = parse_query(raw_query);

    if query.contains_key("delete") {
        record_operation("DeleteObjects");
        let request = crate::xml::parse_delete_document(&body)?;
        return handlers::bucket::delete_objects(state, &bucket, request).await;
    }

    record_operation("DeleteBucket");
    handlers::bucket::delete_bucket(state, &bucket).await
}

/// `HEAD /:bucket` -- HeadBucket.
async fn handle_head_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Response, S3Error> {
    record_operation("HeadBucket");
    handlers::bucket::head_bucket(state, &bucket).await
}

// -- Object-level dispatch ----------------------------------------------------

/// `GET /:bucket/*key` priority ladder:
/// 1. `?uploadId=...`                 -> ListParts (validating
///    `max-parts` / `part-number-marker`)
/// 2. `?acl`                          -> GetObjectAcl
/// 3. `X-Amz-Object-Attributes` header -> GetObjectAttributes
/// 4. default                         -> GetObject (streamed)
async fn handle_get_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    uri: Uri,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, S3Error> {
    let key = object_key(&uri, key);
    let query = parse_query(raw_query);

    if let Some(upload_id) = query_value(&query, "uploadId") {
        let max_parts =
            positive_query_arg(&query, "max-parts").ok_or(S3Error::InvalidMaxParts)?;
        let part_number_marker = positive_query_arg(&query, "part-number-marker")
            .ok_or(S3Error::InvalidPartNumberMarker)?;

        record_operation("ListParts");
        return handlers::multipart::list_object_parts(
            state,
            &bucket,
            &key,
            upload_id,
            part_number_marker,
            max_parts,
        )
        .await;
    }

    if query.contains_key("acl") {
        record_operation("GetObjectAcl");
        return handlers::object::get_object_acl(state, &bucket, &key).await;
    }

    if let Some(attrs) = header_value(&headers, "x-amz-object-attributes") {
        record_operation("GetObjectAttributes");
        let attributes: Vec<String> = attrs.split(',').map(|a| a.trim().to_string()).collect();
        return handlers::object::get_object_attributes(state, &bucket, &key, attributes).await;
    }

    record_operation("GetObject");
    let request = GetObjectRequest {
        bucket,
        key,
        range: header_value(&headers, "range"),
    };
    handlers::object::get_object(state, request).await
}

/// `PUT /:bucket/*key` priority ladder:
/// 1. `?uploadId=...&partNumber=...`  -> UploadPart (part number must
///    be >= 1; a garbled Content-Length is a protocol error)
/// 2. canned ACL or grant headers     -> PutObjectAcl (both at once is
///    a protocol error)
/// 3. `X-Amz-Copy-Source` header      -> CopyObject (conditions
///    forwarded to the backend)
/// 4. default                         -> PutObject (streamed)
async fn handle_put_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    uri: Uri,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<Response, S3Error> {
    let key = object_key(&uri, key);
    let query = parse_query(raw_query);
    let content_length = content_length(&headers)?;

    if let (Some(upload_id), Some(part_raw)) = (
        query_value(&query, "uploadId"),
        query_value(&query, "partNumber"),
    ) {
        let part_number = part_raw
            .parse::<i64>()
            .ok()
            .filter(|n| (1..=i64::from(u32::MAX)).contains(n))
            .ok_or(S3Error::InvalidPart)? as u32;

        record_operation("UploadPart");
        return handlers::multipart::put_object_part(
            state,
            &bucket,
            &key,
            upload_id,
            part_number,
            content_length,
            body_stream(body),
        )
        .await;
    }

    if let Some(source) = acl_source_from_headers(&headers)? {
        record_operation("PutObjectAcl");
        let request = PutObjectAclRequest {
            bucket,
            key,
            source,
        };
        return handlers::object::put_object_acl(state, request).await;
    }

    if let Some(copy_source) = header_value(&headers, "x-amz-copy-source") {
        record_operation("CopyObject");
        let (src_bucket, src_key) = parse_copy_source(&copy_source)?;
        let request = CopyObjectRequest {
            src_bucket,
            src_key,
            dst_bucket: bucket,
            dst_key: key,
            conditions: copy_conditions_from_headers(&headers),
        };
        return handlers::object::copy_object(state, request).await;
    }

    record_operation("PutObject");
    let request = PutObjectRequest {
        bucket,
        key,
        content_length,
        content_type: header_value(&headers, "content-type"),
        metadata: user_metadata_from_headers(&headers),
        body: body_stream(body),
    };
    handlers::object::put_object(state, request).await
}

/// `DELETE /:bucket/*key` priority ladder:
/// 1. `?uploadId=...` -> AbortMultipartUpload
/// 2. default         -> DeleteObject
async fn handle_delete_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    uri: Uri,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, S3Error> {
    let key = object_key(&uri, key);
    let query = parse_query(raw_query);

    if let Some(upload_id) = query_value(&query, "uploadId") {
        record_operation("AbortMultipartUpload");
        let request = AbortMultipartUploadRequest {
            bucket,
            key,
            upload_id: upload_id.to_string(),
            expected_bucket_owner: header_value(&headers, "x-amz-expected-bucket-owner"),
            request_payer: header_value(&headers, "x-amz-request-payer"),
        };
        return handlers::multipart::abort_multipart_upload(state, request).await;
    }

    record_operation("DeleteObject");
    handlers::object::delete_object(state, &bucket, &key).await
}

/// `HEAD /:bucket/*key` -- HeadObject: GetObject's header set, no body.
async fn handle_head_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response, S3Error> {
    let key = object_key(&uri, key);
    record_operation("HeadObject");
    handlers::object::head_object(state, &bucket, &key).await
}

/// `POST /:bucket/*key` priority ladder:
/// 1. `?restore`      -> RestoreObject (XML `<RestoreRequest>` body)
/// 2. `?uploadId=...` -> CompleteMultipartUpload (XML part list body)
/// 3. default         -> CreateMultipartUpload
async fn handle_post_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    uri: Uri,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, S3Error> {
    let key = object_key(&uri, key);
    let query = parse_query(raw_query);

    if query.contains_key("restore") {
        record_operation("RestoreObject");
        let request = crate::xml::parse_restore_request(&body)?;
        return handlers::object::restore_object(state, &bucket, &key, request).await;
    }

    if let Some(upload_id) = query_value(&query, "uploadId") {
        record_operation("CompleteMultipartUpload");
        let parts = crate::xml::parse_complete_multipart_upload(&body)?;
        return handlers::multipart::complete_multipart_upload(
            state, &bucket, &key, upload_id, parts,
        )
        .await;
    }

    record_operation("CreateMultipartUpload");
    let metadata = user_metadata_from_headers(&headers);
    handlers::multipart::create_multipart_upload(state, &bucket, &key, metadata).await
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::config::Config;
    use axum::body::Body;
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new("tester"));
        let state = Arc::new(AppState {
            config: Config::default(),
            backend: backend.clone(),
        });
        (app(state), backend)
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let response = router
            .clone()
            .oneshot(builder.body(body.into()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    fn extract_tag(body: &str, tag: &str) -> String {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        let start = body.find(&open).unwrap() + open.len();
        let end = body.find(&close).unwrap();
        body[start..end].to_string()
    }

    #[tokio::test]
    async fn test_list_buckets_document() {
        let (router, _) = test_app();
        send(&router, "PUT", "/alpha", &[], Body::empty()).await;
        send(&router, "PUT", "/beta", &[], Body::empty()).await;

        let (status, headers, body) = send(&router, "GET", "/", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("content-type").unwrap(), "application/xml");
        assert!(headers.contains_key("x-amz-request-id"));
        assert!(body.contains("<ListAllMyBucketsResult"));
        assert!(body.contains("<Name>alpha</Name>"));
        assert!(body.contains("<Name>beta</Name>"));
    }

    #[tokio::test]
    async fn test_list_objects_v2_scenario() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/p1", &[], "one").await;
        send(&router, "PUT", "/b1/p2", &[], "two").await;
        send(&router, "PUT", "/b1/other", &[], "three").await;

        let (status, _, body) = send(
            &router,
            "GET",
            "/b1?list-type=2&prefix=p&max-keys=100",
            &[],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<ListBucketResult"));
        assert!(body.contains("<KeyCount>2</KeyCount>"));
        assert!(body.contains("<Key>p1</Key>"));
        assert!(!body.contains("<Key>other</Key>"));
    }

    #[tokio::test]
    async fn test_list_objects_v1_marker_and_alias() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        for key in ["a", "b", "c"] {
            send(&router, "PUT", &format!("/b1/{key}"), &[], "x").await;
        }

        let (_, _, by_marker) =
            send(&router, "GET", "/b1?marker=a", &[], Body::empty()).await;
        assert!(!by_marker.contains("<Key>a</Key>"));
        assert!(by_marker.contains("<Key>b</Key>"));
        assert!(by_marker.contains("<Marker>a</Marker>"));

        // The continuation-token spelling is accepted on v1 as well.
        let (_, _, by_token) = send(
            &router,
            "GET",
            "/b1?continuation-token=a",
            &[],
            Body::empty(),
        )
        .await;
        assert!(!by_token.contains("<Key>a</Key>"));
        assert!(by_token.contains("<Key>b</Key>"));
    }

    #[tokio::test]
    async fn test_put_get_round_trip_with_metadata() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        let (status, headers, _) = send(
            &router,
            "PUT",
            "/b1/m.txt",
            &[("x-amz-meta-foo", "bar"), ("content-type", "text/plain")],
            "hello",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get("etag").unwrap().to_str().unwrap().starts_with('"'));

        let (status, headers, body) =
            send(&router, "GET", "/b1/m.txt", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello");
        assert_eq!(headers.get("x-amz-meta-foo").unwrap(), "bar");
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
        assert_eq!(headers.get("content-length").unwrap(), "5");
        // Last-Modified is RFC 1123 GMT.
        let last_modified = headers.get("last-modified").unwrap().to_str().unwrap();
        assert!(last_modified.ends_with(" GMT"));
        assert!(httpdate::parse_http_date(last_modified).is_ok());
    }

    #[tokio::test]
    async fn test_get_object_range_passthrough() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/r.bin", &[], "0123456789").await;

        let (status, headers, body) = send(
            &router,
            "GET",
            "/b1/r.bin",
            &[("range", "bytes=2-5")],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "2345");
        assert_eq!(headers.get("content-length").unwrap(), "4");
    }

    #[tokio::test]
    async fn test_head_object_headers_no_body() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/h.txt", &[("x-amz-meta-k", "v")], "abc").await;

        let (status, headers, body) =
            send(&router, "HEAD", "/b1/h.txt", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(headers.get("content-length").unwrap(), "3");
        assert_eq!(headers.get("x-amz-meta-k").unwrap(), "v");
        // Optional headers stay present with empty values.
        assert_eq!(headers.get("content-encoding").unwrap(), "");
    }

    #[tokio::test]
    async fn test_trailing_slash_key_preserved() {
        let (router, backend) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        let (status, _, _) = send(&router, "PUT", "/b1/dir/", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);

        use crate::backend::Backend;
        assert!(backend.head_object("b1", "dir/").await.is_ok());
        assert!(backend.head_object("b1", "dir").await.is_err());
    }

    #[tokio::test]
    async fn test_copy_object_scenario() {
        let (router, _) = test_app();
        send(&router, "PUT", "/src", &[], Body::empty()).await;
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/src/obj/sub", &[], "copied-data").await;

        let (status, _, body) = send(
            &router,
            "PUT",
            "/b1/k1",
            &[("x-amz-copy-source", "src/obj/sub")],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<CopyObjectResult>"));
        assert!(body.contains("<ETag>"));

        let (_, _, copied) = send(&router, "GET", "/b1/k1", &[], Body::empty()).await;
        assert_eq!(copied, "copied-data");
    }

    #[tokio::test]
    async fn test_copy_failed_precondition_is_412() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/src.txt", &[], "data").await;

        let (status, _, body) = send(
            &router,
            "PUT",
            "/b1/dst.txt",
            &[
                ("x-amz-copy-source", "b1/src.txt"),
                ("x-amz-copy-source-if-match", "\"bogus\""),
            ],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert!(body.contains("<Code>PreconditionFailed</Code>"));
    }

    #[tokio::test]
    async fn test_acl_mutual_exclusion_no_backend_call() {
        let (router, backend) = test_app();

        let (status, _, body) = send(
            &router,
            "PUT",
            "/pb",
            &[
                ("x-amz-acl", "private"),
                ("x-amz-grant-read", "id=alice"),
            ],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>InvalidRequest</Code>"));

        // The ladder failed before dispatch: the bucket was never created.
        use crate::backend::Backend;
        assert!(backend.head_bucket("pb").await.is_err());
    }

    #[tokio::test]
    async fn test_put_bucket_acl_from_canned_header() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        let (status, _, _) = send(
            &router,
            "PUT",
            "/b1",
            &[("x-amz-acl", "public-read")],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(&router, "GET", "/b1?acl", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<AccessControlPolicy"));
        assert!(body.contains("AllUsers"));
        // Owner is the authenticated principal (config default).
        assert!(body.contains("<ID>portico</ID>"));
    }

    #[tokio::test]
    async fn test_object_acl_query_presence_with_empty_value() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/k", &[], "x").await;

        // `?acl` with no value still selects the ACL branch.
        let (status, _, body) = send(&router, "GET", "/b1/k?acl", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<AccessControlPolicy"));
    }

    #[tokio::test]
    async fn test_multipart_upload_flow() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        // POST without a recognized subresource starts an upload.
        let (status, _, body) = send(&router, "POST", "/b1/big.bin", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<InitiateMultipartUploadResult>"));
        let upload_id = extract_tag(&body, "UploadId");

        // Scenario: part 3, body "abc", Content-Length 3.
        let (status, headers, _) = send(
            &router,
            "PUT",
            &format!("/b1/big.bin?uploadId={upload_id}&partNumber=3"),
            &[("content-length", "3")],
            "abc",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let part_etag = headers.get("etag").unwrap().to_str().unwrap().to_string();
        // MD5("abc"), quoted.
        assert_eq!(part_etag, "\"900150983cd24fb0d6963f7d28e17f72\"");

        let (status, _, body) = send(
            &router,
            "GET",
            &format!("/b1/big.bin?uploadId={upload_id}"),
            &[],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<ListPartsResult"));
        assert!(body.contains("<PartNumber>3</PartNumber>"));

        let complete = format!(
            "<CompleteMultipartUpload><Part><PartNumber>3</PartNumber><ETag>{part_etag}</ETag></Part></CompleteMultipartUpload>"
        );
        let (status, _, body) = send(
            &router,
            "POST",
            &format!("/b1/big.bin?uploadId={upload_id}"),
            &[],
            complete,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<CompleteMultipartUploadResult>"));

        let (_, _, data) = send(&router, "GET", "/b1/big.bin", &[], Body::empty()).await;
        assert_eq!(data, "abc");
    }

    #[tokio::test]
    async fn test_abort_multipart_upload() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        let (_, _, body) = send(&router, "POST", "/b1/k1", &[], Body::empty()).await;
        let upload_id = extract_tag(&body, "UploadId");

        let (status, _, body) = send(
            &router,
            "DELETE",
            &format!("/b1/k1?uploadId={upload_id}"),
            &[],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        // The upload is gone.
        let (status, _, _) = send(
            &router,
            "GET",
            &format!("/b1/k1?uploadId={upload_id}"),
            &[],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_max_parts_rejected() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        let (status, _, body) = send(
            &router,
            "GET",
            "/b1/k1?max-parts=-1&uploadId=U",
            &[],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>InvalidMaxParts</Code>"));

        let (status, _, body) = send(
            &router,
            "GET",
            "/b1/k1?part-number-marker=zero&uploadId=U",
            &[],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>InvalidPartNumberMarker</Code>"));
    }

    #[tokio::test]
    async fn test_invalid_part_number_rejected() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        let (status, _, body) = send(
            &router,
            "PUT",
            "/b1/k1?uploadId=U&partNumber=0",
            &[],
            "abc",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>InvalidPart</Code>"));
    }

    #[tokio::test]
    async fn test_batch_delete_on_bucket() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/a", &[], "a").await;
        send(&router, "PUT", "/b1/b", &[], "b").await;

        let delete_doc =
            "<Delete><Object><Key>a</Key></Object><Object><Key>b</Key></Object></Delete>";
        let (status, _, body) =
            send(&router, "DELETE", "/b1?delete", &[], delete_doc).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<DeleteResult"));
        assert!(body.contains("<Key>a</Key>"));

        let (status, _, _) = send(&router, "GET", "/b1/a", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_delete_malformed_xml() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        let (status, _, body) =
            send(&router, "DELETE", "/b1?delete", &[], "this is not xml <").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("<Code>MalformedXML</Code>"));
    }

    #[tokio::test]
    async fn test_backend_error_passthrough_shape() {
        let (router, _) = test_app();

        let (status, headers, body) =
            send(&router, "GET", "/missing/k", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers.get("content-type").unwrap(), "application/xml");
        assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(body.contains("<Error><Code>NoSuchBucket</Code>"));
        assert!(body.contains("<RequestId>"));
    }

    #[tokio::test]
    async fn test_delete_missing_bucket_is_404() {
        let (router, _) = test_app();
        let (status, _, body) = send(&router, "DELETE", "/ghost", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<Code>NoSuchBucket</Code>"));
    }

    #[tokio::test]
    async fn test_get_object_attributes_header_branch() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/k", &[], "payload").await;

        let (status, headers, body) = send(
            &router,
            "GET",
            "/b1/k",
            &[("x-amz-object-attributes", "ETag,ObjectSize")],
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<GetObjectAttributesResponse"));
        assert!(body.contains("<ObjectSize>7</ObjectSize>"));
        assert!(!body.contains("StorageClass"));
        assert!(headers.contains_key("last-modified"));
    }

    #[tokio::test]
    async fn test_restore_object_branch() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;
        send(&router, "PUT", "/b1/cold.bin", &[], "x").await;

        let (status, _, body) = send(
            &router,
            "POST",
            "/b1/cold.bin?restore",
            &[],
            "<RestoreRequest><Days>3</Days></RestoreRequest>",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        // A malformed restore document is a protocol error.
        let (status, _, _) = send(
            &router,
            "POST",
            "/b1/cold.bin?restore",
            &[],
            "<nope",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_head_bucket_and_uploads_listing() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        let (status, _, body) = send(&router, "HEAD", "/b1", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        send(&router, "POST", "/b1/u1", &[], Body::empty()).await;
        let (status, _, body) =
            send(&router, "GET", "/b1?uploads", &[], Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<ListMultipartUploadsResult"));
        assert!(body.contains("<Key>u1</Key>"));
    }

    #[tokio::test]
    async fn test_garbled_content_length_is_invalid_request() {
        let (router, _) = test_app();
        send(&router, "PUT", "/b1", &[], Body::empty()).await;

        // Exercise the ladder's Content-Length validation directly; a
        // raw socket client can send what hyper would normally refuse.
        let headers = {
            let mut h = HeaderMap::new();
            h.insert("content-length", HeaderValue::from_static("not-a-number"));
            h
        };
        assert!(matches!(
            content_length(&headers),
            Err(S3Error::InvalidRequest)
        ));
    }

    #[test]
    fn test_parse_query_presence_vs_value() {
        let query = parse_query(Some("acl&uploadId=U&max-parts=".to_string()));
        assert!(query.contains_key("acl"));
        assert_eq!(query.get("acl").map(String::as_str), Some(""));
        assert_eq!(query_value(&query, "uploadId"), Some("U"));
        // Empty value behaves like absence for value-bearing args.
        assert_eq!(query_value(&query, "max-parts"), None);
        assert_eq!(positive_query_arg(&query, "max-parts"), Some(0));
    }

    #[test]
    fn test_positive_query_arg_validation() {
        let query = parse_query(Some("max-parts=5&bad=-1&zero=0&junk=x".to_string()));
        assert_eq!(positive_query_arg(&query, "max-parts"), Some(5));
        assert_eq!(positive_query_arg(&query, "missing"), Some(0));
        assert_eq!(positive_query_arg(&query, "bad"), None);
        assert_eq!(positive_query_arg(&query, "zero"), None);
        assert_eq!(positive_query_arg(&query, "junk"), None);
    }

    #[test]
    fn test_object_key_trailing_slash() {
        let uri: Uri = "/b1/dir/".parse().unwrap();
        assert_eq!(object_key(&uri, "dir".to_string()), "dir/");
        assert_eq!(object_key(&uri, "dir/".to_string()), "dir/");

        let uri: Uri = "/b1/file.txt".parse().unwrap();
        assert_eq!(object_key(&uri, "file.txt".to_string()), "file.txt");
    }
}
