//! Object-scope S3 operations.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::response::Response;

use crate::backend::types::{
    CopyObjectRequest, GetObjectRequest, PutObjectAclRequest, PutObjectRequest, RestoreRequest,
};
use crate::errors::S3Error;
use crate::headers::apply_object_headers;
use crate::response::{send_empty, send_stream, send_xml};
use crate::xml;
use crate::AppState;

/// `GET /{bucket}/{key}` -- Fetch an object.
///
/// The body streams from the backend straight into the response; the
/// dispatcher never holds the payload.
#[utoipa::path(
    get,
    path = "/{bucket}/{key}",
    tag = "Object",
    operation_id = "GetObject",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "Object data"),
        (status = 404, description = "Bucket or key not found")
    )
)]
pub async fn get_object(
    state: Arc<AppState>,
    request: GetObjectRequest,
) -> Result<Response, S3Error> {
    let result = state.backend.get_object(request).await?;

    let mut response = send_stream(result.body);
    apply_object_headers(response.headers_mut(), &result.info);
    Ok(response)
}

/// `HEAD /{bucket}/{key}` -- Fetch object metadata, no body.
#[utoipa::path(
    head,
    path = "/{bucket}/{key}",
    tag = "Object",
    operation_id = "HeadObject",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "Object metadata"),
        (status = 404, description = "Bucket or key not found")
    )
)]
pub async fn head_object(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
) -> Result<Response, S3Error> {
    let info = state.backend.head_object(bucket, key).await?;

    let mut response = send_empty();
    apply_object_headers(response.headers_mut(), &info);
    Ok(response)
}

/// `PUT /{bucket}/{key}` -- Store an object.
#[utoipa::path(
    put,
    path = "/{bucket}/{key}",
    tag = "Object",
    operation_id = "PutObject",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "Object stored, ETag header set"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn put_object(
    state: Arc<AppState>,
    request: PutObjectRequest,
) -> Result<Response, S3Error> {
    let etag = state.backend.put_object(request).await?;

    let mut response = send_empty();
    response
        .headers_mut()
        .insert("etag", HeaderValue::from_str(&etag).unwrap());
    Ok(response)
}

/// `PUT /{bucket}/{key}` with `x-amz-copy-source` -- Server-side copy.
#[utoipa::path(
    put,
    path = "/{bucket}/{key}?copy",
    tag = "Object",
    operation_id = "CopyObject",
    params(
        ("bucket" = String, Path, description = "Destination bucket"),
        ("key" = String, Path, description = "Destination key"),
    ),
    responses(
        (status = 200, description = "CopyObjectResult XML"),
        (status = 404, description = "Source not found"),
        (status = 412, description = "Copy precondition failed")
    )
)]
pub async fn copy_object(
    state: Arc<AppState>,
    request: CopyObjectRequest,
) -> Result<Response, S3Error> {
    let result = state.backend.copy_object(request).await?;
    Ok(send_xml(xml::render_copy_object_result(
        &result.etag,
        result.last_modified,
    )))
}

/// `DELETE /{bucket}/{key}` -- Delete a single object.
#[utoipa::path(
    delete,
    path = "/{bucket}/{key}",
    tag = "Object",
    operation_id = "DeleteObject",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "Object deleted"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn delete_object(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
) -> Result<Response, S3Error> {
    state.backend.delete_object(bucket, key).await?;
    Ok(send_empty())
}

/// `GET /{bucket}/{key}?acl` -- Fetch an object's ACL.
#[utoipa::path(
    get,
    path = "/{bucket}/{key}?acl",
    tag = "Object",
    operation_id = "GetObjectAcl",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "AccessControlPolicy XML"),
        (status = 404, description = "Key not found")
    )
)]
pub async fn get_object_acl(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
) -> Result<Response, S3Error> {
    let acl = state.backend.get_object_acl(bucket, key).await?;
    Ok(send_xml(xml::render_access_control_policy(&acl)))
}

/// `PUT /{bucket}/{key}?acl` -- Replace an object's ACL.
#[utoipa::path(
    put,
    path = "/{bucket}/{key}?acl",
    tag = "Object",
    operation_id = "PutObjectAcl",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "ACL updated"),
        (status = 404, description = "Key not found")
    )
)]
pub async fn put_object_acl(
    state: Arc<AppState>,
    request: PutObjectAclRequest,
) -> Result<Response, S3Error> {
    state.backend.put_object_acl(request).await?;
    Ok(send_empty())
}

/// `GET /{bucket}/{key}` with `X-Amz-Object-Attributes` -- Fetch the
/// requested subset of object attributes.
#[utoipa::path(
    get,
    path = "/{bucket}/{key}?attributes",
    tag = "Object",
    operation_id = "GetObjectAttributes",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "GetObjectAttributesResponse XML"),
        (status = 404, description = "Key not found")
    )
)]
pub async fn get_object_attributes(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
    attributes: Vec<String>,
) -> Result<Response, S3Error> {
    let attrs = state
        .backend
        .get_object_attributes(bucket, key, &attributes)
        .await?;

    let mut response = send_xml(xml::render_object_attributes(&attrs, &attributes));
    if let Some(last_modified) = attrs.last_modified {
        let value = httpdate::fmt_http_date(last_modified);
        response
            .headers_mut()
            .insert("last-modified", HeaderValue::from_str(&value).unwrap());
    }
    Ok(response)
}

/// `POST /{bucket}/{key}?restore` -- Restore an archived object.
#[utoipa::path(
    post,
    path = "/{bucket}/{key}?restore",
    tag = "Object",
    operation_id = "RestoreObject",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "Restore accepted"),
        (status = 404, description = "Key not found"),
        (status = 501, description = "Backend has no archive tier")
    )
)]
pub async fn restore_object(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
    request: RestoreRequest,
) -> Result<Response, S3Error> {
    state.backend.restore_object(bucket, key, request).await?;
    Ok(send_empty())
}
