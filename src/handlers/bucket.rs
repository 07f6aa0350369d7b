//! Bucket-scope S3 operations.

use std::sync::Arc;

use axum::response::Response;

use crate::backend::types::{DeleteRequest, ListObjectsRequest, PutBucketAclRequest};
use crate::errors::S3Error;
use crate::response::{send_empty, send_xml};
use crate::xml;
use crate::{AppState, Principal};

/// `GET /` -- List all buckets.
#[utoipa::path(
    get,
    path = "/",
    tag = "Bucket",
    operation_id = "ListBuckets",
    responses(
        (status = 200, description = "ListAllMyBucketsResult XML")
    )
)]
pub async fn list_buckets(state: Arc<AppState>) -> Result<Response, S3Error> {
    let list = state.backend.list_buckets().await?;

    let buckets: Vec<(&str, String)> = list
        .buckets
        .iter()
        .map(|b| (b.name.as_str(), xml::iso8601(b.creation_date)))
        .collect();

    Ok(send_xml(xml::render_list_buckets_result(
        &list.owner,
        &buckets,
    )))
}

/// `HEAD /{bucket}` -- Check that a bucket exists.
#[utoipa::path(
    head,
    path = "/{bucket}",
    tag = "Bucket",
    operation_id = "HeadBucket",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Bucket exists"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn head_bucket(state: Arc<AppState>, bucket: &str) -> Result<Response, S3Error> {
    state.backend.head_bucket(bucket).await?;
    Ok(send_empty())
}

/// `PUT /{bucket}` -- Create a bucket owned by the authenticated
/// principal.
#[utoipa::path(
    put,
    path = "/{bucket}",
    tag = "Bucket",
    operation_id = "CreateBucket",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Bucket created"),
        (status = 409, description = "Bucket already exists")
    )
)]
pub async fn put_bucket(
    state: Arc<AppState>,
    bucket: &str,
    principal: &Principal,
) -> Result<Response, S3Error> {
    state.backend.put_bucket(bucket, &principal.0).await?;
    Ok(send_empty())
}

/// `DELETE /{bucket}` -- Delete a bucket.
#[utoipa::path(
    delete,
    path = "/{bucket}",
    tag = "Bucket",
    operation_id = "DeleteBucket",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Bucket deleted"),
        (status = 404, description = "Bucket not found"),
        (status = 409, description = "Bucket not empty")
    )
)]
pub async fn delete_bucket(state: Arc<AppState>, bucket: &str) -> Result<Response, S3Error> {
    state.backend.delete_bucket(bucket).await?;
    Ok(send_empty())
}

/// `PUT /{bucket}?acl` -- Replace a bucket's ACL from a canned token or
/// explicit grant headers.
#[utoipa::path(
    put,
    path = "/{bucket}?acl",
    tag = "Bucket",
    operation_id = "PutBucketAcl",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "ACL updated"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn put_bucket_acl(
    state: Arc<AppState>,
    request: PutBucketAclRequest,
) -> Result<Response, S3Error> {
    state.backend.put_bucket_acl(request).await?;
    Ok(send_empty())
}

/// `GET /{bucket}?acl` -- Fetch a bucket's ACL.
#[utoipa::path(
    get,
    path = "/{bucket}?acl",
    tag = "Bucket",
    operation_id = "GetBucketAcl",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "AccessControlPolicy XML"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn get_bucket_acl(state: Arc<AppState>, bucket: &str) -> Result<Response, S3Error> {
    let acl = state.backend.get_bucket_acl(bucket).await?;
    Ok(send_xml(xml::render_access_control_policy(&acl)))
}

/// `GET /{bucket}` -- List objects, v1 pagination.
#[utoipa::path(
    get,
    path = "/{bucket}",
    tag = "Bucket",
    operation_id = "ListObjects",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "ListBucketResult XML"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn list_objects(
    state: Arc<AppState>,
    request: ListObjectsRequest,
) -> Result<Response, S3Error> {
    let listing = state.backend.list_objects(request.clone()).await?;

    let max_keys = if request.max_keys <= 0 {
        1000
    } else {
        request.max_keys
    };
    Ok(send_xml(xml::render_list_objects_result(
        &request.bucket,
        &request.prefix,
        &request.delimiter,
        &request.marker,
        max_keys,
        &listing,
    )))
}

/// `GET /{bucket}?list-type=2` -- List objects, v2 pagination.
#[utoipa::path(
    get,
    path = "/{bucket}?list-type=2",
    tag = "Bucket",
    operation_id = "ListObjectsV2",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "ListBucketResult XML"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn list_objects_v2(
    state: Arc<AppState>,
    request: ListObjectsRequest,
) -> Result<Response, S3Error> {
    let listing = state.backend.list_objects_v2(request.clone()).await?;

    let max_keys = if request.max_keys <= 0 {
        1000
    } else {
        request.max_keys
    };
    let token = (!request.marker.is_empty()).then_some(request.marker.as_str());
    Ok(send_xml(xml::render_list_objects_v2_result(
        &request.bucket,
        &request.prefix,
        &request.delimiter,
        max_keys,
        token,
        &listing,
    )))
}

/// `GET /{bucket}?uploads` -- List in-progress multipart uploads.
#[utoipa::path(
    get,
    path = "/{bucket}?uploads",
    tag = "Bucket",
    operation_id = "ListMultipartUploads",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "ListMultipartUploadsResult XML"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn list_multipart_uploads(
    state: Arc<AppState>,
    bucket: &str,
) -> Result<Response, S3Error> {
    let listing = state.backend.list_multipart_uploads(bucket).await?;
    Ok(send_xml(xml::render_list_multipart_uploads_result(
        bucket, &listing,
    )))
}

/// `DELETE /{bucket}?delete` -- Delete a batch of objects named in a
/// `<Delete>` document.
#[utoipa::path(
    delete,
    path = "/{bucket}?delete",
    tag = "Bucket",
    operation_id = "DeleteObjects",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "DeleteResult XML"),
        (status = 400, description = "Malformed XML"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn delete_objects(
    state: Arc<AppState>,
    bucket: &str,
    request: DeleteRequest,
) -> Result<Response, S3Error> {
    let quiet = request.quiet;
    let result = state.backend.delete_objects(bucket, request).await?;
    Ok(send_xml(xml::render_delete_result(
        &result.deleted,
        &result.errors,
        quiet,
    )))
}
