//! Multipart-upload S3 operations.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::response::Response;

use crate::backend::types::{AbortMultipartUploadRequest, CompletedPart};
use crate::backend::ByteStream;
use crate::errors::S3Error;
use crate::response::{send_empty, send_xml};
use crate::xml;
use crate::AppState;

/// `POST /{bucket}/{key}` -- Start a multipart upload.
#[utoipa::path(
    post,
    path = "/{bucket}/{key}",
    tag = "Multipart",
    operation_id = "CreateMultipartUpload",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
    ),
    responses(
        (status = 200, description = "InitiateMultipartUploadResult XML"),
        (status = 404, description = "Bucket not found")
    )
)]
pub async fn create_multipart_upload(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
    metadata: HashMap<String, String>,
) -> Result<Response, S3Error> {
    let upload_id = state
        .backend
        .create_multipart_upload(bucket, key, metadata)
        .await?;

    Ok(send_xml(xml::render_initiate_multipart_upload_result(
        bucket, key, &upload_id,
    )))
}

/// `PUT /{bucket}/{key}?partNumber={n}&uploadId={id}` -- Store one part.
#[utoipa::path(
    put,
    path = "/{bucket}/{key}?partNumber&uploadId",
    tag = "Multipart",
    operation_id = "UploadPart",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
        ("partNumber" = u32, Query, description = "Part number"),
        ("uploadId" = String, Query, description = "Upload ID"),
    ),
    responses(
        (status = 200, description = "Part stored, ETag header set"),
        (status = 404, description = "Upload not found")
    )
)]
#[allow(clippy::too_many_arguments)]
pub async fn put_object_part(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
    upload_id: &str,
    part_number: u32,
    content_length: i64,
    body: ByteStream,
) -> Result<Response, S3Error> {
    let etag = state
        .backend
        .put_object_part(bucket, key, upload_id, part_number, content_length, body)
        .await?;

    let mut response = send_empty();
    response
        .headers_mut()
        .insert("etag", HeaderValue::from_str(&etag).unwrap());
    Ok(response)
}

/// `GET /{bucket}/{key}?uploadId={id}` -- List stored parts.
#[utoipa::path(
    get,
    path = "/{bucket}/{key}?uploadId",
    tag = "Multipart",
    operation_id = "ListParts",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
        ("uploadId" = String, Query, description = "Upload ID"),
    ),
    responses(
        (status = 200, description = "ListPartsResult XML"),
        (status = 404, description = "Upload not found")
    )
)]
pub async fn list_object_parts(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
    upload_id: &str,
    part_number_marker: u32,
    max_parts: u32,
) -> Result<Response, S3Error> {
    let listing = state
        .backend
        .list_object_parts(bucket, key, upload_id, part_number_marker, max_parts)
        .await?;

    Ok(send_xml(xml::render_list_parts_result(
        bucket,
        key,
        upload_id,
        part_number_marker,
        max_parts,
        &listing,
    )))
}

/// `POST /{bucket}/{key}?uploadId={id}` -- Assemble the final object
/// from the parts named in the request document.
#[utoipa::path(
    post,
    path = "/{bucket}/{key}?uploadId",
    tag = "Multipart",
    operation_id = "CompleteMultipartUpload",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
        ("uploadId" = String, Query, description = "Upload ID"),
    ),
    responses(
        (status = 200, description = "CompleteMultipartUploadResult XML"),
        (status = 400, description = "Invalid part list"),
        (status = 404, description = "Upload not found")
    )
)]
pub async fn complete_multipart_upload(
    state: Arc<AppState>,
    bucket: &str,
    key: &str,
    upload_id: &str,
    parts: Vec<CompletedPart>,
) -> Result<Response, S3Error> {
    let completed = state
        .backend
        .complete_multipart_upload(bucket, key, upload_id, parts)
        .await?;

    Ok(send_xml(xml::render_complete_multipart_upload_result(
        &completed.location,
        &completed.bucket,
        &completed.key,
        &completed.etag,
    )))
}

/// `DELETE /{bucket}/{key}?uploadId={id}` -- Abort an upload.
#[utoipa::path(
    delete,
    path = "/{bucket}/{key}?uploadId",
    tag = "Multipart",
    operation_id = "AbortMultipartUpload",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("key" = String, Path, description = "Object key"),
        ("uploadId" = String, Query, description = "Upload ID"),
    ),
    responses(
        (status = 200, description = "Upload aborted"),
        (status = 404, description = "Upload not found")
    )
)]
pub async fn abort_multipart_upload(
    state: Arc<AppState>,
    request: AbortMultipartUploadRequest,
) -> Result<Response, S3Error> {
    state.backend.abort_multipart_upload(request).await?;
    Ok(send_empty())
}
