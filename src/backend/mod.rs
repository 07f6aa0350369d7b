//! Pluggable storage backend.
//!
//! The dispatcher talks to storage exclusively through the [`Backend`]
//! trait.  The trait uses `async_trait`-style methods (manual
//! desugaring with pinned futures) so trait objects stay plain and
//! implementations can live anywhere: in memory, on a filesystem, or in
//! front of another object store.
//!
//! Failure contract: implementations surface domain failures as
//! catalog [`S3Error`] variants, which pass through to the client with
//! their status and code intact.  Anything else converts into
//! [`S3Error::InternalError`] (via `?` on an `anyhow::Error`) and
//! renders as an opaque 500.  `get_object` and `head_object` return a
//! value or an error, never neither.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::BoxStream;

pub mod memory;
pub mod types;

use types::{
    AbortMultipartUploadRequest, Acl, BucketList, CompletedPart, CompletedUpload,
    CopyObjectRequest, CopyObjectResult, DeleteObjectsResult, DeleteRequest, GetObjectRequest,
    GetObjectResult, ListObjectsRequest, ObjectAttributes, ObjectInfo, ObjectListing,
    PartListing, PutBucketAclRequest, PutObjectAclRequest, PutObjectRequest, RestoreRequest,
    UploadListing,
};

use crate::errors::S3Error;

/// Streamed object payload.  Bodies flow through the dispatcher in both
/// directions without being buffered.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Storage backend capability surface.
pub trait Backend: Send + Sync + 'static {
    // ── Buckets ─────────────────────────────────────────────────────

    /// List all buckets with their owner.
    fn list_buckets(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<BucketList, S3Error>> + Send + '_>>;

    /// Check that a bucket exists.
    fn head_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>>;

    /// Create a bucket owned by `owner`.
    fn put_bucket(
        &self,
        bucket: &str,
        owner: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>>;

    /// Delete a bucket.
    fn delete_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>>;

    /// Replace a bucket's ACL.
    fn put_bucket_acl(
        &self,
        request: PutBucketAclRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>>;

    /// Fetch a bucket's ACL.
    fn get_bucket_acl(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Acl, S3Error>> + Send + '_>>;

    // ── Listings ────────────────────────────────────────────────────

    /// List objects (v1 pagination).
    fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectListing, S3Error>> + Send + '_>>;

    /// List objects (v2 pagination).
    fn list_objects_v2(
        &self,
        request: ListObjectsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectListing, S3Error>> + Send + '_>>;

    /// List in-progress multipart uploads for a bucket.
    fn list_multipart_uploads(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<UploadListing, S3Error>> + Send + '_>>;

    // ── Objects ─────────────────────────────────────────────────────

    /// Fetch object metadata without the body.
    fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectInfo, S3Error>> + Send + '_>>;

    /// Fetch an object.  The `range` header, when present, is
    /// interpreted by the backend.
    fn get_object(
        &self,
        request: GetObjectRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GetObjectResult, S3Error>> + Send + '_>>;

    /// Fetch an object's ACL.
    fn get_object_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Acl, S3Error>> + Send + '_>>;

    /// Replace an object's ACL.
    fn put_object_acl(
        &self,
        request: PutObjectAclRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>>;

    /// Fetch the requested subset of object attributes.
    fn get_object_attributes(
        &self,
        bucket: &str,
        key: &str,
        attributes: &[String],
    ) -> Pin<Box<dyn Future<Output = Result<ObjectAttributes, S3Error>> + Send + '_>>;

    /// Store an object, returning its quoted ETag.
    fn put_object(
        &self,
        request: PutObjectRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, S3Error>> + Send + '_>>;

    /// Server-side copy.  Forwarded preconditions are evaluated against
    /// the source object.
    fn copy_object(
        &self,
        request: CopyObjectRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CopyObjectResult, S3Error>> + Send + '_>>;

    /// Delete a single object (idempotent).
    fn delete_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>>;

    /// Delete a batch of objects, reporting per-key outcomes.
    fn delete_objects(
        &self,
        bucket: &str,
        request: DeleteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<DeleteObjectsResult, S3Error>> + Send + '_>>;

    // ── Multipart uploads ───────────────────────────────────────────

    /// Start a multipart upload, returning the assigned upload ID.
    fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: std::collections::HashMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<String, S3Error>> + Send + '_>>;

    /// Store one part of a multipart upload, returning the part's
    /// quoted ETag.
    #[allow(clippy::too_many_arguments)]
    fn put_object_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        content_length: i64,
        body: ByteStream,
    ) -> Pin<Box<dyn Future<Output = Result<String, S3Error>> + Send + '_>>;

    /// List stored parts of an upload.
    fn list_object_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: u32,
        max_parts: u32,
    ) -> Pin<Box<dyn Future<Output = Result<PartListing, S3Error>> + Send + '_>>;

    /// Assemble the named parts into the final object.
    fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Pin<Box<dyn Future<Output = Result<CompletedUpload, S3Error>> + Send + '_>>;

    /// Abort an upload and discard its parts.
    fn abort_multipart_upload(
        &self,
        request: AbortMultipartUploadRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>>;

    // ── Optional capabilities ───────────────────────────────────────

    /// Restore an archived object.  Backends without an archive tier
    /// keep the default, which reports the capability as missing.
    fn restore_object(
        &self,
        _bucket: &str,
        _key: &str,
        _request: RestoreRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        Box::pin(async { Err(S3Error::NotImplemented) })
    }
}
