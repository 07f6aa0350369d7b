//! In-memory reference backend.
//!
//! Buckets, objects, and multipart uploads live in
//! `tokio::sync::RwLock`-guarded maps.  Object listings come from a
//! `BTreeMap`, so keys are already in lexical order.  ETags are quoted
//! MD5 digests; multipart completions use the S3 convention of hashing
//! the concatenated part digests and appending `-{count}`.
//!
//! This backend powers the test suite and the default server binary.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::time::SystemTime;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use md5::{Digest, Md5};
use tokio::sync::RwLock;

use super::types::{
    AbortMultipartUploadRequest, Acl, BucketInfo, BucketList, CompletedPart, CompletedUpload,
    CopyConditions, CopyObjectRequest, CopyObjectResult, DeleteObjectsResult, DeleteRequest,
    DeletedObject, GetObjectRequest, GetObjectResult, ListObjectsRequest, ObjectAttributes,
    ObjectInfo, ObjectListing, ObjectSummary, Owner, PartInfo, PartListing, PutBucketAclRequest,
    PutObjectAclRequest, PutObjectRequest, RestoreRequest, UploadInfo, UploadListing,
};
use super::{Backend, ByteStream};
use crate::errors::S3Error;

const DEFAULT_LIST_LIMIT: usize = 1000;
const STORAGE_CLASS: &str = "STANDARD";

struct BucketEntry {
    creation_date: SystemTime,
    acl: Acl,
}

struct ObjectEntry {
    data: Bytes,
    etag: String,
    content_type: Option<String>,
    content_encoding: Option<String>,
    metadata: HashMap<String, String>,
    last_modified: SystemTime,
    acl: Acl,
}

struct PartEntry {
    data: Bytes,
    etag: String,
    last_modified: SystemTime,
}

struct UploadEntry {
    bucket: String,
    key: String,
    metadata: HashMap<String, String>,
    initiated: SystemTime,
    owner: Owner,
    parts: BTreeMap<u32, PartEntry>,
}

/// In-memory [`Backend`] implementation.
pub struct MemoryBackend {
    owner: Owner,
    buckets: RwLock<BTreeMap<String, BucketEntry>>,
    /// Keyed by (bucket, key); the BTreeMap ordering doubles as the
    /// listing order.
    objects: RwLock<BTreeMap<(String, String), ObjectEntry>>,
    uploads: RwLock<HashMap<String, UploadEntry>>,
}

impl MemoryBackend {
    /// Create an empty backend whose resources default to `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        MemoryBackend {
            owner: Owner::new(owner),
            buckets: RwLock::new(BTreeMap::new()),
            objects: RwLock::new(BTreeMap::new()),
            uploads: RwLock::new(HashMap::new()),
        }
    }

    fn object_info(entry: &ObjectEntry) -> ObjectInfo {
        ObjectInfo {
            metadata: entry.metadata.clone(),
            content_length: entry.data.len() as i64,
            content_type: entry.content_type.clone(),
            content_encoding: entry.content_encoding.clone(),
            etag: Some(entry.etag.clone()),
            last_modified: Some(entry.last_modified),
        }
    }
}

/// Quoted hex MD5 of a byte slice.
fn quoted_md5(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(data)))
}

/// Drain a body stream into contiguous bytes.
async fn collect_body(mut body: ByteStream) -> Result<Bytes, S3Error> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(anyhow::Error::from)?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// Wrap already-resident bytes as a body stream.
fn stream_of(data: Bytes) -> ByteStream {
    futures::stream::iter([Ok(data)]).boxed()
}

// ── Range handling ──────────────────────────────────────────────────

/// Resolve a `Range` header against `total` bytes, returning the
/// inclusive (start, end) to serve.  Unsupported or unsatisfiable
/// ranges fall back to the full object; range interpretation is a
/// backend courtesy, not a dispatcher concern.
fn resolve_range(range: &str, total: u64) -> Option<(u64, u64)> {
    let spec = range.trim().strip_prefix("bytes=")?;
    if spec.contains(',') || total == 0 {
        return None;
    }

    if let Some(suffix) = spec.strip_prefix('-') {
        let n: u64 = suffix.parse().ok()?;
        if n == 0 {
            return None;
        }
        Some((total.saturating_sub(n), total - 1))
    } else if let Some(start) = spec.strip_suffix('-') {
        let start: u64 = start.parse().ok()?;
        (start < total).then(|| (start, total - 1))
    } else {
        let (start, end) = spec.split_once('-')?;
        let start: u64 = start.parse().ok()?;
        let end: u64 = end.parse().ok()?;
        (start <= end && start < total).then(|| (start, end.min(total - 1)))
    }
}

/// Evaluate forwarded copy preconditions against the source object.
fn check_copy_conditions(conditions: &CopyConditions, entry: &ObjectEntry) -> Result<(), S3Error> {
    let etag = entry.etag.trim_matches('"');

    if let Some(expected) = conditions.if_match.as_deref() {
        let expected = expected.trim_matches('"');
        if expected != "*" && expected != etag {
            return Err(S3Error::PreconditionFailed);
        }
    }
    if let Some(rejected) = conditions.if_none_match.as_deref() {
        let rejected = rejected.trim_matches('"');
        if rejected == "*" || rejected == etag {
            return Err(S3Error::PreconditionFailed);
        }
    }
    if let Some(since) = conditions.if_modified_since.as_deref() {
        if let Ok(threshold) = httpdate::parse_http_date(since) {
            if entry.last_modified <= threshold {
                return Err(S3Error::PreconditionFailed);
            }
        }
    }
    if let Some(since) = conditions.if_unmodified_since.as_deref() {
        if let Ok(threshold) = httpdate::parse_http_date(since) {
            if entry.last_modified > threshold {
                return Err(S3Error::PreconditionFailed);
            }
        }
    }

    Ok(())
}

impl Backend for MemoryBackend {
    fn list_buckets(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<BucketList, S3Error>> + Send + '_>> {
        Box::pin(async move {
            let buckets = self.buckets.read().await;
            Ok(BucketList {
                owner: self.owner.clone(),
                buckets: buckets
                    .iter()
                    .map(|(name, entry)| BucketInfo {
                        name: name.clone(),
                        creation_date: entry.creation_date,
                    })
                    .collect(),
            })
        })
    }

    fn head_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            if self.buckets.read().await.contains_key(&bucket) {
                Ok(())
            } else {
                Err(S3Error::NoSuchBucket { bucket })
            }
        })
    }

    fn put_bucket(
        &self,
        bucket: &str,
        owner: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let owner = Owner::new(owner);
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            if buckets.contains_key(&bucket) {
                return Err(S3Error::BucketAlreadyExists { bucket });
            }
            buckets.insert(
                bucket,
                BucketEntry {
                    creation_date: SystemTime::now(),
                    acl: Acl::full_control(&owner),
                },
            );
            Ok(())
        })
    }

    fn delete_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            if !buckets.contains_key(&bucket) {
                return Err(S3Error::NoSuchBucket { bucket });
            }
            let objects = self.objects.read().await;
            if objects.keys().any(|(b, _)| *b == bucket) {
                return Err(S3Error::BucketNotEmpty { bucket });
            }
            buckets.remove(&bucket);
            Ok(())
        })
    }

    fn put_bucket_acl(
        &self,
        request: PutBucketAclRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        Box::pin(async move {
            let acl = Acl::from_source(&request.owner, &request.source)?;
            let mut buckets = self.buckets.write().await;
            let entry = buckets
                .get_mut(&request.bucket)
                .ok_or(S3Error::NoSuchBucket {
                    bucket: request.bucket.clone(),
                })?;
            entry.acl = acl;
            Ok(())
        })
    }

    fn get_bucket_acl(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Acl, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            let buckets = self.buckets.read().await;
            let entry = buckets
                .get(&bucket)
                .ok_or(S3Error::NoSuchBucket { bucket })?;
            Ok(entry.acl.clone())
        })
    }

    fn list_objects(
        &self,
        request: ListObjectsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectListing, S3Error>> + Send + '_>> {
        Box::pin(async move { self.list_common(request).await })
    }

    fn list_objects_v2(
        &self,
        request: ListObjectsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectListing, S3Error>> + Send + '_>> {
        Box::pin(async move { self.list_common(request).await })
    }

    fn list_multipart_uploads(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<UploadListing, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            if !self.buckets.read().await.contains_key(&bucket) {
                return Err(S3Error::NoSuchBucket { bucket });
            }
            let uploads = self.uploads.read().await;
            let mut entries: Vec<UploadInfo> = uploads
                .iter()
                .filter(|(_, u)| u.bucket == bucket)
                .map(|(id, u)| UploadInfo {
                    key: u.key.clone(),
                    upload_id: id.clone(),
                    initiated: u.initiated,
                    storage_class: STORAGE_CLASS.to_string(),
                    owner: u.owner.clone(),
                })
                .collect();
            entries.sort_by(|a, b| a.key.cmp(&b.key).then(a.upload_id.cmp(&b.upload_id)));
            Ok(UploadListing {
                uploads: entries,
                max_uploads: DEFAULT_LIST_LIMIT as i32,
                is_truncated: false,
            })
        })
    }

    fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ObjectInfo, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            if !self.buckets.read().await.contains_key(&bucket) {
                return Err(S3Error::NoSuchBucket { bucket });
            }
            let objects = self.objects.read().await;
            let entry = objects
                .get(&(bucket, key.clone()))
                .ok_or(S3Error::NoSuchKey { key })?;
            Ok(Self::object_info(entry))
        })
    }

    fn get_object(
        &self,
        request: GetObjectRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GetObjectResult, S3Error>> + Send + '_>> {
        Box::pin(async move {
            if !self.buckets.read().await.contains_key(&request.bucket) {
                return Err(S3Error::NoSuchBucket {
                    bucket: request.bucket,
                });
            }
            let objects = self.objects.read().await;
            let entry = objects
                .get(&(request.bucket, request.key.clone()))
                .ok_or(S3Error::NoSuchKey { key: request.key })?;

            let total = entry.data.len() as u64;
            let data = match request.range.as_deref().and_then(|r| resolve_range(r, total)) {
                Some((start, end)) => entry.data.slice(start as usize..(end + 1) as usize),
                None => entry.data.clone(),
            };

            let mut info = Self::object_info(entry);
            info.content_length = data.len() as i64;

            Ok(GetObjectResult {
                info,
                body: stream_of(data),
            })
        })
    }

    fn get_object_acl(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Acl, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let objects = self.objects.read().await;
            let entry = objects
                .get(&(bucket, key.clone()))
                .ok_or(S3Error::NoSuchKey { key })?;
            Ok(entry.acl.clone())
        })
    }

    fn put_object_acl(
        &self,
        request: PutObjectAclRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        Box::pin(async move {
            let acl = Acl::from_source(&self.owner, &request.source)?;
            let mut objects = self.objects.write().await;
            let entry = objects
                .get_mut(&(request.bucket, request.key.clone()))
                .ok_or(S3Error::NoSuchKey { key: request.key })?;
            entry.acl = acl;
            Ok(())
        })
    }

    fn get_object_attributes(
        &self,
        bucket: &str,
        key: &str,
        _attributes: &[String],
    ) -> Pin<Box<dyn Future<Output = Result<ObjectAttributes, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let objects = self.objects.read().await;
            let entry = objects
                .get(&(bucket, key.clone()))
                .ok_or(S3Error::NoSuchKey { key })?;
            Ok(ObjectAttributes {
                etag: Some(entry.etag.clone()),
                storage_class: Some(STORAGE_CLASS.to_string()),
                object_size: Some(entry.data.len() as i64),
                last_modified: Some(entry.last_modified),
            })
        })
    }

    fn put_object(
        &self,
        request: PutObjectRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, S3Error>> + Send + '_>> {
        Box::pin(async move {
            if !self.buckets.read().await.contains_key(&request.bucket) {
                return Err(S3Error::NoSuchBucket {
                    bucket: request.bucket,
                });
            }

            let data = collect_body(request.body).await?;
            let etag = quoted_md5(&data);

            let mut objects = self.objects.write().await;
            objects.insert(
                (request.bucket, request.key),
                ObjectEntry {
                    data,
                    etag: etag.clone(),
                    content_type: request.content_type,
                    content_encoding: None,
                    metadata: request.metadata,
                    last_modified: SystemTime::now(),
                    acl: Acl::full_control(&self.owner),
                },
            );

            Ok(etag)
        })
    }

    fn copy_object(
        &self,
        request: CopyObjectRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CopyObjectResult, S3Error>> + Send + '_>> {
        Box::pin(async move {
            let buckets = self.buckets.read().await;
            if !buckets.contains_key(&request.src_bucket) {
                return Err(S3Error::NoSuchBucket {
                    bucket: request.src_bucket,
                });
            }
            if !buckets.contains_key(&request.dst_bucket) {
                return Err(S3Error::NoSuchBucket {
                    bucket: request.dst_bucket,
                });
            }
            drop(buckets);

            let mut objects = self.objects.write().await;
            let src = objects
                .get(&(request.src_bucket, request.src_key.clone()))
                .ok_or(S3Error::NoSuchKey {
                    key: request.src_key,
                })?;

            check_copy_conditions(&request.conditions, src)?;

            let now = SystemTime::now();
            let copy = ObjectEntry {
                data: src.data.clone(),
                etag: src.etag.clone(),
                content_type: src.content_type.clone(),
                content_encoding: src.content_encoding.clone(),
                metadata: src.metadata.clone(),
                last_modified: now,
                acl: Acl::full_control(&self.owner),
            };
            let etag = copy.etag.clone();
            objects.insert((request.dst_bucket, request.dst_key), copy);

            Ok(CopyObjectResult {
                etag,
                last_modified: now,
            })
        })
    }

    fn delete_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            if !self.buckets.read().await.contains_key(&bucket) {
                return Err(S3Error::NoSuchBucket { bucket });
            }
            // Deleting a missing key succeeds.
            self.objects.write().await.remove(&(bucket, key));
            Ok(())
        })
    }

    fn delete_objects(
        &self,
        bucket: &str,
        request: DeleteRequest,
    ) -> Pin<Box<dyn Future<Output = Result<DeleteObjectsResult, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            if !self.buckets.read().await.contains_key(&bucket) {
                return Err(S3Error::NoSuchBucket { bucket });
            }
            let mut objects = self.objects.write().await;
            let mut result = DeleteObjectsResult::default();
            for object in request.objects {
                objects.remove(&(bucket.clone(), object.key.clone()));
                result.deleted.push(DeletedObject {
                    key: object.key,
                    version_id: object.version_id,
                });
            }
            Ok(result)
        })
    }

    fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        metadata: HashMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<String, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            if !self.buckets.read().await.contains_key(&bucket) {
                return Err(S3Error::NoSuchBucket { bucket });
            }
            let upload_id = uuid::Uuid::new_v4().to_string();
            self.uploads.write().await.insert(
                upload_id.clone(),
                UploadEntry {
                    bucket,
                    key,
                    metadata,
                    initiated: SystemTime::now(),
                    owner: self.owner.clone(),
                    parts: BTreeMap::new(),
                },
            );
            Ok(upload_id)
        })
    }

    fn put_object_part(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number: u32,
        _content_length: i64,
        body: ByteStream,
    ) -> Pin<Box<dyn Future<Output = Result<String, S3Error>> + Send + '_>> {
        let upload_id = upload_id.to_string();
        Box::pin(async move {
            let data = collect_body(body).await?;
            let etag = quoted_md5(&data);

            let mut uploads = self.uploads.write().await;
            let upload = uploads
                .get_mut(&upload_id)
                .ok_or(S3Error::NoSuchUpload { upload_id })?;
            upload.parts.insert(
                part_number,
                PartEntry {
                    data,
                    etag: etag.clone(),
                    last_modified: SystemTime::now(),
                },
            );
            Ok(etag)
        })
    }

    fn list_object_parts(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number_marker: u32,
        max_parts: u32,
    ) -> Pin<Box<dyn Future<Output = Result<PartListing, S3Error>> + Send + '_>> {
        let upload_id = upload_id.to_string();
        Box::pin(async move {
            let uploads = self.uploads.read().await;
            let upload = uploads
                .get(&upload_id)
                .ok_or(S3Error::NoSuchUpload { upload_id })?;

            let limit = if max_parts == 0 {
                DEFAULT_LIST_LIMIT
            } else {
                max_parts as usize
            };

            let mut parts: Vec<PartInfo> = upload
                .parts
                .range(part_number_marker + 1..)
                .map(|(number, part)| PartInfo {
                    part_number: *number,
                    last_modified: part.last_modified,
                    etag: part.etag.clone(),
                    size: part.data.len() as i64,
                })
                .collect();

            let is_truncated = parts.len() > limit;
            parts.truncate(limit);
            let next_part_number_marker = is_truncated
                .then(|| parts.last().map(|p| p.part_number))
                .flatten();

            Ok(PartListing {
                parts,
                owner: upload.owner.clone(),
                storage_class: STORAGE_CLASS.to_string(),
                next_part_number_marker,
                is_truncated,
            })
        })
    }

    fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Pin<Box<dyn Future<Output = Result<CompletedUpload, S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        let upload_id = upload_id.to_string();
        Box::pin(async move {
            let mut uploads = self.uploads.write().await;
            let upload = uploads
                .get(&upload_id)
                .ok_or(S3Error::NoSuchUpload {
                    upload_id: upload_id.clone(),
                })?;

            if parts.is_empty() {
                return Err(S3Error::InvalidPart);
            }

            // Validate the client's part list against what was stored and
            // assemble in the order supplied.
            let mut data = BytesMut::new();
            let mut digests = Vec::new();
            for part in &parts {
                let stored = upload.parts.get(&part.part_number).ok_or(S3Error::InvalidPart)?;
                if stored.etag.trim_matches('"') != part.etag.trim_matches('"') {
                    return Err(S3Error::InvalidPart);
                }
                data.extend_from_slice(&stored.data);
                digests
                    .extend(hex::decode(stored.etag.trim_matches('"')).map_err(anyhow::Error::from)?);
            }

            let etag = format!("\"{}-{}\"", hex::encode(Md5::digest(&digests)), parts.len());
            let metadata = upload.metadata.clone();
            uploads.remove(&upload_id);
            drop(uploads);

            let mut objects = self.objects.write().await;
            objects.insert(
                (bucket.clone(), key.clone()),
                ObjectEntry {
                    data: data.freeze(),
                    etag: etag.clone(),
                    content_type: None,
                    content_encoding: None,
                    metadata,
                    last_modified: SystemTime::now(),
                    acl: Acl::full_control(&self.owner),
                },
            );

            Ok(CompletedUpload {
                location: format!("/{bucket}/{key}"),
                bucket,
                key,
                etag,
            })
        })
    }

    fn abort_multipart_upload(
        &self,
        request: AbortMultipartUploadRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        Box::pin(async move {
            let mut uploads = self.uploads.write().await;
            uploads
                .remove(&request.upload_id)
                .ok_or(S3Error::NoSuchUpload {
                    upload_id: request.upload_id,
                })?;
            Ok(())
        })
    }

    fn restore_object(
        &self,
        bucket: &str,
        key: &str,
        _request: RestoreRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), S3Error>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            // Nothing is archived in memory; restoring an existing object
            // is a no-op.
            let objects = self.objects.read().await;
            if objects.contains_key(&(bucket, key.clone())) {
                Ok(())
            } else {
                Err(S3Error::NoSuchKey { key })
            }
        })
    }
}

impl MemoryBackend {
    async fn list_common(&self, request: ListObjectsRequest) -> Result<ObjectListing, S3Error> {
        if !self.buckets.read().await.contains_key(&request.bucket) {
            return Err(S3Error::NoSuchBucket {
                bucket: request.bucket,
            });
        }

        let limit = if request.max_keys <= 0 {
            DEFAULT_LIST_LIMIT
        } else {
            request.max_keys as usize
        };

        let objects = self.objects.read().await;
        let mut listing = ObjectListing::default();
        let mut seen_prefixes: Vec<String> = Vec::new();
        let mut count = 0usize;

        for ((bucket, key), entry) in objects.iter() {
            if *bucket != request.bucket || !key.starts_with(&request.prefix) {
                continue;
            }
            if !request.marker.is_empty() && key.as_str() <= request.marker.as_str() {
                continue;
            }

            // With a delimiter, keys that continue past it roll up into a
            // single CommonPrefixes entry.
            if !request.delimiter.is_empty() {
                let rest = &key[request.prefix.len()..];
                if let Some(idx) = rest.find(&request.delimiter) {
                    let prefix =
                        key[..request.prefix.len() + idx + request.delimiter.len()].to_string();
                    if seen_prefixes.contains(&prefix) {
                        continue;
                    }
                    if count == limit {
                        listing.is_truncated = true;
                        listing.next_marker = Some(prefix);
                        break;
                    }
                    seen_prefixes.push(prefix);
                    count += 1;
                    continue;
                }
            }

            if count == limit {
                listing.is_truncated = true;
                listing.next_marker = Some(key.clone());
                break;
            }
            listing.objects.push(ObjectSummary {
                key: key.clone(),
                last_modified: entry.last_modified,
                etag: entry.etag.clone(),
                size: entry.data.len() as i64,
                storage_class: STORAGE_CLASS.to_string(),
            });
            count += 1;
        }

        listing.common_prefixes = seen_prefixes;
        // The next marker is the last entry actually returned.
        if listing.is_truncated {
            let last_key = listing.objects.last().map(|o| o.key.clone());
            let last_prefix = listing.common_prefixes.last().cloned();
            listing.next_marker = match (last_key, last_prefix) {
                (Some(k), Some(p)) => Some(k.max(p)),
                (Some(k), None) => Some(k),
                (None, p) => p,
            };
        }

        Ok(listing)
    }
}
