//! Typed request and response values for the backend capability surface.
//!
//! These are the wire-independent shapes the dispatcher hands to a
//! [`Backend`](super::Backend) and renders back out as XML or headers.

use std::collections::HashMap;
use std::time::SystemTime;

use super::ByteStream;
use crate::errors::S3Error;

const ALL_USERS_GROUP: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
const AUTHENTICATED_USERS_GROUP: &str =
    "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

// ── Ownership and ACLs ──────────────────────────────────────────────

/// Canonical owner identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    /// Canonical user ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
}

impl Owner {
    /// Owner whose display name equals its ID.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Owner {
            display_name: id.clone(),
            id,
        }
    }
}

/// An access control list: an owner plus a set of grants.
#[derive(Debug, Clone, Default)]
pub struct Acl {
    /// Owner of the resource.
    pub owner: Owner,
    /// List of access grants.
    pub grants: Vec<AclGrant>,
}

impl Acl {
    /// Default ACL: the owner holds FULL_CONTROL.
    pub fn full_control(owner: &Owner) -> Self {
        Acl {
            owner: owner.clone(),
            grants: vec![AclGrant {
                grantee: AclGrantee::CanonicalUser {
                    id: owner.id.clone(),
                    display_name: owner.display_name.clone(),
                },
                permission: "FULL_CONTROL".to_string(),
            }],
        }
    }

    /// Materialize an ACL from a canned token or explicit grant headers.
    ///
    /// The owner always retains FULL_CONTROL.  An unknown canned token
    /// is an `InvalidArgument`.
    pub fn from_source(owner: &Owner, source: &AclSource) -> Result<Acl, S3Error> {
        let mut acl = Acl::full_control(owner);

        match source {
            AclSource::Canned(token) => match token.as_str() {
                "private" => {}
                "public-read" => {
                    acl.grants.push(AclGrant::group(ALL_USERS_GROUP, "READ"));
                }
                "public-read-write" => {
                    acl.grants.push(AclGrant::group(ALL_USERS_GROUP, "READ"));
                    acl.grants.push(AclGrant::group(ALL_USERS_GROUP, "WRITE"));
                }
                "authenticated-read" => {
                    acl.grants
                        .push(AclGrant::group(AUTHENTICATED_USERS_GROUP, "READ"));
                }
                other => {
                    return Err(S3Error::InvalidArgument {
                        message: format!("Invalid canned ACL: {other}"),
                    });
                }
            },
            AclSource::Grants(set) => {
                let headers = [
                    (&set.full_control, "FULL_CONTROL"),
                    (&set.read, "READ"),
                    (&set.read_acp, "READ_ACP"),
                    (&set.write, "WRITE"),
                    (&set.write_acp, "WRITE_ACP"),
                ];
                for (value, permission) in headers {
                    let Some(value) = value else { continue };
                    for grantee in value.split(',') {
                        if let Some(grant) = AclGrant::parse_grantee(grantee, permission) {
                            acl.grants.push(grant);
                        }
                    }
                }
            }
        }

        Ok(acl)
    }
}

/// A single ACL grant entry.
#[derive(Debug, Clone)]
pub struct AclGrant {
    /// The grantee receiving the permission.
    pub grantee: AclGrantee,
    /// The permission being granted.
    pub permission: String,
}

impl AclGrant {
    fn group(uri: &str, permission: &str) -> Self {
        AclGrant {
            grantee: AclGrantee::Group {
                uri: uri.to_string(),
            },
            permission: permission.to_string(),
        }
    }

    /// Parse a single grantee expression like `id="abc123"` or
    /// `uri="http://acs.amazonaws.com/groups/global/AllUsers"`.
    fn parse_grantee(grantee: &str, permission: &str) -> Option<AclGrant> {
        let grantee = grantee.trim();

        if let Some(rest) = grantee.strip_prefix("id=") {
            let id = rest.trim_matches('"').trim_matches('\'').to_string();
            Some(AclGrant {
                grantee: AclGrantee::CanonicalUser {
                    display_name: id.clone(),
                    id,
                },
                permission: permission.to_string(),
            })
        } else if let Some(rest) = grantee.strip_prefix("uri=") {
            let uri = rest.trim_matches('"').trim_matches('\'').to_string();
            Some(AclGrant {
                grantee: AclGrantee::Group { uri },
                permission: permission.to_string(),
            })
        } else {
            None
        }
    }
}

/// A grantee in an ACL grant.
#[derive(Debug, Clone)]
pub enum AclGrantee {
    /// A canonical user grantee.
    CanonicalUser { id: String, display_name: String },
    /// A group grantee.
    Group { uri: String },
}

/// Explicit grant headers of a PutBucketAcl / PutObjectAcl request.
///
/// Each field carries the verbatim value of the matching
/// `x-amz-grant-*` header.
#[derive(Debug, Clone, Default)]
pub struct GrantSet {
    pub full_control: Option<String>,
    pub read: Option<String>,
    pub read_acp: Option<String>,
    pub write: Option<String>,
    pub write_acp: Option<String>,
}

impl GrantSet {
    /// Whether any grant header carried a value.
    ///
    /// Detection concatenates the five values; an empty-valued header
    /// does not count as a grant.
    pub fn is_present(&self) -> bool {
        let concatenated: String = [
            &self.full_control,
            &self.read,
            &self.read_acp,
            &self.write,
            &self.write_acp,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();
        !concatenated.is_empty()
    }
}

/// Where a requested ACL comes from.
///
/// A request carries either a canned ACL token or explicit grant
/// headers, never both; the dispatcher rejects the combination before
/// a backend ever sees it.
#[derive(Debug, Clone)]
pub enum AclSource {
    /// A canned ACL token such as `private` or `public-read`.
    Canned(String),
    /// Explicit `x-amz-grant-*` headers.
    Grants(GrantSet),
}

/// PutBucketAcl input.
#[derive(Debug, Clone)]
pub struct PutBucketAclRequest {
    pub bucket: String,
    /// The authenticated principal, recorded as the ACL owner.
    pub owner: Owner,
    pub source: AclSource,
}

/// PutObjectAcl input.
#[derive(Debug, Clone)]
pub struct PutObjectAclRequest {
    pub bucket: String,
    pub key: String,
    pub source: AclSource,
}

// ── Buckets ─────────────────────────────────────────────────────────

/// A single bucket in a ListBuckets result.
#[derive(Debug, Clone)]
pub struct BucketInfo {
    pub name: String,
    pub creation_date: SystemTime,
}

/// Result of ListBuckets.
#[derive(Debug, Clone)]
pub struct BucketList {
    pub owner: Owner,
    pub buckets: Vec<BucketInfo>,
}

// ── Object listings ─────────────────────────────────────────────────

/// Inputs shared by the v1 and v2 list operations.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: String,
    /// v1 marker or v2 continuation token.
    pub marker: String,
    pub delimiter: String,
    pub max_keys: i32,
}

/// A single object in a listing.
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: SystemTime,
    /// Quoted ETag.
    pub etag: String,
    pub size: i64,
    pub storage_class: String,
}

/// Result of ListObjects / ListObjectsV2.
#[derive(Debug, Clone, Default)]
pub struct ObjectListing {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
    /// v1 NextMarker / v2 NextContinuationToken when truncated.
    pub next_marker: Option<String>,
    pub is_truncated: bool,
}

// ── Objects ─────────────────────────────────────────────────────────

/// Metadata of an object as returned by GetObject / HeadObject.
///
/// The optional fields omit nothing at the type level; the header
/// codec decides how absence appears on the wire.
#[derive(Debug, Clone, Default)]
pub struct ObjectInfo {
    /// User metadata, keyed by the lowercased `x-amz-meta-` suffix.
    pub metadata: HashMap<String, String>,
    pub content_length: i64,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    /// Quoted ETag.
    pub etag: Option<String>,
    pub last_modified: Option<SystemTime>,
}

/// GetObject input.
#[derive(Debug, Clone)]
pub struct GetObjectRequest {
    pub bucket: String,
    pub key: String,
    /// Verbatim `Range` header, if any; interpretation belongs to the
    /// backend.
    pub range: Option<String>,
}

/// GetObject output: metadata plus the streamed body.
pub struct GetObjectResult {
    pub info: ObjectInfo,
    pub body: ByteStream,
}

/// PutObject input.  The body streams through the dispatcher without
/// buffering.
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub content_length: i64,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
    pub body: ByteStream,
}

/// Conditional-copy preconditions, forwarded verbatim from the
/// `X-Amz-Copy-Source-If-*` headers for the backend to evaluate.
#[derive(Debug, Clone, Default)]
pub struct CopyConditions {
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub if_unmodified_since: Option<String>,
}

/// CopyObject input.
#[derive(Debug, Clone)]
pub struct CopyObjectRequest {
    pub src_bucket: String,
    pub src_key: String,
    pub dst_bucket: String,
    pub dst_key: String,
    pub conditions: CopyConditions,
}

/// CopyObject output.
#[derive(Debug, Clone)]
pub struct CopyObjectResult {
    /// Quoted ETag of the new object.
    pub etag: String,
    pub last_modified: SystemTime,
}

/// Attributes returned by GetObjectAttributes.
#[derive(Debug, Clone, Default)]
pub struct ObjectAttributes {
    pub etag: Option<String>,
    pub storage_class: Option<String>,
    pub object_size: Option<i64>,
    pub last_modified: Option<SystemTime>,
}

// ── Batch delete ────────────────────────────────────────────────────

/// One entry of a `<Delete>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentifier {
    pub key: String,
    pub version_id: Option<String>,
}

/// Parsed `<Delete>` document.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub objects: Vec<ObjectIdentifier>,
    pub quiet: bool,
}

/// A successfully deleted key.
#[derive(Debug, Clone)]
pub struct DeletedObject {
    pub key: String,
    pub version_id: Option<String>,
}

/// A per-key failure in a batch delete.
#[derive(Debug, Clone)]
pub struct DeleteError {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// Result of DeleteObjects.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectsResult {
    pub deleted: Vec<DeletedObject>,
    pub errors: Vec<DeleteError>,
}

// ── Multipart uploads ───────────────────────────────────────────────

/// An in-progress upload in a ListMultipartUploads result.
#[derive(Debug, Clone)]
pub struct UploadInfo {
    pub key: String,
    pub upload_id: String,
    pub initiated: SystemTime,
    pub storage_class: String,
    pub owner: Owner,
}

/// Result of ListMultipartUploads.
#[derive(Debug, Clone)]
pub struct UploadListing {
    pub uploads: Vec<UploadInfo>,
    pub max_uploads: i32,
    pub is_truncated: bool,
}

/// A stored part in a ListObjectParts result.
#[derive(Debug, Clone)]
pub struct PartInfo {
    /// 1-based, client-chosen, not necessarily contiguous.
    pub part_number: u32,
    pub last_modified: SystemTime,
    /// Quoted ETag.
    pub etag: String,
    pub size: i64,
}

/// Result of ListObjectParts.
#[derive(Debug, Clone)]
pub struct PartListing {
    pub parts: Vec<PartInfo>,
    pub owner: Owner,
    pub storage_class: String,
    pub next_part_number_marker: Option<u32>,
    pub is_truncated: bool,
}

/// One `<Part>` of a CompleteMultipartUpload document, in the order the
/// client supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// Result of CompleteMultipartUpload.
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    pub location: String,
    pub bucket: String,
    pub key: String,
    /// Quoted ETag of the assembled object.
    pub etag: String,
}

/// AbortMultipartUpload input.
#[derive(Debug, Clone)]
pub struct AbortMultipartUploadRequest {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    pub expected_bucket_owner: Option<String>,
    pub request_payer: Option<String>,
}

// ── Restore ─────────────────────────────────────────────────────────

/// Parsed `<RestoreRequest>` document.
#[derive(Debug, Clone, Default)]
pub struct RestoreRequest {
    pub days: Option<u32>,
    pub tier: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_acl_public_read() {
        let owner = Owner::new("alice");
        let acl =
            Acl::from_source(&owner, &AclSource::Canned("public-read".to_string())).unwrap();
        assert_eq!(acl.grants.len(), 2);
        assert!(matches!(
            &acl.grants[1].grantee,
            AclGrantee::Group { uri } if uri.ends_with("AllUsers")
        ));
        assert_eq!(acl.grants[1].permission, "READ");
    }

    #[test]
    fn test_unknown_canned_acl_rejected() {
        let owner = Owner::new("alice");
        let err =
            Acl::from_source(&owner, &AclSource::Canned("very-public".to_string())).unwrap_err();
        assert!(matches!(err, S3Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_grant_headers_parsed() {
        let owner = Owner::new("alice");
        let source = AclSource::Grants(GrantSet {
            read: Some("id=\"bob\", uri=\"http://acs.amazonaws.com/groups/global/AllUsers\"".to_string()),
            ..GrantSet::default()
        });
        let acl = Acl::from_source(&owner, &source).unwrap();
        // Owner FULL_CONTROL plus the two READ grants.
        assert_eq!(acl.grants.len(), 3);
        assert!(matches!(
            &acl.grants[1].grantee,
            AclGrantee::CanonicalUser { id, .. } if id == "bob"
        ));
        assert_eq!(acl.grants[2].permission, "READ");
    }
}
