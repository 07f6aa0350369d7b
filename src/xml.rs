//! S3 XML marshalling.
//!
//! All S3 API responses are XML-encoded and every response document has a
//! fixed root element and field-to-element mapping.  This module renders
//! them with `quick-xml`, and parses the three inbound request bodies
//! (`Delete`, `CompleteMultipartUpload`, `RestoreRequest`) with a strict
//! event loop.  Any reader error maps to [`S3Error::MalformedXml`].

use std::io::Cursor;
use std::time::SystemTime;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::backend::types::{
    Acl, AclGrantee, CompletedPart, DeleteError, DeleteRequest, DeletedObject, ObjectAttributes,
    ObjectIdentifier, ObjectListing, Owner, PartListing, RestoreRequest, UploadListing,
};
use crate::errors::S3Error;

const S3_XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

// ── Error response ──────────────────────────────────────────────────

/// Render an S3 `<Error>` XML document.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>NoSuchBucket</Code>
///   <Message>The specified bucket does not exist</Message>
///   <Resource>/mybucket</Resource>
///   <RequestId>abcd-1234</RequestId>
/// </Error>
/// ```
pub fn render_error(code: &str, message: &str, resource: &str, request_id: &str) -> String {
    let mut writer = start_document();

    write_simple_element_group(
        &mut writer,
        "Error",
        &[
            ("Code", code),
            ("Message", message),
            ("Resource", resource),
            ("RequestId", request_id),
        ],
    );

    finish_document(writer)
}

// ── ListAllMyBucketsResult ──────────────────────────────────────────

/// Render `<ListAllMyBucketsResult>` for `GET /`.
///
/// `buckets` is a list of `(name, creation_date)` pairs; the creation
/// date is already ISO-8601 formatted by the caller.
pub fn render_list_buckets_result(owner: &Owner, buckets: &[(&str, String)]) -> String {
    let mut writer = start_document();

    start_root(&mut writer, "ListAllMyBucketsResult");

    write_simple_element_group(
        &mut writer,
        "Owner",
        &[("ID", &owner.id), ("DisplayName", &owner.display_name)],
    );

    write_start(&mut writer, "Buckets");
    for (name, date) in buckets {
        write_simple_element_group(
            &mut writer,
            "Bucket",
            &[("Name", name), ("CreationDate", date)],
        );
    }
    write_end(&mut writer, "Buckets");

    write_end(&mut writer, "ListAllMyBucketsResult");
    finish_document(writer)
}

// ── ListBucketResult ────────────────────────────────────────────────

/// Render `<ListBucketResult>` for ListObjectsV2.
pub fn render_list_objects_v2_result(
    bucket: &str,
    prefix: &str,
    delimiter: &str,
    max_keys: i32,
    continuation_token: Option<&str>,
    listing: &ObjectListing,
) -> String {
    let mut writer = start_document();

    start_root(&mut writer, "ListBucketResult");

    let key_count = listing.objects.len() + listing.common_prefixes.len();

    write_text_element(&mut writer, "Name", bucket);
    write_text_element(&mut writer, "Prefix", prefix);
    if !delimiter.is_empty() {
        write_text_element(&mut writer, "Delimiter", delimiter);
    }
    write_text_element(&mut writer, "MaxKeys", &max_keys.to_string());
    write_text_element(&mut writer, "KeyCount", &key_count.to_string());
    write_bool_element(&mut writer, "IsTruncated", listing.is_truncated);

    if let Some(token) = continuation_token {
        write_text_element(&mut writer, "ContinuationToken", token);
    }
    if let Some(token) = listing.next_marker.as_deref() {
        write_text_element(&mut writer, "NextContinuationToken", token);
    }

    write_object_entries(&mut writer, listing);

    write_end(&mut writer, "ListBucketResult");
    finish_document(writer)
}

/// Render `<ListBucketResult>` for the v1 ListObjects API.
pub fn render_list_objects_result(
    bucket: &str,
    prefix: &str,
    delimiter: &str,
    marker: &str,
    max_keys: i32,
    listing: &ObjectListing,
) -> String {
    let mut writer = start_document();

    start_root(&mut writer, "ListBucketResult");

    write_text_element(&mut writer, "Name", bucket);
    write_text_element(&mut writer, "Prefix", prefix);
    write_text_element(&mut writer, "Marker", marker);
    if !delimiter.is_empty() {
        write_text_element(&mut writer, "Delimiter", delimiter);
    }
    write_text_element(&mut writer, "MaxKeys", &max_keys.to_string());
    write_bool_element(&mut writer, "IsTruncated", listing.is_truncated);
    if let Some(next) = listing.next_marker.as_deref() {
        write_text_element(&mut writer, "NextMarker", next);
    }

    write_object_entries(&mut writer, listing);

    write_end(&mut writer, "ListBucketResult");
    finish_document(writer)
}

fn write_object_entries(writer: &mut Writer<Cursor<Vec<u8>>>, listing: &ObjectListing) {
    for obj in &listing.objects {
        write_start(writer, "Contents");
        write_text_element(writer, "Key", &obj.key);
        write_text_element(writer, "LastModified", &iso8601(obj.last_modified));
        write_text_element(writer, "ETag", &obj.etag);
        write_text_element(writer, "Size", &obj.size.to_string());
        write_text_element(writer, "StorageClass", &obj.storage_class);
        write_end(writer, "Contents");
    }

    for cp in &listing.common_prefixes {
        write_start(writer, "CommonPrefixes");
        write_text_element(writer, "Prefix", cp);
        write_end(writer, "CommonPrefixes");
    }
}

// ── DeleteResult ────────────────────────────────────────────────────

/// Render `<DeleteResult>` for batch DeleteObjects.
///
/// In quiet mode only the errors are listed.
pub fn render_delete_result(
    deleted: &[DeletedObject],
    errors: &[DeleteError],
    quiet: bool,
) -> String {
    let mut writer = start_document();

    start_root(&mut writer, "DeleteResult");

    if !quiet {
        for entry in deleted {
            write_start(&mut writer, "Deleted");
            write_text_element(&mut writer, "Key", &entry.key);
            if let Some(version) = entry.version_id.as_deref() {
                write_text_element(&mut writer, "VersionId", version);
            }
            write_end(&mut writer, "Deleted");
        }
    }

    for entry in errors {
        write_start(&mut writer, "Error");
        write_text_element(&mut writer, "Key", &entry.key);
        write_text_element(&mut writer, "Code", &entry.code);
        write_text_element(&mut writer, "Message", &entry.message);
        write_end(&mut writer, "Error");
    }

    write_end(&mut writer, "DeleteResult");
    finish_document(writer)
}

// ── CopyObjectResult ────────────────────────────────────────────────

/// Render `<CopyObjectResult>` returned by `PUT` with `x-amz-copy-source`.
pub fn render_copy_object_result(etag: &str, last_modified: SystemTime) -> String {
    let mut writer = start_document();

    write_simple_element_group(
        &mut writer,
        "CopyObjectResult",
        &[("ETag", etag), ("LastModified", &iso8601(last_modified))],
    );

    finish_document(writer)
}

// ── Multipart documents ─────────────────────────────────────────────

/// Render `<InitiateMultipartUploadResult>`.
pub fn render_initiate_multipart_upload_result(bucket: &str, key: &str, upload_id: &str) -> String {
    let mut writer = start_document();

    write_simple_element_group(
        &mut writer,
        "InitiateMultipartUploadResult",
        &[("Bucket", bucket), ("Key", key), ("UploadId", upload_id)],
    );

    finish_document(writer)
}

/// Render `<CompleteMultipartUploadResult>`.
pub fn render_complete_multipart_upload_result(
    location: &str,
    bucket: &str,
    key: &str,
    etag: &str,
) -> String {
    let mut writer = start_document();

    write_simple_element_group(
        &mut writer,
        "CompleteMultipartUploadResult",
        &[
            ("Location", location),
            ("Bucket", bucket),
            ("Key", key),
            ("ETag", etag),
        ],
    );

    finish_document(writer)
}

/// Render `<ListPartsResult>` for ListObjectParts.
pub fn render_list_parts_result(
    bucket: &str,
    key: &str,
    upload_id: &str,
    part_number_marker: u32,
    max_parts: u32,
    listing: &PartListing,
) -> String {
    let mut writer = start_document();

    start_root(&mut writer, "ListPartsResult");

    write_text_element(&mut writer, "Bucket", bucket);
    write_text_element(&mut writer, "Key", key);
    write_text_element(&mut writer, "UploadId", upload_id);

    write_owner_pair(&mut writer, &listing.owner);

    write_text_element(&mut writer, "StorageClass", &listing.storage_class);
    write_text_element(
        &mut writer,
        "PartNumberMarker",
        &part_number_marker.to_string(),
    );
    if let Some(next) = listing.next_part_number_marker {
        write_text_element(&mut writer, "NextPartNumberMarker", &next.to_string());
    }
    write_text_element(&mut writer, "MaxParts", &max_parts.to_string());
    write_bool_element(&mut writer, "IsTruncated", listing.is_truncated);

    for part in &listing.parts {
        write_start(&mut writer, "Part");
        write_text_element(&mut writer, "PartNumber", &part.part_number.to_string());
        write_text_element(&mut writer, "LastModified", &iso8601(part.last_modified));
        write_text_element(&mut writer, "ETag", &part.etag);
        write_text_element(&mut writer, "Size", &part.size.to_string());
        write_end(&mut writer, "Part");
    }

    write_end(&mut writer, "ListPartsResult");
    finish_document(writer)
}

/// Render `<ListMultipartUploadsResult>`.
pub fn render_list_multipart_uploads_result(bucket: &str, listing: &UploadListing) -> String {
    let mut writer = start_document();

    start_root(&mut writer, "ListMultipartUploadsResult");

    write_text_element(&mut writer, "Bucket", bucket);
    write_text_element(&mut writer, "KeyMarker", "");
    write_text_element(&mut writer, "UploadIdMarker", "");
    write_text_element(&mut writer, "MaxUploads", &listing.max_uploads.to_string());
    write_bool_element(&mut writer, "IsTruncated", listing.is_truncated);

    for upload in &listing.uploads {
        write_start(&mut writer, "Upload");
        write_text_element(&mut writer, "Key", &upload.key);
        write_text_element(&mut writer, "UploadId", &upload.upload_id);

        write_simple_element_group(
            &mut writer,
            "Initiator",
            &[
                ("ID", &upload.owner.id),
                ("DisplayName", &upload.owner.display_name),
            ],
        );
        write_owner_pair(&mut writer, &upload.owner);

        write_text_element(&mut writer, "StorageClass", &upload.storage_class);
        write_text_element(&mut writer, "Initiated", &iso8601(upload.initiated));
        write_end(&mut writer, "Upload");
    }

    write_end(&mut writer, "ListMultipartUploadsResult");
    finish_document(writer)
}

// ── AccessControlPolicy ─────────────────────────────────────────────

/// Render `<AccessControlPolicy>` for GetBucketAcl / GetObjectAcl.
pub fn render_access_control_policy(acl: &Acl) -> String {
    let mut writer = start_document();

    start_root(&mut writer, "AccessControlPolicy");

    write_owner_pair(&mut writer, &acl.owner);

    write_start(&mut writer, "AccessControlList");
    for grant in &acl.grants {
        write_start(&mut writer, "Grant");

        match &grant.grantee {
            AclGrantee::CanonicalUser { id, display_name } => {
                let mut grantee = BytesStart::new("Grantee");
                grantee.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
                grantee.push_attribute(("xsi:type", "CanonicalUser"));
                writer
                    .write_event(Event::Start(grantee))
                    .expect("start Grantee");
                write_text_element(&mut writer, "ID", id);
                write_text_element(&mut writer, "DisplayName", display_name);
                write_end(&mut writer, "Grantee");
            }
            AclGrantee::Group { uri } => {
                let mut grantee = BytesStart::new("Grantee");
                grantee.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
                grantee.push_attribute(("xsi:type", "Group"));
                writer
                    .write_event(Event::Start(grantee))
                    .expect("start Grantee");
                write_text_element(&mut writer, "URI", uri);
                write_end(&mut writer, "Grantee");
            }
        }

        write_text_element(&mut writer, "Permission", &grant.permission);
        write_end(&mut writer, "Grant");
    }
    write_end(&mut writer, "AccessControlList");

    write_end(&mut writer, "AccessControlPolicy");
    finish_document(writer)
}

// ── GetObjectAttributesResponse ─────────────────────────────────────

/// Render `<GetObjectAttributesResponse>` with only the attributes the
/// caller asked for (the `X-Amz-Object-Attributes` header, split on `,`).
pub fn render_object_attributes(attrs: &ObjectAttributes, requested: &[String]) -> String {
    let wants = |name: &str| requested.iter().any(|r| r.trim().eq_ignore_ascii_case(name));

    let mut writer = start_document();

    start_root(&mut writer, "GetObjectAttributesResponse");

    if wants("ETag") {
        if let Some(etag) = attrs.etag.as_deref() {
            // The attributes document carries the unquoted ETag.
            write_text_element(&mut writer, "ETag", etag.trim_matches('"'));
        }
    }
    if wants("StorageClass") {
        if let Some(class) = attrs.storage_class.as_deref() {
            write_text_element(&mut writer, "StorageClass", class);
        }
    }
    if wants("ObjectSize") {
        if let Some(size) = attrs.object_size {
            write_text_element(&mut writer, "ObjectSize", &size.to_string());
        }
    }

    write_end(&mut writer, "GetObjectAttributesResponse");
    finish_document(writer)
}

// ── Inbound parsers ─────────────────────────────────────────────────

/// Parse the `<Delete>` body of a DeleteObjects request.
pub fn parse_delete_document(body: &[u8]) -> Result<DeleteRequest, S3Error> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);

    let mut objects = Vec::new();
    let mut quiet = false;
    let mut current_tag = String::new();
    let mut in_object = false;
    let mut key: Option<String> = None;
    let mut version_id: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "Object" {
                    in_object = true;
                    key = None;
                    version_id = None;
                }
                current_tag = tag;
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "Object" {
                    in_object = false;
                    let key = key.take().ok_or(S3Error::MalformedXml)?;
                    objects.push(ObjectIdentifier {
                        key,
                        version_id: version_id.take(),
                    });
                }
                current_tag.clear();
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|_| S3Error::MalformedXml)?
                    .to_string();
                match (in_object, current_tag.as_str()) {
                    (true, "Key") => key = Some(text),
                    (true, "VersionId") => version_id = Some(text),
                    (false, "Quiet") => quiet = text == "true",
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return Err(S3Error::MalformedXml),
            _ => {}
        }
        buf.clear();
    }

    if objects.is_empty() {
        return Err(S3Error::MalformedXml);
    }

    Ok(DeleteRequest { objects, quiet })
}

/// Parse the `<CompleteMultipartUpload>` part list.
///
/// The parts are returned in document order; the part numbers are
/// client-chosen and need not be contiguous.
pub fn parse_complete_multipart_upload(body: &[u8]) -> Result<Vec<CompletedPart>, S3Error> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);

    let mut parts = Vec::new();
    let mut current_tag = String::new();
    let mut in_part = false;
    let mut part_number: Option<u32> = None;
    let mut etag: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "Part" {
                    in_part = true;
                    part_number = None;
                    etag = None;
                }
                current_tag = tag;
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "Part" {
                    in_part = false;
                    let part_number = part_number.take().ok_or(S3Error::MalformedXml)?;
                    let etag = etag.take().ok_or(S3Error::MalformedXml)?;
                    parts.push(CompletedPart { part_number, etag });
                }
                current_tag.clear();
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|_| S3Error::MalformedXml)?
                    .to_string();
                if in_part {
                    match current_tag.as_str() {
                        "PartNumber" => {
                            part_number =
                                Some(text.parse::<u32>().map_err(|_| S3Error::MalformedXml)?);
                        }
                        "ETag" => etag = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return Err(S3Error::MalformedXml),
            _ => {}
        }
        buf.clear();
    }

    if parts.is_empty() {
        return Err(S3Error::MalformedXml);
    }

    Ok(parts)
}

/// Parse the `<RestoreRequest>` body of a RestoreObject request.
pub fn parse_restore_request(body: &[u8]) -> Result<RestoreRequest, S3Error> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);

    let mut seen_root = false;
    let mut days: Option<u32> = None;
    let mut tier: Option<String> = None;
    let mut current_tag = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "RestoreRequest" {
                    seen_root = true;
                }
                current_tag = tag;
            }
            Ok(Event::End(_)) => current_tag.clear(),
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|_| S3Error::MalformedXml)?
                    .to_string();
                match current_tag.as_str() {
                    "Days" => {
                        days = Some(text.parse::<u32>().map_err(|_| S3Error::MalformedXml)?);
                    }
                    "Tier" => tier = Some(text),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return Err(S3Error::MalformedXml),
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(S3Error::MalformedXml);
    }

    Ok(RestoreRequest { days, tier })
}

// ── Time formatting ─────────────────────────────────────────────────

/// Format a `SystemTime` as an ISO-8601 timestamp with millisecond
/// precision, the shape S3 uses inside XML documents.
pub fn iso8601(t: SystemTime) -> String {
    let since_epoch = t
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = since_epoch.as_secs();
    let millis = since_epoch.subsec_millis();

    let days = secs / 86400;
    let day_secs = secs % 86400;
    let hours = day_secs / 3600;
    let minutes = (day_secs % 3600) / 60;
    let seconds = day_secs % 60;

    let (year, month, day) = days_to_ymd(days);

    format!("{year:04}-{month:02}-{day:02}T{hours:02}:{minutes:02}:{seconds:02}.{millis:03}Z")
}

/// Convert days since Unix epoch to (year, month, day).
fn days_to_ymd(days: u64) -> (i32, u32, u32) {
    let z = days as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if m <= 2 { y + 1 } else { y };
    (year as i32, m as u32, d as u32)
}

// ── Writer helpers ──────────────────────────────────────────────────

fn start_document() -> Writer<Cursor<Vec<u8>>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .expect("xml decl");
    writer
}

fn finish_document(writer: Writer<Cursor<Vec<u8>>>) -> String {
    String::from_utf8(writer.into_inner().into_inner()).expect("valid utf-8")
}

/// Open the root element with the S3 namespace attribute.
fn start_root(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str) {
    let root = BytesStart::new(tag).with_attributes([("xmlns", S3_XMLNS)]);
    writer.write_event(Event::Start(root)).expect("start root");
}

fn write_start(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str) {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .expect("start tag");
}

fn write_end(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str) {
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .expect("end tag");
}

/// Write a `<tag>text</tag>` element.
fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) {
    write_start(writer, tag);
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .expect("text");
    write_end(writer, tag);
}

fn write_bool_element(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, value: bool) {
    write_text_element(writer, tag, if value { "true" } else { "false" });
}

fn write_owner_pair(writer: &mut Writer<Cursor<Vec<u8>>>, owner: &Owner) {
    write_simple_element_group(
        writer,
        "Owner",
        &[("ID", &owner.id), ("DisplayName", &owner.display_name)],
    );
}

/// Write a parent element containing a flat list of child text elements.
fn write_simple_element_group(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    parent: &str,
    children: &[(&str, &str)],
) {
    write_start(writer, parent);
    for (tag, value) in children {
        write_text_element(writer, tag, value);
    }
    write_end(writer, parent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::ObjectSummary;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_render_error_document() {
        let doc = render_error("NoSuchBucket", "The specified bucket does not exist", "", "REQ1");
        assert_eq!(
            doc,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Error><Code>NoSuchBucket</Code>\
             <Message>The specified bucket does not exist</Message>\
             <Resource></Resource><RequestId>REQ1</RequestId></Error>"
        );
    }

    #[test]
    fn test_render_list_buckets() {
        let owner = Owner {
            id: "owner1".to_string(),
            display_name: "owner1".to_string(),
        };
        let doc =
            render_list_buckets_result(&owner, &[("alpha", "2026-01-01T00:00:00.000Z".to_string())]);
        assert!(doc.contains("<ListAllMyBucketsResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">"));
        assert!(doc.contains("<Name>alpha</Name>"));
        assert!(doc.contains("<CreationDate>2026-01-01T00:00:00.000Z</CreationDate>"));
    }

    fn sample_listing() -> ObjectListing {
        ObjectListing {
            objects: vec![ObjectSummary {
                key: "photos/cat.png".to_string(),
                last_modified: UNIX_EPOCH + Duration::from_secs(1_600_000_000),
                etag: "\"abc\"".to_string(),
                size: 42,
                storage_class: "STANDARD".to_string(),
            }],
            common_prefixes: vec!["photos/raw/".to_string()],
            next_marker: None,
            is_truncated: false,
        }
    }

    #[test]
    fn test_render_list_objects_v2() {
        let doc = render_list_objects_v2_result("b1", "photos/", "/", 100, None, &sample_listing());
        assert!(doc.contains("<Name>b1</Name>"));
        assert!(doc.contains("<KeyCount>2</KeyCount>"));
        assert!(doc.contains("<Key>photos/cat.png</Key>"));
        assert!(doc.contains("<CommonPrefixes><Prefix>photos/raw/</Prefix></CommonPrefixes>"));
        assert!(doc.contains("<IsTruncated>false</IsTruncated>"));
    }

    #[test]
    fn test_render_list_objects_v1_has_marker() {
        let doc = render_list_objects_result("b1", "", "", "after-this", 1000, &sample_listing());
        assert!(doc.contains("<Marker>after-this</Marker>"));
        assert!(!doc.contains("KeyCount"));
    }

    #[test]
    fn test_parse_delete_document() {
        let body = br#"<Delete>
            <Quiet>true</Quiet>
            <Object><Key>a.txt</Key></Object>
            <Object><Key>b.txt</Key><VersionId>v7</VersionId></Object>
        </Delete>"#;
        let req = parse_delete_document(body).unwrap();
        assert!(req.quiet);
        assert_eq!(req.objects.len(), 2);
        assert_eq!(req.objects[0].key, "a.txt");
        assert_eq!(req.objects[0].version_id, None);
        assert_eq!(req.objects[1].version_id.as_deref(), Some("v7"));
    }

    #[test]
    fn test_parse_delete_document_empty_is_malformed() {
        assert!(matches!(
            parse_delete_document(b"<Delete></Delete>"),
            Err(S3Error::MalformedXml)
        ));
        assert!(matches!(
            parse_delete_document(b"not xml at all <"),
            Err(S3Error::MalformedXml)
        ));
    }

    #[test]
    fn test_parse_complete_multipart_upload() {
        let body = br#"<CompleteMultipartUpload>
            <Part><PartNumber>1</PartNumber><ETag>"e1"</ETag></Part>
            <Part><PartNumber>3</PartNumber><ETag>"e3"</ETag></Part>
        </CompleteMultipartUpload>"#;
        let parts = parse_complete_multipart_upload(body).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part_number, 1);
        assert_eq!(parts[1].part_number, 3);
        assert_eq!(parts[1].etag, "\"e3\"");
    }

    #[test]
    fn test_parse_complete_multipart_upload_bad_part_number() {
        let body = br#"<CompleteMultipartUpload>
            <Part><PartNumber>zero</PartNumber><ETag>"e1"</ETag></Part>
        </CompleteMultipartUpload>"#;
        assert!(matches!(
            parse_complete_multipart_upload(body),
            Err(S3Error::MalformedXml)
        ));
    }

    #[test]
    fn test_parse_restore_request() {
        let body = br#"<RestoreRequest>
            <Days>7</Days>
            <GlacierJobParameters><Tier>Expedited</Tier></GlacierJobParameters>
        </RestoreRequest>"#;
        let req = parse_restore_request(body).unwrap();
        assert_eq!(req.days, Some(7));
        assert_eq!(req.tier.as_deref(), Some("Expedited"));
    }

    #[test]
    fn test_parse_restore_request_requires_root() {
        assert!(matches!(
            parse_restore_request(b""),
            Err(S3Error::MalformedXml)
        ));
        assert!(matches!(
            parse_restore_request(b"<SomethingElse/>"),
            Err(S3Error::MalformedXml)
        ));
    }

    #[test]
    fn test_iso8601_epoch() {
        assert_eq!(iso8601(UNIX_EPOCH), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_render_object_attributes_filters() {
        let attrs = ObjectAttributes {
            etag: Some("\"abc\"".to_string()),
            storage_class: Some("STANDARD".to_string()),
            object_size: Some(42),
            last_modified: None,
        };
        let doc = render_object_attributes(
            &attrs,
            &["ETag".to_string(), "ObjectSize".to_string()],
        );
        assert!(doc.contains("<ETag>abc</ETag>"));
        assert!(doc.contains("<ObjectSize>42</ObjectSize>"));
        assert!(!doc.contains("StorageClass"));
    }
}
