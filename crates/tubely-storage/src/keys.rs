//! Shared key layout for storage backends.
//!
//! Key format: `{aspect}/{video_id}.{extension}`.

use crate::traits::{StorageError, StorageResult};
use tubely_core::AspectRatio;
use uuid::Uuid;

const MAX_KEY_LEN: usize = 1024;

/// Object key for a processed video.
pub fn video_key(aspect: AspectRatio, video_id: Uuid, extension: &str) -> String {
    format!("{}/{}.{}", aspect, video_id, extension)
}

/// Reject keys that could escape a bucket or directory root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "key length must be between 1 and {}",
            MAX_KEY_LEN
        )));
    }
    if storage_key.starts_with('/') || storage_key.contains("..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if storage_key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\')
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains control characters".to_string(),
        ));
    }
    Ok(())
}

/// Percent-encode each path segment of a key, keeping the `/` separators.
pub(crate) fn encode_key(storage_key: &str) -> String {
    storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Recover the object key from a signed URL.
///
/// Drops scheme, host and query string, then an optional leading bucket
/// segment (path-style S3 URLs put the bucket first).
pub fn key_from_signed_url(url: &str, bucket: Option<&str>) -> Option<String> {
    let without_query = url.split(['?', '#']).next()?;
    let after_scheme = match without_query.split_once("://") {
        Some((_, rest)) => rest,
        None => without_query,
    };
    let (_, path) = after_scheme.split_once('/')?;

    let path = match bucket {
        Some(bucket) => path
            .strip_prefix(bucket)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path),
        None => path,
    };

    let key = urlencoding::decode(path).ok()?.into_owned();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_key_embeds_classification() {
        let id = Uuid::parse_str("2f1b4c34-9f1c-4b8e-a5f0-7d2a9a0b1c3d").unwrap();
        assert_eq!(
            video_key(AspectRatio::Landscape, id, "mp4"),
            "landscape/2f1b4c34-9f1c-4b8e-a5f0-7d2a9a0b1c3d.mp4"
        );
        assert!(video_key(AspectRatio::Other, id, "mp4").starts_with("other/"));
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("portrait/abc.mp4").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("a\nb").is_err());
    }

    #[test]
    fn key_recovered_from_path_style_url() {
        let url = "https://s3.us-east-1.amazonaws.com/tubely/landscape/abc.mp4?X-Amz-Signature=ff";
        assert_eq!(
            key_from_signed_url(url, Some("tubely")).as_deref(),
            Some("landscape/abc.mp4")
        );
    }

    #[test]
    fn key_recovered_from_virtual_hosted_url() {
        let url = "https://tubely.s3.us-east-1.amazonaws.com/portrait/abc.mp4?X-Amz-Expires=300";
        assert_eq!(
            key_from_signed_url(url, Some("tubely")).as_deref(),
            Some("portrait/abc.mp4")
        );
    }

    #[test]
    fn encoded_segments_are_decoded() {
        let encoded = encode_key("other/my video.mp4");
        assert_eq!(encoded, "other/my%20video.mp4");
        let url = format!("http://localhost:8091/{}?signature=x", encoded);
        assert_eq!(
            key_from_signed_url(&url, None).as_deref(),
            Some("other/my video.mp4")
        );
    }

    #[test]
    fn url_without_path_has_no_key() {
        assert!(key_from_signed_url("https://example.com", None).is_none());
        assert!(key_from_signed_url("https://example.com/?a=b", None).is_none());
    }
}
