//! Content fingerprinting for multipart parts.
//!
//! S3 reports the ETag of an uploaded part as the quoted MD5 hex digest of the
//! part body, e.g. `"9e107d9d372bb6826bd81d3542a419d6"`. Resumed uploads are
//! checked by hashing the local bytes and comparing against that token.

/// Compute the MD5 fingerprint of a byte slice.
///
/// # Arguments
/// * `data` - Bytes to hash
///
/// # Returns
/// 32-character lowercase hex string (128 bits).
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Extract the fingerprint token embedded in an ETag.
///
/// The token is the portion between the first pair of quotation marks.
/// ETags without a complete quoted section are returned trimmed, as-is.
///
/// # Arguments
/// * `etag` - Raw ETag as reported by the storage service
pub fn etag_fingerprint(etag: &str) -> &str {
    let mut pieces = etag.splitn(3, '"');
    match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(_), Some(token), Some(_)) => token,
        _ => etag.trim(),
    }
}

/// Format a fingerprint the way S3 reports part ETags (quoted).
pub fn quoted_etag(fingerprint: &str) -> String {
    format!("\"{}\"", fingerprint)
}

/// Check whether `data` hashes to the fingerprint embedded in `etag`.
///
/// Hex digits are compared case-insensitively.
pub fn matches_etag(etag: &str, data: &[u8]) -> bool {
    etag_fingerprint(etag).eq_ignore_ascii_case(&hash_bytes(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_known_value() {
        assert_eq!(hash_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            hash_bytes(b"The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn test_hash_bytes_different_inputs() {
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"world"));
    }

    #[test]
    fn test_etag_fingerprint_quoted() {
        assert_eq!(etag_fingerprint("\"abc123\""), "abc123");
    }

    #[test]
    fn test_etag_fingerprint_uses_first_quoted_token() {
        assert_eq!(etag_fingerprint("W/\"abc\"-\"def\""), "abc");
    }

    #[test]
    fn test_etag_fingerprint_unquoted() {
        assert_eq!(etag_fingerprint(" abc123 "), "abc123");
        assert_eq!(etag_fingerprint("\"dangling"), "\"dangling");
    }

    #[test]
    fn test_matches_etag() {
        let etag: String = quoted_etag(&hash_bytes(b"hello"));
        assert!(matches_etag(&etag, b"hello"));
        assert!(matches_etag(&etag.to_uppercase(), b"hello"));
        assert!(!matches_etag(&etag, b"hellO"));
    }
}
