//! Declared-type to extension mapping.
//!
//! Object keys embed the canonical extension (`a1b2c3d4.png`), and retrieval
//! derives the response content type back from that extension. Declared types
//! are trusted from client metadata; no content sniffing is performed.

/// Fixed lookup table from allowed content types to canonical extensions.
const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Canonical file extension for a declared content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let normalized = content_type.to_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(ct, _)| *ct == normalized)
        .map(|(_, ext)| *ext)
}

/// Content type recorded for an object key, derived from its extension.
///
/// Falls back to `application/octet-stream` for keys without a known
/// extension, mirroring how the store reports unannotated objects.
pub fn content_type_for_key(key: &str) -> &'static str {
    let extension = key.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_allowed_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), Some("gif"));
    }

    #[test]
    fn test_extension_for_is_case_insensitive() {
        assert_eq!(extension_for("IMAGE/PNG"), Some("png"));
    }

    #[test]
    fn test_extension_for_unknown_type() {
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for(""), None);
    }

    #[test]
    fn test_content_type_round_trip() {
        for (content_type, ext) in EXTENSION_TABLE {
            let key = format!("a1b2c3d4.{}", ext);
            assert_eq!(content_type_for_key(&key), *content_type);
        }
    }

    #[test]
    fn test_content_type_for_unknown_key() {
        assert_eq!(content_type_for_key("a1b2c3d4.bin"), "application/octet-stream");
        assert_eq!(content_type_for_key("no-extension"), "application/octet-stream");
    }
}
