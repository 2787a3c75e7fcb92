//! Response header helpers for stored objects

use crate::constants::DEFAULT_CONTENT_TYPE;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use photodrop_storage::extension_of;

/// RFC 5987 `attr-char` minus the alphanumerics
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Content-Type for an object name, derived from its extension only.
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = extension_of(filename);
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        // Videos
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        // Documents
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// `attachment` disposition naming `filename`.
///
/// The quoted `filename` parameter is kept to printable ASCII; names outside
/// that range also get an RFC 5987 `filename*` with the exact UTF-8 name.
pub fn attachment_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            utf8_percent_encode(filename, ATTR_CHAR)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("1700000000000.png"), "image/png");
        assert_eq!(content_type_for("1700000000000.JPG"), "image/jpeg");
        assert_eq!(content_type_for("1700000000000.pdf"), "application/pdf");
        assert_eq!(content_type_for("1700000000000"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("1700000000000.xyz"), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_ascii_disposition() {
        assert_eq!(
            attachment_disposition("1700000000000.png"),
            "attachment; filename=\"1700000000000.png\""
        );
    }

    #[test]
    fn test_non_ascii_disposition() {
        assert_eq!(
            attachment_disposition("1700000000000.jpé"),
            "attachment; filename=\"1700000000000.jp_\"; filename*=UTF-8''1700000000000.jp%C3%A9"
        );
    }

    #[test]
    fn test_quote_is_escaped() {
        let value = attachment_disposition("1.a\"b");
        assert!(value.starts_with("attachment; filename=\"1.a_b\"; filename*=UTF-8''1.a%22b"));
    }
}
