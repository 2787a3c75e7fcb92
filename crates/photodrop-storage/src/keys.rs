//! Object name generation and validation.
//!
//! Names have the form `<unix-millis><extension>`, where the extension is
//! taken from the uploaded file's original name including its dot
//! (`photo.jpg` becomes `1700000000000.jpg`).

use std::sync::atomic::{AtomicI64, Ordering};

use crate::traits::{StorageError, StorageResult};

const MAX_NAME_LENGTH: usize = 255;

/// Issues object names from the wall clock.
///
/// Timestamps are strictly increasing within one namer: two uploads landing
/// in the same millisecond get consecutive values instead of the same name.
#[derive(Debug, Default)]
pub struct ObjectNamer {
    last_millis: AtomicI64,
}

impl ObjectNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next name for a file uploaded as `original_filename`
    pub fn next_name(&self, original_filename: &str) -> String {
        format!("{}{}", self.next_timestamp(), extension_of(original_filename))
    }

    fn next_timestamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

/// Extension of `filename` including the leading dot, or an empty string.
///
/// Only the last path segment is considered, so directory components sent by
/// a client never reach the object name. A leading dot does not start an
/// extension (`.bashrc` has none). Control characters are dropped.
pub fn extension_of(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);

    match base.rfind('.') {
        Some(idx) if base[..idx].chars().any(|c| c != '.') => base[idx..]
            .chars()
            .filter(|c| !c.is_control())
            .collect(),
        _ => String::new(),
    }
}

/// Reject names that could escape the flat namespace or collide with
/// in-flight writes.
pub fn validate_object_name(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::InvalidKey("Object name is empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(StorageError::InvalidKey(format!(
            "Object name exceeds {} bytes",
            MAX_NAME_LENGTH
        )));
    }
    if name.starts_with('.')
        || name.contains("..")
        || name.contains(|c: char| c == '/' || c == '\\')
        || name.chars().any(|c| c.is_control())
    {
        return Err(StorageError::InvalidKey(
            "Object name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.jpg"), ".jpg");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("trailing."), ".");
        assert_eq!(extension_of("dir.d/file"), "");
        assert_eq!(extension_of("../../etc/passwd.txt"), ".txt");
        assert_eq!(extension_of("C:\\Users\\me\\scan.PDF"), ".PDF");
        assert_eq!(extension_of("bad.e\nxt"), ".ext");
    }

    #[test]
    fn test_next_name_keeps_extension() {
        let namer = ObjectNamer::new();
        let name = namer.next_name("a.png");
        assert!(name.ends_with(".png"));
        let stem = name.trim_end_matches(".png");
        assert!(stem.parse::<i64>().is_ok());
        assert!(validate_object_name(&name).is_ok());
    }

    #[test]
    fn test_next_name_without_extension_is_timestamp() {
        let namer = ObjectNamer::new();
        assert!(namer.next_name("blob").parse::<i64>().is_ok());
    }

    #[test]
    fn test_names_unique_within_same_millisecond() {
        let namer = ObjectNamer::new();
        let names: HashSet<String> = (0..1000).map(|_| namer.next_name("x.bin")).collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let namer = ObjectNamer::new();
        let a: i64 = namer.next_name("f").parse().unwrap();
        let b: i64 = namer.next_name("f").parse().unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_validate_object_name() {
        assert!(validate_object_name("1700000000000.jpg").is_ok());
        assert!(validate_object_name("1700000000000").is_ok());
        assert!(validate_object_name("").is_err());
        assert!(validate_object_name("../etc/passwd").is_err());
        assert!(validate_object_name("a/b").is_err());
        assert!(validate_object_name("a\\b").is_err());
        assert!(validate_object_name(".hidden").is_err());
        assert!(validate_object_name(&"9".repeat(300)).is_err());
    }
}
