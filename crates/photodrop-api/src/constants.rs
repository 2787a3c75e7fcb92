//! API constants: route paths and client-facing messages.

pub const UPLOAD_PATH: &str = "/upload";
pub const DOWNLOAD_PATH: &str = "/download/{filename}";
pub const HEALTH_PATH: &str = "/health";

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Image uploaded successfully";
pub const NO_FILE_UPLOADED: &str = "No file uploaded";
pub const FILE_NOT_FOUND: &str = "File not found or already downloaded";

/// Fallback when the object name carries no known extension
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
