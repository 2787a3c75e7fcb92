pub mod download;
pub mod upload;

pub use download::{download_file, head_file};
pub use upload::{upload_file, UploadResponse};
