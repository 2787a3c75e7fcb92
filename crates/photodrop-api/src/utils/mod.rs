pub mod content_type;

pub use content_type::{attachment_disposition, content_type_for};
