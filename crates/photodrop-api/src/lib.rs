//! Photodrop API Library
//!
//! HTTP handlers, the download-once relay service, middleware and
//! application setup.

mod handlers;
mod middleware;
mod telemetry;
mod utils;

pub mod constants;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use handlers::UploadResponse;
pub use middleware::REQUEST_ID_HEADER;
pub use services::{Checkout, RelayService, StoredObject};
pub use state::AppState;
