//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; any `AppError`
//! converts with `?` and renders as a JSON body with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use photodrop_core::{AppError, ErrorMetadata, LogLevel};
use photodrop_storage::StorageError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from photodrop-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(storage_error_to_app_error(err))
    }
}

/// Map a storage failure onto the client-facing taxonomy. Missing objects and
/// names the store refuses are both "not found" from the caller's side.
pub fn storage_error_to_app_error(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(name) | StorageError::InvalidKey(name) => {
            AppError::NotFound(name)
        }
        other => AppError::Storage(other.to_string()),
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    // The full source chain goes to the log only, never to the client.
    let detail = error.detailed_message();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %detail, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %detail, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %detail, error_type = error_type, "Error occurred");
        }
    }
}

impl HttpAppError {
    fn body(&self) -> ErrorResponse {
        ErrorResponse::new(self.0.client_message(), self.0.error_code())
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&self.0);

        let body = self.body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_body() {
        let err = HttpAppError(AppError::NotFound(
            "File not found or already downloaded".to_string(),
        ));
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "File not found or already downloaded");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[test]
    fn test_bad_request_body_has_only_error_and_code() {
        let err = HttpAppError(AppError::InvalidInput("No file uploaded".to_string()));
        let body = serde_json::to_value(err.body()).unwrap();
        let keys: Vec<&str> = body
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"error"));
        assert!(keys.contains(&"code"));
        assert_eq!(body["error"], "No file uploaded");
    }

    #[test]
    fn test_storage_error_hides_details() {
        let err = HttpAppError(AppError::Storage("disk full at /srv/photos".to_string()));
        let body = err.body();
        assert_eq!(body.error, "Failed to access storage");
        assert_eq!(body.code, "STORAGE_ERROR");
    }

    #[test]
    fn test_storage_not_found_maps_to_404() {
        let err = HttpAppError::from(StorageError::NotFound("1.png".to_string()));
        assert_eq!(err.0.http_status_code(), 404);

        let err = HttpAppError::from(StorageError::InvalidKey("../x".to_string()));
        assert_eq!(err.0.http_status_code(), 404);

        let err = HttpAppError::from(StorageError::UploadFailed("boom".to_string()));
        assert_eq!(err.0.http_status_code(), 500);
    }

    #[test]
    fn test_status_codes() {
        let response =
            HttpAppError(AppError::InvalidInput("No file uploaded".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = HttpAppError(AppError::Internal("x".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
