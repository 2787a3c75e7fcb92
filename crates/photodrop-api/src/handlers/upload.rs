use crate::constants::{NO_FILE_UPLOADED, UPLOAD_SUCCESS_MESSAGE};
use crate::error::HttpAppError;
use crate::services::RelayService;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use photodrop_core::AppError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

/// Accept one file in the configured multipart field and return its
/// generated name. A body that is not multipart counts as "no file".
pub async fn upload_file(
    State(relay): State<RelayService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Upload request has no multipart body");
        AppError::InvalidInput(NO_FILE_UPLOADED.to_string())
    })?;

    let stored = relay.ingest(multipart).await?;

    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            filename: stored.name,
        }),
    ))
}
