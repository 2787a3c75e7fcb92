use crate::constants::FILE_NOT_FOUND;
use crate::error::HttpAppError;
use crate::services::RelayService;
use crate::utils::{attachment_disposition, content_type_for};
use anyhow::Context;
use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, response::Builder, StatusCode},
    response::Response,
};
use photodrop_core::AppError;

/// Stream a stored object as an attachment. The object is deleted once the
/// whole body has been sent.
pub async fn download_file(
    State(relay): State<RelayService>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<Response, HttpAppError> {
    let filename = requested_name(filename)?;
    let checkout = relay.checkout(&filename).await?;

    // Without a declared length an empty body goes out chunked, so the server
    // still polls it to the end and the object is consumed.
    let mut builder = attachment_head(&checkout.name);
    if checkout.content_length > 0 {
        builder = builder.header(header::CONTENT_LENGTH, checkout.content_length);
    }

    let response = builder
        .body(Body::from_stream(checkout.body))
        .context("Failed to build download response")
        .map_err(AppError::from)?;
    Ok(response)
}

/// Headers of a download without claiming or consuming the object.
pub async fn head_file(
    State(relay): State<RelayService>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<Response, HttpAppError> {
    let filename = requested_name(filename)?;
    let object = relay.inspect(&filename).await?;

    let response = attachment_head(&object.name)
        .header(header::CONTENT_LENGTH, object.size)
        .body(Body::empty())
        .context("Failed to build download response")
        .map_err(AppError::from)?;
    Ok(response)
}

fn requested_name(filename: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    let Path(filename) = filename.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Undecodable download name");
        AppError::NotFound(FILE_NOT_FOUND.to_string())
    })?;
    Ok(filename)
}

fn attachment_head(name: &str) -> Builder {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(name))
        .header(header::CONTENT_DISPOSITION, attachment_disposition(name))
}
