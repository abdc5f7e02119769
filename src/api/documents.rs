//! E-pass download endpoint

use std::io::ErrorKind;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Download a generated e-pass
#[utoipa::path(
    get,
    path = "/pdf/{filename}",
    tag = "documents",
    params(("filename" = String, Path, description = "Pass file name, `<id>-epass.pdf`")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404, description = "File not found", content_type = "text/plain")
    )
)]
pub async fn download_pass(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let path = state
        .services
        .passes
        .locate(&filename)
        .ok_or_else(|| AppError::NotFound(format!("Pass {}", filename)))?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::NotFound(format!("Pass {}", filename)),
        _ => AppError::Internal(format!("Reading {}: {}", path.display(), e)),
    })?;

    let disposition = state.config.documents.disposition.header_value(&filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
