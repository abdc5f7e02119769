//! Visitor registration endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::visitor::{SubmitResponse, VisitorSubmission},
    AppState,
};

use super::base_url;

/// Register a visitor and generate their e-pass
#[utoipa::path(
    post,
    path = "/submit",
    tag = "visitors",
    request_body = VisitorSubmission,
    responses(
        (status = 200, description = "E-pass generated", body = SubmitResponse),
        (status = 400, description = "Invalid submission", body = crate::error::ErrorResponse),
        (status = 500, description = "Persistence or rendering failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<VisitorSubmission>, JsonRejection>,
) -> AppResult<Json<SubmitResponse>> {
    let Json(submission) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let registration = state.services.visitors.register(&submission).await?;

    let url = format!(
        "{}/pdf/{}",
        base_url(&headers, &state.config),
        registration.pass.filename
    );
    Ok(Json(SubmitResponse::generated(url)))
}
