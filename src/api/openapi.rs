//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{documents, health, visitors};
use crate::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-Pass API",
        version = "1.0.0",
        description = "Visitor registration and e-pass download"
    ),
    paths(
        // Health
        health::root,
        health::health_check,
        health::readiness_check,
        // Visitors
        visitors::submit,
        // Documents
        documents::download_pass,
    ),
    components(
        schemas(
            crate::models::visitor::VisitorSubmission,
            crate::models::visitor::SubmitResponse,
            health::HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visitors", description = "Visitor registration"),
        (name = "documents", description = "E-pass downloads")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
