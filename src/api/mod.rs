//! HTTP handlers and router

pub mod documents;
pub mod health;
pub mod openapi;
pub mod visitors;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    config::{AppConfig, CorsConfig},
    AppState,
};

/// Build the application router with all routes and layers
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app: Router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/submit", post(visitors::submit))
        .route("/pdf/:filename", get(documents::download_pass))
        .with_state(state.clone())
        .nest_service("/public", ServeDir::new(&config.documents.public_dir))
        .merge(openapi::create_openapi_router());

    if config.server.enforce_https && !config.tls_enabled() {
        app = app.layer(middleware::from_fn_with_state(state, redirect_to_https));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        // credentials cannot be combined with a wildcard origin
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(config.allow_credentials)
}

/// `https` when TLS is terminated here or by a proxy that says so
pub fn request_scheme(headers: &HeaderMap, tls_enabled: bool) -> &'static str {
    let forwarded_https = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));

    if tls_enabled || forwarded_https {
        "https"
    } else {
        "http"
    }
}

/// Host the client used to reach us, falling back to the listen address
pub fn request_host(headers: &HeaderMap, config: &AppConfig) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port))
}

/// `<scheme>://<host>` of the current request
pub fn base_url(headers: &HeaderMap, config: &AppConfig) -> String {
    format!(
        "{}://{}",
        request_scheme(headers, config.tls_enabled()),
        request_host(headers, config)
    )
}

async fn redirect_to_https(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request_scheme(request.headers(), state.config.tls_enabled()) == "https" {
        return next.run(request).await;
    }

    let host = request_host(request.headers(), &state.config);
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or("/");
    Redirect::permanent(&format!("https://{}{}", host, path)).into_response()
}
