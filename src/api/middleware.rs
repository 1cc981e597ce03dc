// Middleware stack for observability and protection

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::BoxError;
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::api::responses::ApiError;
use crate::core::errors::TicketingError;

/// Tracing middleware
///
/// Logs method, path, status and latency for every request.
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Body size limit middleware
///
/// Returns 413 Payload Too Large if exceeded
pub fn body_size_limit_layer(limit_bytes: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(limit_bytes)
}

/// CORS for the web frontend, with credentials
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer, TicketingError> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/')).map_err(|e| {
        TicketingError::ConfigurationError(format!("Invalid FRONTEND_URL '{}': {}", frontend_url, e))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Maps errors raised by the timeout layer into HTTP responses
pub async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        ApiError::new(StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string()).into_response()
    } else {
        ApiError::from_ticketing_error(TicketingError::ConfigurationError(format!(
            "Unhandled middleware error: {}",
            err
        )))
        .into_response()
    }
}

/// Request timeout budget
pub fn request_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
