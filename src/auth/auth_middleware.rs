// Axum authentication middleware

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::IpAddr;
use std::sync::Arc;

use crate::api::responses::{request_id_from_headers, ApiError};
use crate::auth::audit_logger::{AuditContext, AuditLogger, AuthEvent};
use crate::auth::credential::BearerToken;
use crate::auth::identity::IdentityResolver;
use crate::core::errors::TicketingError;
use crate::metrics::Metrics;

/// Authentication state containing all dependencies
#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<IdentityResolver>,
    pub audit_logger: Arc<AuditLogger>,
    pub metrics: Arc<Metrics>,
}

/// Authentication middleware function
///
/// Extracts the bearer token from `Authorization`, resolves it to a
/// `Principal` and stores that in request extensions for handlers.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request_id_from_headers(request.headers());
    let mut context = AuditContext {
        ip_address: extract_ip_address(request.headers()),
        user_agent: extract_user_agent(request.headers()),
        ..Default::default()
    };

    let Some(token) = BearerToken::from_headers(request.headers()) else {
        reject(&auth_state, context, "Missing bearer token");
        return Err(ApiError::from_ticketing_error_with_id(
            TicketingError::Unauthenticated("Missing bearer token".to_string()),
            request_id,
        ));
    };
    context.fingerprint = Some(token.fingerprint());

    let principal = match auth_state.resolver.resolve(token.expose_secret()).await {
        Ok(principal) => principal,
        Err(e) => {
            if matches!(
                e,
                TicketingError::Unauthenticated(_) | TicketingError::PrincipalNotFound
            ) {
                reject(&auth_state, context, &e.to_string());
            }
            return Err(ApiError::from_ticketing_error_with_id(e, request_id));
        }
    };

    context.user_id = Some(principal.id);
    auth_state
        .audit_logger
        .log_auth_event(AuthEvent::AuthSuccess, context);

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn reject(auth_state: &AuthState, context: AuditContext, reason: &str) {
    auth_state.metrics.auth_failures.inc();
    auth_state.audit_logger.log_auth_event(
        AuthEvent::AuthFailure { reason: reason.to_string() },
        context,
    );
}

/// Extract IP address from request headers
///
/// Checks `X-Forwarded-For` first (for proxied requests), then `X-Real-IP`.
/// Values that are not IP addresses are ignored.
pub(crate) fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    ["X-Forwarded-For", "X-Real-IP"]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        .filter_map(|s| s.split(',').next())
        .find_map(|s| s.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
}

/// Extract user agent from request headers
pub(crate) fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
