// Request handlers for API endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::responses::{request_id_from_headers, ApiError, HealthResponse};
use crate::api::AppState;
use crate::auth::accounts::{self, AuthResponse, LoginRequest, RegisterRequest};
use crate::auth::audit_logger::{AuditContext, AuthEvent};
use crate::auth::auth_middleware::{extract_ip_address, extract_user_agent};
use crate::auth::roles::{authorize, CREATE_TICKET_ROLES, VIEW_TICKET_ROLES};
use crate::chat::{ChatReply, ChatRequest};
use crate::core::errors::TicketingError;
use crate::core::models::{Principal, Role, Ticket, TicketPriority, UserProfile};
use crate::policy::{self, CreateTicket};

/// Health probe budget for the storage ping
const STORAGE_PING_TIMEOUT: Duration = Duration::from_millis(500);

/// Body of `POST /api/tickets`. Unknown fields such as `status` are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketBody {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
}

/// Register handler
///
/// POST /api/auth/register
pub async fn register_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let request_id = request_id_from_headers(&headers);
    let Json(request) = payload.map_err(|e| rejection(e, &request_id))?;

    let (response, user) =
        accounts::register(app_state.store.as_ref(), &app_state.tokens, request)
            .await
            .map_err(|e| ApiError::from_ticketing_error_with_id(e, request_id.clone()))?;

    app_state.metrics.registrations.inc();
    app_state.audit_logger.log_auth_event(
        AuthEvent::Registered,
        audit_context(&headers, Some(user.id)),
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login handler
///
/// POST /api/auth/login
pub async fn login_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let request_id = request_id_from_headers(&headers);
    let Json(request) = payload.map_err(|e| rejection(e, &request_id))?;

    match accounts::login(app_state.store.as_ref(), &app_state.tokens, request).await {
        Ok((response, user)) => {
            app_state.metrics.logins.with_label_values(&["success"]).inc();
            app_state.audit_logger.log_auth_event(
                AuthEvent::LoginSuccess,
                audit_context(&headers, Some(user.id)),
            );
            Ok(Json(response))
        }
        Err(e) => {
            if matches!(e, TicketingError::Unauthenticated(_)) {
                app_state.metrics.logins.with_label_values(&["failure"]).inc();
                app_state
                    .audit_logger
                    .log_auth_event(AuthEvent::LoginFailure, audit_context(&headers, None));
            }
            Err(ApiError::from_ticketing_error_with_id(e, request_id))
        }
    }
}

/// Profile handler
///
/// GET /api/auth/profile
pub async fn profile_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserProfile>, ApiError> {
    let request_id = request_id_from_headers(&headers);
    let profile = accounts::profile(app_state.store.as_ref(), &principal)
        .await
        .map_err(|e| ApiError::from_ticketing_error_with_id(e, request_id))?;
    Ok(Json(profile))
}

/// Create ticket handler
///
/// POST /api/tickets
pub async fn create_ticket_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateTicketBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let request_id = request_id_from_headers(&headers);
    require_roles(&app_state, &principal, CREATE_TICKET_ROLES, "create", &request_id)?;
    let Json(body) = payload.map_err(|e| rejection(e, &request_id))?;

    let result = policy::create_ticket(
        app_state.store.as_ref(),
        &principal,
        CreateTicket {
            title: body.title,
            description: body.description,
            priority: body.priority,
            organization_id: body.organization_id,
        },
    )
    .await;
    app_state.metrics.observe_policy("create", &result);

    let ticket = result.map_err(|e| ApiError::from_ticketing_error_with_id(e, request_id))?;
    app_state.metrics.tickets_created.inc();
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List tickets handler
///
/// GET /api/tickets
pub async fn list_tickets_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let request_id = request_id_from_headers(&headers);
    require_roles(&app_state, &principal, VIEW_TICKET_ROLES, "list", &request_id)?;

    let result = policy::list_tickets(app_state.store.as_ref(), &principal).await;
    app_state.metrics.observe_policy("list", &result);

    let tickets = result.map_err(|e| ApiError::from_ticketing_error_with_id(e, request_id))?;
    debug!(user_id = %principal.id, count = tickets.len(), "Tickets listed");
    Ok(Json(tickets))
}

/// Get ticket handler
///
/// GET /api/tickets/:id
pub async fn get_ticket_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let request_id = request_id_from_headers(&headers);
    require_roles(&app_state, &principal, VIEW_TICKET_ROLES, "read", &request_id)?;

    let ticket_id = Uuid::parse_str(&id).map_err(|_| {
        ApiError::from_ticketing_error_with_id(
            TicketingError::ValidationFailed("Ticket id must be a UUID".to_string()),
            request_id.clone(),
        )
    })?;

    let result = policy::read_ticket(app_state.store.as_ref(), &principal, ticket_id).await;
    app_state.metrics.observe_policy("read", &result);

    let ticket = result.map_err(|e| ApiError::from_ticketing_error_with_id(e, request_id))?;
    Ok(Json(ticket))
}

/// Chat handler
///
/// POST /api/chat/ai-interact
pub async fn chat_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let request_id = request_id_from_headers(&headers);
    let Json(request) = payload.map_err(|e| rejection(e, &request_id))?;

    Ok(Json(app_state.chat.respond(&request.message, Some(principal.id))))
}

/// Health check handler
///
/// GET /api/health
///
/// Always answers `ok`; a slow or failing store is reported, not fatal.
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let storage = match tokio::time::timeout(STORAGE_PING_TIMEOUT, app_state.store.ping()).await {
        Ok(Ok(())) => "connected".to_string(),
        Ok(Err(e)) => {
            warn!(error = %e, "Storage ping failed");
            "slow: unavailable".to_string()
        }
        Err(_) => {
            debug!("Storage ping timed out in health check");
            "slow: timeout".to_string()
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        storage,
    })
}

/// Metrics handler
///
/// GET /api/metrics
///
/// Returns Prometheus metrics in text format
pub async fn metrics_handler(State(app_state): State<AppState>) -> Result<Response, ApiError> {
    let body = app_state.metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Route-level role gate, counted as a policy denial when it fails
fn require_roles(
    app_state: &AppState,
    principal: &Principal,
    required: &[Role],
    operation: &str,
    request_id: &str,
) -> Result<(), ApiError> {
    if authorize(principal, required) {
        return Ok(());
    }
    info!(user_id = %principal.id, operation, "Role check failed");
    app_state
        .metrics
        .policy_denials
        .with_label_values(&[operation])
        .inc();
    Err(ApiError::from_ticketing_error_with_id(
        TicketingError::Forbidden("Insufficient role for this operation".to_string()),
        request_id.to_string(),
    ))
}

/// Body rejections are 400, except an oversized body which keeps its 413
fn rejection(rejection: JsonRejection, request_id: &str) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let mut api_error = ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, rejection.body_text());
        api_error.request_id = Some(request_id.to_string());
        return api_error;
    }
    ApiError::from_ticketing_error_with_id(
        TicketingError::ValidationFailed(rejection.body_text()),
        request_id.to_string(),
    )
}

fn audit_context(headers: &HeaderMap, user_id: Option<Uuid>) -> AuditContext {
    AuditContext {
        fingerprint: None,
        user_id,
        ip_address: extract_ip_address(headers),
        user_agent: extract_user_agent(headers),
    }
}
