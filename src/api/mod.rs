// Axum web server layer

use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

pub mod handlers;
pub mod middleware;
pub mod responses;

use crate::auth::audit_logger::AuditLogger;
use crate::auth::auth_middleware::{auth_middleware, AuthState};
use crate::auth::identity::IdentityResolver;
use crate::chat::ChatResponder;
use crate::core::crypto::TokenSigner;
use crate::core::errors::TicketingError;
use crate::metrics::Metrics;
use crate::store::Store;

pub use crate::config::Config;

/// Application state containing all shared dependencies
///
/// Cloned per request by axum; every component sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenSigner>,
    pub chat: ChatResponder,
    pub metrics: Arc<Metrics>,
    pub audit_logger: Arc<AuditLogger>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        audit_logger: Arc<AuditLogger>,
    ) -> Result<Self, TicketingError> {
        let tokens = Arc::new(TokenSigner::new(
            &config.jwt_secret,
            Duration::from_secs(config.jwt_expires_in_secs),
        ));

        Ok(Self {
            store,
            tokens,
            chat: ChatResponder::new(),
            metrics: Arc::new(Metrics::new()?),
            audit_logger,
            config: Arc::new(config),
        })
    }

    /// Authentication state sharing this app's store, signer and counters
    pub fn auth_state(&self) -> Arc<AuthState> {
        Arc::new(AuthState {
            resolver: Arc::new(IdentityResolver::new(
                Arc::clone(&self.tokens),
                Arc::clone(&self.store),
            )),
            audit_logger: Arc::clone(&self.audit_logger),
            metrics: Arc::clone(&self.metrics),
        })
    }
}

/// Create the Axum router with all routes and middleware
///
/// Every route lives under `/api`. Middleware stack (outermost to innermost):
/// - Tracing (tower-http::trace)
/// - CORS for the configured frontend origin
/// - Body size limit (tower-http::limit)
/// - Request timeout, mapped to 408
/// - Bearer auth, on protected routes only (`route_layer`)
///
/// Health, metrics, register and login bypass authentication.
pub fn create_router(
    app_state: AppState,
    auth_state: Arc<AuthState>,
) -> Result<Router, TicketingError> {
    let public = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/auth/register", post(handlers::register_handler))
        .route("/auth/login", post(handlers::login_handler));

    let protected = Router::new()
        .route("/auth/profile", get(handlers::profile_handler))
        .route(
            "/tickets",
            post(handlers::create_ticket_handler).get(handlers::list_tickets_handler),
        )
        .route("/tickets/:id", get(handlers::get_ticket_handler))
        .route("/chat/ai-interact", post(handlers::chat_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    let config = Arc::clone(&app_state.config);

    // HandleErrorLayer must wrap the timeout to catch its error
    let timeout_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(middleware::handle_middleware_error))
        .timeout(middleware::request_timeout(config.request_timeout_secs))
        .into_inner();

    let router = Router::new()
        .nest("/api", public.merge(protected))
        .layer(timeout_stack)
        .layer(middleware::body_size_limit_layer(config.body_size_limit_bytes))
        .layer(middleware::cors_layer(&config.frontend_url)?)
        .layer(middleware::tracing_layer())
        .with_state(app_state);

    Ok(router)
}
