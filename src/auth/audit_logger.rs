// Security event logging

use crate::auth::credential::CredentialFingerprint;
use sqlx::PgPool;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Authentication event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    AuthSuccess,
    AuthFailure { reason: String },
    LoginSuccess,
    LoginFailure,
    Registered,
}

impl AuthEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AuthEvent::AuthSuccess => "AUTH_SUCCESS",
            AuthEvent::AuthFailure { .. } => "AUTH_FAILURE",
            AuthEvent::LoginSuccess => "LOGIN_SUCCESS",
            AuthEvent::LoginFailure => "LOGIN_FAILURE",
            AuthEvent::Registered => "REGISTERED",
        }
    }

    fn reason(&self) -> Option<&str> {
        match self {
            AuthEvent::AuthFailure { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Request metadata attached to audit records
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub fingerprint: Option<CredentialFingerprint>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Audit logger for security events
pub struct AuditLogger {
    db_pool: Option<Arc<PgPool>>,
}

impl AuditLogger {
    /// Create a new audit logger
    ///
    /// If `db_pool` is `None`, only structured logging will be used (no database persistence).
    pub fn new(db_pool: Option<Arc<PgPool>>) -> Self {
        Self { db_pool }
    }

    /// Log an authentication event
    ///
    /// Fire-and-forget: the event is written from a spawned task and
    /// failures are only logged.
    pub fn log_auth_event(&self, event: AuthEvent, context: AuditContext) {
        let db_pool = self.db_pool.clone();

        tokio::spawn(async move {
            let fingerprint = context.fingerprint.as_ref().map(|f| f.to_string());
            match &event {
                AuthEvent::AuthFailure { reason } => {
                    warn!(
                        credential = ?fingerprint,
                        user_id = ?context.user_id,
                        ip_address = ?context.ip_address,
                        user_agent = ?context.user_agent,
                        reason = %reason,
                        "Authentication failed"
                    );
                }
                AuthEvent::LoginFailure => {
                    warn!(
                        ip_address = ?context.ip_address,
                        user_agent = ?context.user_agent,
                        "Login failed"
                    );
                }
                other => {
                    info!(
                        event = other.event_type(),
                        credential = ?fingerprint,
                        user_id = ?context.user_id,
                        ip_address = ?context.ip_address,
                        "Authentication event"
                    );
                }
            }

            if let Some(pool) = db_pool {
                // Only parseable addresses reach the inet cast; anything else is NULL
                if let Err(e) = sqlx::query(
                    "INSERT INTO auth_audit_log
                         (credential_fingerprint, user_id, event_type, reason, ip_address, user_agent, created_at)
                     VALUES ($1, $2, $3, $4, $5::inet, $6, NOW())",
                )
                .bind(context.fingerprint.as_ref().map(|f| f.as_str()))
                .bind(context.user_id)
                .bind(event.event_type())
                .bind(event.reason())
                .bind(
                    context
                        .ip_address
                        .as_deref()
                        .filter(|ip| ip.parse::<IpAddr>().is_ok()),
                )
                .bind(context.user_agent.as_deref())
                .execute(pool.as_ref())
                .await
                {
                    warn!(error = %e, "Failed to write audit log to database");
                }
            }
        });
    }
}
