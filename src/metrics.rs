//! Prometheus counters for authentication and ticket activity.
//!
//! Every counter lives in a private `Registry` owned by [`Metrics`], so
//! several instances (one per test router) never collide.

use crate::core::errors::TicketingError;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub auth_failures: IntCounter,
    pub registrations: IntCounter,
    pub logins: IntCounterVec,
    pub tickets_created: IntCounter,
    pub policy_denials: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, TicketingError> {
        let registry = Registry::new();

        let auth_failures = IntCounter::new(
            "ticket_desk_auth_failures_total",
            "Requests rejected by bearer authentication",
        )
        .map_err(metrics_error)?;
        let registrations = IntCounter::new(
            "ticket_desk_registrations_total",
            "Accounts created through self-service registration",
        )
        .map_err(metrics_error)?;
        let logins = IntCounterVec::new(
            Opts::new("ticket_desk_logins_total", "Login attempts by outcome"),
            &["outcome"],
        )
        .map_err(metrics_error)?;
        let tickets_created =
            IntCounter::new("ticket_desk_tickets_created_total", "Tickets created")
                .map_err(metrics_error)?;
        let policy_denials = IntCounterVec::new(
            Opts::new(
                "ticket_desk_policy_denials_total",
                "Ticket operations denied by the access policy",
            ),
            &["operation"],
        )
        .map_err(metrics_error)?;

        registry.register(Box::new(auth_failures.clone())).map_err(metrics_error)?;
        registry.register(Box::new(registrations.clone())).map_err(metrics_error)?;
        registry.register(Box::new(logins.clone())).map_err(metrics_error)?;
        registry.register(Box::new(tickets_created.clone())).map_err(metrics_error)?;
        registry.register(Box::new(policy_denials.clone())).map_err(metrics_error)?;

        Ok(Self {
            registry,
            auth_failures,
            registrations,
            logins,
            tickets_created,
            policy_denials,
        })
    }

    /// Count a policy denial for `operation` when `result` is `Forbidden`
    pub fn observe_policy<T>(&self, operation: &str, result: &Result<T, TicketingError>) {
        if let Err(TicketingError::Forbidden(_)) = result {
            self.policy_denials.with_label_values(&[operation]).inc();
        }
    }

    /// Encode all counters in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, TicketingError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| {
            TicketingError::ConfigurationError(format!("Metrics output not UTF-8: {}", e))
        })
    }
}

fn metrics_error(e: prometheus::Error) -> TicketingError {
    TicketingError::ConfigurationError(format!("Metrics error: {}", e))
}
