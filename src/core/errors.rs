// Domain error types - Secure error handling with no information disclosure

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the ticketing service
#[derive(Error, Debug)]
pub enum TicketingError {
    /// Missing, malformed, expired or foreign-signed credential (HTTP 401)
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Credential is valid but its user no longer exists (HTTP 401)
    #[error("Principal not found")]
    PrincipalNotFound,

    /// Authenticated but not permitted (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource absent (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// No organization could be resolved for the operation (HTTP 400)
    #[error("Organization required: {0}")]
    OrganizationRequired(String),

    /// Target organization does not exist (HTTP 404)
    #[error("Organization with ID {0} not found")]
    OrganizationNotFound(Uuid),

    /// Duplicate resource, e.g. an email already registered (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input shape (HTTP 400)
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Storage failure (HTTP 500)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Token minting or password hashing failure (HTTP 500)
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Errors raised by storage backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Stored row could not be mapped to a domain value
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Backend failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(
                    db_err.constraint().unwrap_or("unique").to_string(),
                );
            }
        }
        StoreError::Database(err.to_string())
    }
}

impl From<StoreError> for TicketingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => {
                TicketingError::Conflict("Resource already exists".to_string())
            }
            other => TicketingError::StorageError(other.to_string()),
        }
    }
}

impl TicketingError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            TicketingError::Unauthenticated(_) => 401,
            TicketingError::PrincipalNotFound => 401,
            TicketingError::Forbidden(_) => 403,
            TicketingError::NotFound(_) => 404,
            TicketingError::OrganizationRequired(_) => 400,
            TicketingError::OrganizationNotFound(_) => 404,
            TicketingError::Conflict(_) => 409,
            TicketingError::ValidationFailed(_) => 400,
            TicketingError::StorageError(_) => 500,
            TicketingError::CryptoError(_) => 500,
            TicketingError::ConfigurationError(_) => 500,
        }
    }

    /// Get user-friendly error message (no sensitive information)
    pub fn user_message(&self) -> String {
        match self {
            TicketingError::Unauthenticated(reason) => reason.clone(),
            TicketingError::PrincipalNotFound => "User not found or token invalid".to_string(),
            TicketingError::Forbidden(reason) => reason.clone(),
            TicketingError::NotFound(reason) => reason.clone(),
            TicketingError::OrganizationRequired(reason) => reason.clone(),
            TicketingError::OrganizationNotFound(id) => {
                format!("Organization with ID {} not found", id)
            }
            TicketingError::Conflict(reason) => reason.clone(),
            TicketingError::ValidationFailed(reason) => reason.clone(),
            TicketingError::StorageError(_) => "Internal error".to_string(),
            TicketingError::CryptoError(_) => "Internal error".to_string(),
            TicketingError::ConfigurationError(_) => "Internal error".to_string(),
        }
    }

    /// Whether this error is a server-side failure that must be logged
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}
