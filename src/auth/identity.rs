// Bearer credential -> verified principal

use crate::core::crypto::TokenSigner;
use crate::core::errors::TicketingError;
use crate::core::models::Principal;
use crate::store::Store;
use std::sync::Arc;
use tracing::debug;

/// Verifies access tokens and rebuilds the caller from storage.
///
/// Token claims only identify the user; roles always come from the
/// stored record, so a role change takes effect on the next request.
pub struct IdentityResolver {
    tokens: Arc<TokenSigner>,
    store: Arc<dyn Store>,
}

impl IdentityResolver {
    pub fn new(tokens: Arc<TokenSigner>, store: Arc<dyn Store>) -> Self {
        Self { tokens, store }
    }

    /// Resolve a raw bearer token.
    ///
    /// Fails with `Unauthenticated` for an empty, malformed, expired or
    /// foreign-signed token and `PrincipalNotFound` when its user is gone.
    pub async fn resolve(&self, token: &str) -> Result<Principal, TicketingError> {
        if token.trim().is_empty() {
            return Err(TicketingError::Unauthenticated(
                "Missing bearer token".to_string(),
            ));
        }

        let claims = self.tokens.verify_token(token)?;

        let user = self
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or(TicketingError::PrincipalNotFound)?;

        debug!(user_id = %user.id, roles = ?user.roles, "Principal resolved");
        Ok(Principal::from(&user))
    }
}
