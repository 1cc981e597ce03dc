// Self-service registration, login and profile lookup

use crate::core::crypto::{hash_password, verify_password, TokenSigner};
use crate::core::errors::{StoreError, TicketingError};
use crate::core::models::{NewUser, Principal, Role, User, UserProfile};
use crate::store::Store;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Role given to self-registered users that ask for none
pub const DEFAULT_ROLE: Role = Role::ClientSubUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// Create an account and sign the new user in.
///
/// A taken email is `Conflict` whether it is caught by the lookup or by the
/// storage unique constraint.
pub async fn register(
    store: &dyn Store,
    tokens: &TokenSigner,
    request: RegisterRequest,
) -> Result<(AuthResponse, User), TicketingError> {
    validate_credentials(&request.email, &request.password)?;

    if store.find_user_by_email(&request.email).await?.is_some() {
        return Err(email_in_use());
    }

    let roles: BTreeSet<Role> = match request.roles {
        Some(roles) if !roles.is_empty() => roles.into_iter().collect(),
        _ => BTreeSet::from([DEFAULT_ROLE]),
    };
    let password_hash = hash_blocking(request.password).await?;

    let user = store
        .insert_user(NewUser {
            email: request.email,
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            roles,
            organization_id: None,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => email_in_use(),
            other => other.into(),
        })?;

    info!(user_id = %user.id, roles = ?user.roles, "User registered");
    let response = sign_in(tokens, &user)?;
    Ok((response, user))
}

/// Exchange email and password for an access token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    store: &dyn Store,
    tokens: &TokenSigner,
    request: LoginRequest,
) -> Result<(AuthResponse, User), TicketingError> {
    validate_credentials(&request.email, &request.password)?;

    let user = store
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let password_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || {
        verify_password(request.password.expose_secret(), &password_hash)
    })
    .await
    .map_err(|e| TicketingError::CryptoError(format!("Password check task failed: {}", e)))?;

    if !matches {
        return Err(invalid_credentials());
    }

    let response = sign_in(tokens, &user)?;
    Ok((response, user))
}

/// Current stored profile of an authenticated principal
pub async fn profile(store: &dyn Store, principal: &Principal) -> Result<UserProfile, TicketingError> {
    let user = store
        .find_user_by_id(principal.id)
        .await?
        .ok_or(TicketingError::PrincipalNotFound)?;
    Ok(UserProfile::from(&user))
}

fn sign_in(tokens: &TokenSigner, user: &User) -> Result<AuthResponse, TicketingError> {
    Ok(AuthResponse {
        access_token: tokens.mint_token(user)?,
        user: UserProfile::from(user),
    })
}

async fn hash_blocking(password: SecretString) -> Result<String, TicketingError> {
    tokio::task::spawn_blocking(move || hash_password(password.expose_secret()))
        .await
        .map_err(|e| TicketingError::CryptoError(format!("Hashing task failed: {}", e)))?
}

fn validate_credentials(email: &str, password: &SecretString) -> Result<(), TicketingError> {
    if !is_valid_email(email) {
        return Err(TicketingError::ValidationFailed(
            "email must be a valid email address".to_string(),
        ));
    }
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(TicketingError::ValidationFailed(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Structural check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn email_in_use() -> TicketingError {
    TicketingError::Conflict("Email already in use".to_string())
}

fn invalid_credentials() -> TicketingError {
    TicketingError::Unauthenticated("Invalid credentials".to_string())
}
