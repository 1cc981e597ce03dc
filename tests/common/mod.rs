// Common test utilities and helpers for all test modules

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};
use ticket_desk::api::{create_router, AppState};
use ticket_desk::auth::audit_logger::AuditLogger;
use ticket_desk::config::Config;
use ticket_desk::core::crypto::hash_password;
use ticket_desk::core::errors::StoreError;
use ticket_desk::core::models::*;
use ticket_desk::store::{
    MemoryStore, OrganizationStore, StoreHealth, TicketStore, UserStore,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

/// Argon2 hash of `TEST_PASSWORD`, computed once per test binary
pub fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("hash test password"))
        .clone()
}

pub fn create_test_user(email: &str, roles: &[Role], organization_id: Option<Uuid>) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: test_password_hash(),
        first_name: None,
        last_name: None,
        roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        organization_id,
        created_at: now,
        updated_at: now,
    }
}

pub fn create_test_ticket(
    title: &str,
    organization_id: Uuid,
    created_by_id: Uuid,
    assigned_expert_id: Option<Uuid>,
    age_secs: i64,
) -> Ticket {
    let created_at = Utc::now() - Duration::seconds(age_secs);
    Ticket {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{} description", title),
        status: TicketStatus::Open,
        priority: TicketPriority::Medium,
        created_by_id,
        assigned_expert_id,
        organization_id,
        created_at,
        updated_at: created_at,
    }
}

pub fn principal_of(user: &User) -> Principal {
    Principal::from(user)
}

/// Two organizations, one user per role, and tickets covering every
/// visibility path.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub org1: Uuid,
    pub org2: Uuid,

    pub client_admin: User,
    pub client_sub: User,
    pub client_sub_org2: User,
    pub client_no_org: User,
    pub expert: User,
    pub expert2: User,
    pub tdm: User,
    pub platform_admin: User,
    pub operation_admin: User,
    pub sdm: User,
    pub roleless: User,

    /// org1, assigned to `expert`, newest
    pub ticket_org1_assigned: Ticket,
    /// org1, unassigned
    pub ticket_org1_open: Ticket,
    /// org2, assigned to `expert2`
    pub ticket_org2_assigned: Ticket,
    /// org2, assigned to `tdm`, oldest
    pub ticket_org2_tdm: Ticket,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let org1 = Uuid::new_v4();
        let org2 = Uuid::new_v4();
        store.put_organization(Organization { id: org1, name: "Acme".to_string() }).await;
        store.put_organization(Organization { id: org2, name: "Globex".to_string() }).await;

        let client_admin = create_test_user("admin@acme.test", &[Role::ClientAdmin], Some(org1));
        let client_sub = create_test_user("sub@acme.test", &[Role::ClientSubUser], Some(org1));
        let client_sub_org2 =
            create_test_user("sub@globex.test", &[Role::ClientSubUser], Some(org2));
        let client_no_org = create_test_user("drifter@nowhere.test", &[Role::ClientSubUser], None);
        let expert = create_test_user("expert@desk.test", &[Role::Expert], None);
        let expert2 = create_test_user("expert2@desk.test", &[Role::Expert], None);
        let tdm = create_test_user("tdm@desk.test", &[Role::Tdm], None);
        let platform_admin = create_test_user("platform@desk.test", &[Role::PlatformAdmin], None);
        let operation_admin = create_test_user("ops@desk.test", &[Role::OperationAdmin], None);
        let sdm = create_test_user("sdm@desk.test", &[Role::Sdm], None);
        let roleless = create_test_user("nobody@desk.test", &[], None);

        for user in [
            &client_admin,
            &client_sub,
            &client_sub_org2,
            &client_no_org,
            &expert,
            &expert2,
            &tdm,
            &platform_admin,
            &operation_admin,
            &sdm,
            &roleless,
        ] {
            store.put_user(user.clone()).await.expect("seed user");
        }

        let ticket_org1_assigned =
            create_test_ticket("VPN down", org1, client_sub.id, Some(expert.id), 10);
        let ticket_org1_open = create_test_ticket("Printer jam", org1, client_admin.id, None, 20);
        let ticket_org2_assigned =
            create_test_ticket("Payroll crash", org2, client_sub_org2.id, Some(expert2.id), 30);
        let ticket_org2_tdm =
            create_test_ticket("Escalation", org2, client_sub_org2.id, Some(tdm.id), 40);

        for ticket in [
            &ticket_org1_assigned,
            &ticket_org1_open,
            &ticket_org2_assigned,
            &ticket_org2_tdm,
        ] {
            store.put_ticket(ticket.clone()).await;
        }

        Self {
            store,
            org1,
            org2,
            client_admin,
            client_sub,
            client_sub_org2,
            client_no_org,
            expert,
            expert2,
            tdm,
            platform_admin,
            operation_admin,
            sdm,
            roleless,
            ticket_org1_assigned,
            ticket_org1_open,
            ticket_org2_assigned,
            ticket_org2_tdm,
        }
    }

    pub fn all_ticket_ids(&self) -> Vec<Uuid> {
        vec![
            self.ticket_org1_assigned.id,
            self.ticket_org1_open.id,
            self.ticket_org2_assigned.id,
            self.ticket_org2_tdm.id,
        ]
    }
}

pub fn create_test_app_state(store: Arc<dyn ticket_desk::store::Store>) -> AppState {
    AppState::new(Config::test_config(), store, Arc::new(AuditLogger::new(None)))
        .expect("test app state")
}

/// Router over an arbitrary store, for failure-path tests
pub fn router_for(store: Arc<dyn ticket_desk::store::Store>) -> (Router, AppState) {
    let state = create_test_app_state(store);
    let router = create_router(state.clone(), state.auth_state()).expect("router");
    (router, state)
}

/// Send a request and return status plus raw body text
pub async fn send_raw(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = router.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

/// Router plus the state it was built from
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub fixture: Fixture,
}

impl TestApp {
    pub async fn new() -> Self {
        let fixture = Fixture::new().await;
        let (router, state) = router_for(fixture.store.clone());
        Self { router, state, fixture }
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.mint_token(user).expect("mint token")
    }

    /// Send a request and decode the JSON body (Null when empty or not JSON)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = send_raw(&self.router, request).await;
        let value = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        self.send(build_request(Method::GET, uri, token, None)).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.send(build_request(Method::POST, uri, token, Some(body.to_string())))
            .await
    }
}

pub fn build_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Store whose every call fails with a database error
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Database("connection refused: postgres://desk:secret@db".to_string())
}

#[async_trait::async_trait]
impl UserStore for FailingStore {
    async fn find_user_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(unavailable())
    }

    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(unavailable())
    }

    async fn insert_user(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(unavailable())
    }
}

#[async_trait::async_trait]
impl OrganizationStore for FailingStore {
    async fn find_organization(&self, _id: Uuid) -> Result<Option<Organization>, StoreError> {
        Err(unavailable())
    }
}

#[async_trait::async_trait]
impl TicketStore for FailingStore {
    async fn insert_ticket(&self, _ticket: NewTicket) -> Result<Ticket, StoreError> {
        Err(unavailable())
    }

    async fn find_ticket(&self, _id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Err(unavailable())
    }

    async fn list_tickets(&self, _scope: TicketScope) -> Result<Vec<Ticket>, StoreError> {
        Err(unavailable())
    }
}

#[async_trait::async_trait]
impl StoreHealth for FailingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Err(unavailable())
    }
}
