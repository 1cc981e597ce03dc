// PostgreSQL storage backend

use super::{OrganizationStore, StoreHealth, TicketStore, UserStore};
use crate::core::errors::StoreError;
use crate::core::models::{
    NewTicket, NewUser, Organization, Role, Ticket, TicketPriority, TicketScope, TicketStatus,
    User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, roles, organization_id, created_at, updated_at";

const TICKET_COLUMNS: &str = "id, title, description, status, priority, created_by_id, \
     assigned_expert_id, organization_id, created_at, updated_at";

/// Database row structure for users
#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    roles: Vec<String>,
    organization_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(StoreError::CorruptRow)?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            roles,
            organization_id: row.organization_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
}

/// Database row structure for tickets
#[derive(FromRow)]
struct TicketRow {
    id: Uuid,
    title: String,
    description: String,
    status: String,
    priority: String,
    created_by_id: Uuid,
    assigned_expert_id: Option<Uuid>,
    organization_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status.parse::<TicketStatus>().map_err(StoreError::CorruptRow)?,
            priority: row.priority.parse::<TicketPriority>().map_err(StoreError::CorruptRow)?,
            created_by_id: row.created_by_id,
            assigned_expert_id: row.assigned_expert_id,
            organization_id: row.organization_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool with bounded acquire time
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let roles: Vec<String> = user.roles.iter().map(|r| r.as_str().to_string()).collect();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, roles, organization_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&roles)
        .bind(user.organization_id)
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Organization { id: r.id, name: r.name }))
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "INSERT INTO tickets (id, title, description, status, priority, created_by_id, organization_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            TICKET_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(TicketStatus::Open.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.created_by_id)
        .bind(ticket.organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ticket::try_from(row)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE id = $1",
            TICKET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }

    async fn list_tickets(&self, scope: TicketScope) -> Result<Vec<Ticket>, StoreError> {
        let rows = match scope {
            TicketScope::All => {
                sqlx::query_as::<_, TicketRow>(&format!(
                    "SELECT {} FROM tickets ORDER BY created_at DESC",
                    TICKET_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
            TicketScope::Organization(org_id) => {
                sqlx::query_as::<_, TicketRow>(&format!(
                    "SELECT {} FROM tickets WHERE organization_id = $1 ORDER BY created_at DESC",
                    TICKET_COLUMNS
                ))
                .bind(org_id)
                .fetch_all(&self.pool)
                .await?
            }
            TicketScope::AssignedTo(user_id) => {
                sqlx::query_as::<_, TicketRow>(&format!(
                    "SELECT {} FROM tickets WHERE assigned_expert_id = $1 ORDER BY created_at DESC",
                    TICKET_COLUMNS
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Ticket::try_from).collect()
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
