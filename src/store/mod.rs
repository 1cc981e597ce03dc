// Persistence layer - storage traits and their backends

use crate::core::errors::StoreError;
use crate::core::models::{NewTicket, NewUser, Organization, Ticket, TicketScope, User};
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user. A taken email surfaces as `StoreError::UniqueViolation`.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
}

/// Organization persistence
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;
}

/// Ticket persistence
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a ticket with status `OPEN`
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError>;
    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    /// Tickets matching `scope`, newest first
    async fn list_tickets(&self, scope: TicketScope) -> Result<Vec<Ticket>, StoreError>;
}

/// Backend liveness probe used by the health endpoint
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Everything the service needs from a storage backend
pub trait Store: UserStore + OrganizationStore + TicketStore + StoreHealth {}

impl<T> Store for T where T: UserStore + OrganizationStore + TicketStore + StoreHealth + ?Sized {}
