// In-memory storage backend for development and tests

use super::{OrganizationStore, StoreHealth, TicketStore, UserStore};
use crate::core::errors::StoreError;
use crate::core::models::{
    NewTicket, NewUser, Organization, Ticket, TicketScope, TicketStatus, User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Map-backed store. Each map sits behind its own lock; email uniqueness is
/// checked and enforced while holding the users write lock.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    organizations: RwLock<HashMap<Uuid, Organization>>,
    tickets: RwLock<HashMap<Uuid, Ticket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_organization(&self, organization: Organization) {
        self.organizations
            .write()
            .await
            .insert(organization.id, organization);
    }

    /// Insert or replace a fully formed user
    pub async fn put_user(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.email == user.email && existing.id != user.id)
        {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }
        users.insert(user.id, user);
        Ok(())
    }

    pub async fn remove_user(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }

    /// Insert or replace a fully formed ticket, bypassing the create rules.
    /// Used for seeding assignments, which have no API.
    pub async fn put_ticket(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id, ticket);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == new_user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            roles: new_user.roles,
            organization_id: new_user.organization_id,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, new_ticket: NewTicket) -> Result<Ticket, StoreError> {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            title: new_ticket.title,
            description: new_ticket.description,
            status: TicketStatus::Open,
            priority: new_ticket.priority,
            created_by_id: new_ticket.created_by_id,
            assigned_expert_id: None,
            organization_id: new_ticket.organization_id,
            created_at: now,
            updated_at: now,
        };
        self.tickets.write().await.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn list_tickets(&self, scope: TicketScope) -> Result<Vec<Ticket>, StoreError> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .read()
            .await
            .values()
            .filter(|ticket| scope.matches(ticket))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
