// YAML seed loading for the in-memory store
//
// Organizations are referenced by name and users by email, so a seed file
// never has to spell out generated ids.

use super::memory::MemoryStore;
use crate::core::crypto::hash_password;
use crate::core::errors::TicketingError;
use crate::core::models::{
    Organization, Role, Ticket, TicketPriority, TicketStatus, User,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Root of a seed file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub organizations: Vec<SeedOrganization>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub tickets: Vec<SeedTicket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedOrganization {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub roles: Vec<Role>,
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedTicket {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: TicketPriority,
    pub organization: String,
    pub created_by: String,
    #[serde(default)]
    pub assigned_expert: Option<String>,
}

/// Counts of seeded records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub organizations: usize,
    pub users: usize,
    pub tickets: usize,
}

impl SeedData {
    /// Load seed data from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TicketingError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(TicketingError::ConfigurationError(format!(
                "Seed file not found at {:?}",
                path_ref
            )));
        }

        let yaml_content = fs::read_to_string(path_ref).map_err(|e| {
            TicketingError::ConfigurationError(format!("Failed to read seed file: {}", e))
        })?;

        Self::from_yaml(&yaml_content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, TicketingError> {
        serde_yaml::from_str(yaml).map_err(|e| {
            TicketingError::ConfigurationError(format!("Failed to parse seed YAML: {}", e))
        })
    }

    /// Write every record into `store`, hashing plain passwords on the way
    pub async fn apply(self, store: &MemoryStore) -> Result<SeedSummary, TicketingError> {
        let now = Utc::now();
        let mut org_ids: HashMap<String, Uuid> = HashMap::new();
        let mut user_ids: HashMap<String, Uuid> = HashMap::new();

        for org in &self.organizations {
            let id = org.id.unwrap_or_else(Uuid::new_v4);
            store
                .put_organization(Organization { id, name: org.name.clone() })
                .await;
            org_ids.insert(org.name.clone(), id);
        }

        for seed_user in &self.users {
            let organization_id = match &seed_user.organization {
                Some(name) => Some(lookup(&org_ids, name, "organization")?),
                None => None,
            };
            let password = seed_user.password.clone();
            let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
                .await
                .map_err(|e| TicketingError::CryptoError(format!("Hashing task failed: {}", e)))??;

            let user = User {
                id: seed_user.id.unwrap_or_else(Uuid::new_v4),
                email: seed_user.email.clone(),
                password_hash,
                first_name: seed_user.first_name.clone(),
                last_name: seed_user.last_name.clone(),
                roles: seed_user.roles.iter().copied().collect::<BTreeSet<_>>(),
                organization_id,
                created_at: now,
                updated_at: now,
            };
            user_ids.insert(user.email.clone(), user.id);
            store.put_user(user).await.map_err(|_| {
                TicketingError::ConfigurationError(format!(
                    "Duplicate seed user email '{}'",
                    seed_user.email
                ))
            })?;
        }

        for seed_ticket in &self.tickets {
            let assigned_expert_id = match &seed_ticket.assigned_expert {
                Some(email) => Some(lookup(&user_ids, email, "user")?),
                None => None,
            };
            store
                .put_ticket(Ticket {
                    id: Uuid::new_v4(),
                    title: seed_ticket.title.clone(),
                    description: seed_ticket.description.clone(),
                    status: seed_ticket.status,
                    priority: seed_ticket.priority,
                    created_by_id: lookup(&user_ids, &seed_ticket.created_by, "user")?,
                    assigned_expert_id,
                    organization_id: lookup(&org_ids, &seed_ticket.organization, "organization")?,
                    created_at: now,
                    updated_at: now,
                })
                .await;
        }

        let summary = SeedSummary {
            organizations: self.organizations.len(),
            users: self.users.len(),
            tickets: self.tickets.len(),
        };
        info!(
            organizations = summary.organizations,
            users = summary.users,
            tickets = summary.tickets,
            "In-memory store seeded"
        );
        Ok(summary)
    }
}

fn lookup(ids: &HashMap<String, Uuid>, key: &str, kind: &str) -> Result<Uuid, TicketingError> {
    ids.get(key).copied().ok_or_else(|| {
        TicketingError::ConfigurationError(format!("Seed references unknown {} '{}'", kind, key))
    })
}
