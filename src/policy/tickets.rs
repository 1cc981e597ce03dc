// Ticket create / read-one / list rules

use crate::auth::roles::{
    ASSIGNMENT_ROLES, CLIENT_ROLES, ELEVATED_ADMIN_ROLES, UNRESTRICTED_VIEW_ROLES,
};
use crate::core::errors::TicketingError;
use crate::core::models::{
    NewTicket, Principal, Role, Ticket, TicketPriority, TicketScope, User,
};
use crate::store::Store;
use tracing::{debug, info};
use uuid::Uuid;

/// Caller-supplied ticket fields. There is no status.
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub organization_id: Option<Uuid>,
}

/// Create a ticket on behalf of `principal`.
///
/// The organization is resolved server-side and must exist. The stored
/// ticket is always `OPEN` and created by `principal`.
pub async fn create_ticket(
    store: &dyn Store,
    principal: &Principal,
    request: CreateTicket,
) -> Result<Ticket, TicketingError> {
    let title = required_text("title", &request.title)?;
    let description = required_text("description", &request.description)?;

    let user = load_user(store, principal).await?;
    let organization_id =
        resolve_ticket_organization(principal, user.organization_id, request.organization_id)?;

    store
        .find_organization(organization_id)
        .await?
        .ok_or(TicketingError::OrganizationNotFound(organization_id))?;

    let ticket = store
        .insert_ticket(NewTicket {
            title,
            description,
            priority: request.priority.unwrap_or_default(),
            created_by_id: principal.id,
            organization_id,
        })
        .await?;

    info!(
        ticket_id = %ticket.id,
        organization_id = %ticket.organization_id,
        created_by = %principal.id,
        "Ticket created"
    );
    Ok(ticket)
}

/// Pick the organization a new ticket belongs to.
///
/// Client roles are pinned to their own organization; a different requested
/// id is only honored when the caller is also a platform or operation admin.
/// Everyone else must name the organization explicitly.
pub fn resolve_ticket_organization(
    principal: &Principal,
    user_organization: Option<Uuid>,
    requested: Option<Uuid>,
) -> Result<Uuid, TicketingError> {
    let is_elevated = principal.has_any_role(ELEVATED_ADMIN_ROLES);

    if principal.has_any_role(CLIENT_ROLES) {
        let own = user_organization.ok_or_else(|| {
            TicketingError::OrganizationRequired(
                "Client users must belong to an organization to create tickets.".to_string(),
            )
        })?;

        return match requested {
            Some(other) if other != own => {
                if is_elevated {
                    Ok(other)
                } else {
                    Err(TicketingError::Forbidden(
                        "You can only create tickets for your own organization.".to_string(),
                    ))
                }
            }
            _ => Ok(own),
        };
    }

    if is_elevated {
        return requested.ok_or_else(|| {
            TicketingError::OrganizationRequired(
                "Admins must specify an organization ID when creating a ticket.".to_string(),
            )
        });
    }

    requested.ok_or_else(|| {
        TicketingError::OrganizationRequired(
            "Organization ID is required for this user type to create a ticket.".to_string(),
        )
    })
}

/// Fetch one ticket if `principal` may see it
pub async fn read_ticket(
    store: &dyn Store,
    principal: &Principal,
    ticket_id: Uuid,
) -> Result<Ticket, TicketingError> {
    let ticket = store
        .find_ticket(ticket_id)
        .await?
        .ok_or_else(|| TicketingError::NotFound(format!("Ticket with ID {} not found", ticket_id)))?;

    let user = load_user(store, principal).await?;

    if can_view(principal, &ticket, user.organization_id) {
        Ok(ticket)
    } else {
        debug!(ticket_id = %ticket.id, user_id = %principal.id, "Ticket read denied");
        Err(TicketingError::Forbidden(
            "You do not have permission to view this ticket.".to_string(),
        ))
    }
}

/// Visibility rule for a single ticket, first match wins:
/// unrestricted roles, then assignment, then client organization.
pub fn can_view(principal: &Principal, ticket: &Ticket, principal_organization: Option<Uuid>) -> bool {
    if principal.has_any_role(UNRESTRICTED_VIEW_ROLES) {
        return true;
    }
    if principal.has_any_role(ASSIGNMENT_ROLES) && ticket.assigned_expert_id == Some(principal.id) {
        return true;
    }
    principal.has_any_role(CLIENT_ROLES)
        && principal_organization.is_some_and(|org| org == ticket.organization_id)
}

/// List every ticket `principal` may see, newest first
pub async fn list_tickets(
    store: &dyn Store,
    principal: &Principal,
) -> Result<Vec<Ticket>, TicketingError> {
    let user = load_user(store, principal).await?;
    let scope = ticket_scope(principal, user.organization_id)?;
    debug!(user_id = %principal.id, scope = ?scope, "Listing tickets");
    Ok(store.list_tickets(scope).await?)
}

/// Storage filter for the list operation.
///
/// The narrowest scope wins: client roles list their organization and
/// Expert/TDM list their assignments even when an unrestricted role is also
/// held. TDM falls back to its own assignments; managed-expert visibility is
/// not modeled.
pub fn ticket_scope(
    principal: &Principal,
    principal_organization: Option<Uuid>,
) -> Result<TicketScope, TicketingError> {
    if principal.has_any_role(CLIENT_ROLES) {
        return principal_organization
            .map(TicketScope::Organization)
            .ok_or_else(|| {
                TicketingError::Forbidden(
                    "Client user not associated with an organization.".to_string(),
                )
            });
    }
    if principal.has_role(Role::Expert) || principal.has_role(Role::Tdm) {
        return Ok(TicketScope::AssignedTo(principal.id));
    }
    if principal.has_any_role(UNRESTRICTED_VIEW_ROLES) {
        return Ok(TicketScope::All);
    }
    Err(TicketingError::Forbidden(
        "You do not have permission to view all tickets.".to_string(),
    ))
}

async fn load_user(store: &dyn Store, principal: &Principal) -> Result<User, TicketingError> {
    store
        .find_user_by_id(principal.id)
        .await?
        .ok_or(TicketingError::PrincipalNotFound)
}

fn required_text(field: &str, value: &str) -> Result<String, TicketingError> {
    if value.trim().is_empty() {
        return Err(TicketingError::ValidationFailed(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}
