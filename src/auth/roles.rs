// Role groups and the any-of role check

use crate::core::models::{Principal, Role};

/// Tenant-scoped client roles
pub const CLIENT_ROLES: &[Role] = &[Role::ClientAdmin, Role::ClientSubUser];

/// Admins allowed to act on behalf of any organization
pub const ELEVATED_ADMIN_ROLES: &[Role] = &[Role::PlatformAdmin, Role::OperationAdmin];

/// Roles that see every ticket
pub const UNRESTRICTED_VIEW_ROLES: &[Role] =
    &[Role::PlatformAdmin, Role::OperationAdmin, Role::Sdm];

/// Roles that see tickets assigned to them
pub const ASSIGNMENT_ROLES: &[Role] = &[Role::Expert, Role::Tdm];

/// Roles allowed on `POST /api/tickets`
pub const CREATE_TICKET_ROLES: &[Role] = &[
    Role::ClientAdmin,
    Role::ClientSubUser,
    Role::PlatformAdmin,
    Role::OperationAdmin,
];

/// Roles allowed on the ticket read routes
pub const VIEW_TICKET_ROLES: &[Role] = &Role::ALL;

/// True when no roles are required or the principal holds any of them
pub fn authorize(principal: &Principal, required: &[Role]) -> bool {
    required.is_empty() || principal.has_any_role(required)
}
