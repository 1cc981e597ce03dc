// Property tests for the ticket visibility rules

use crate::common::create_test_ticket;
use proptest::prelude::*;
use std::collections::BTreeSet;
use ticket_desk::auth::roles::{
    ASSIGNMENT_ROLES, CLIENT_ROLES, ELEVATED_ADMIN_ROLES, UNRESTRICTED_VIEW_ROLES,
};
use ticket_desk::core::errors::TicketingError;
use ticket_desk::core::models::{Principal, Role, TicketScope};
use ticket_desk::policy::{can_view, resolve_ticket_organization, ticket_scope};
use uuid::Uuid;

fn role_set() -> impl Strategy<Value = BTreeSet<Role>> {
    prop::collection::btree_set(prop::sample::select(Role::ALL.to_vec()), 0..=Role::ALL.len())
}

fn principal(roles: BTreeSet<Role>) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        email: "prop@desk.test".to_string(),
        roles,
    }
}

proptest! {
    #[test]
    fn listed_tickets_are_always_readable(
        roles in role_set(),
        has_org in any::<bool>(),
        same_org in any::<bool>(),
        assigned_to_me in any::<bool>(),
    ) {
        let principal = principal(roles);
        let own_org = Uuid::new_v4();
        let ticket_org = if same_org { own_org } else { Uuid::new_v4() };
        let assignee = if assigned_to_me { Some(principal.id) } else { Some(Uuid::new_v4()) };
        let ticket = create_test_ticket("prop", ticket_org, Uuid::new_v4(), assignee, 0);
        let principal_org = has_org.then_some(own_org);

        if let Ok(scope) = ticket_scope(&principal, principal_org) {
            if scope.matches(&ticket) {
                prop_assert!(can_view(&principal, &ticket, principal_org));
            }
        }
    }

    #[test]
    fn unrestricted_roles_see_everything(roles in role_set(), has_org in any::<bool>()) {
        let principal = principal(roles);
        let principal_org = has_org.then(Uuid::new_v4);
        let ticket = create_test_ticket("prop", Uuid::new_v4(), Uuid::new_v4(), None, 0);

        if principal.has_any_role(UNRESTRICTED_VIEW_ROLES) {
            prop_assert!(can_view(&principal, &ticket, principal_org));
            if !principal.has_any_role(CLIENT_ROLES) && !principal.has_any_role(ASSIGNMENT_ROLES) {
                prop_assert_eq!(ticket_scope(&principal, principal_org).unwrap(), TicketScope::All);
            }
        }
    }

    #[test]
    fn narrow_roles_never_list_everything(roles in role_set(), has_org in any::<bool>()) {
        let principal = principal(roles);
        let principal_org = has_org.then(Uuid::new_v4);

        if principal.has_any_role(CLIENT_ROLES) || principal.has_any_role(ASSIGNMENT_ROLES) {
            if let Ok(scope) = ticket_scope(&principal, principal_org) {
                prop_assert_ne!(scope, TicketScope::All);
            }
        }
    }

    #[test]
    fn empty_role_set_sees_nothing(has_org in any::<bool>()) {
        let principal = principal(BTreeSet::new());
        let org = Uuid::new_v4();
        let principal_org = has_org.then_some(org);
        let ticket = create_test_ticket("prop", org, principal.id, Some(principal.id), 0);

        prop_assert!(!can_view(&principal, &ticket, principal_org));
        prop_assert!(matches!(
            ticket_scope(&principal, principal_org),
            Err(TicketingError::Forbidden(_))
        ));
    }

    #[test]
    fn non_admin_clients_stay_in_their_org(
        roles in role_set(),
        requested_foreign in any::<bool>(),
    ) {
        let mut roles = roles;
        roles.insert(Role::ClientSubUser);
        let principal = principal(roles);
        let own = Uuid::new_v4();
        let requested = if requested_foreign { Some(Uuid::new_v4()) } else { None };

        match resolve_ticket_organization(&principal, Some(own), requested) {
            Ok(org) => prop_assert!(org == own || principal.has_any_role(ELEVATED_ADMIN_ROLES)),
            Err(err) => {
                prop_assert!(requested_foreign);
                prop_assert!(matches!(err, TicketingError::Forbidden(_)));
            }
        }
    }
}
