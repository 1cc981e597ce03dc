// Unit tests for the ticket create policy

use crate::common::*;
use ticket_desk::core::errors::TicketingError;
use ticket_desk::core::models::{Role, TicketPriority, TicketStatus};
use ticket_desk::policy::{create_ticket, CreateTicket};
use ticket_desk::store::TicketStore;
use uuid::Uuid;

fn request(organization_id: Option<Uuid>) -> CreateTicket {
    CreateTicket {
        title: "A".to_string(),
        description: "B".to_string(),
        priority: None,
        organization_id,
    }
}

#[tokio::test]
async fn test_client_creates_in_own_org() {
    let fx = Fixture::new().await;
    let principal = principal_of(&fx.client_sub);

    let ticket = create_ticket(fx.store.as_ref(), &principal, request(None)).await.unwrap();

    assert_eq!(ticket.organization_id, fx.org1);
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.created_by_id, principal.id);
    assert_eq!(ticket.priority, TicketPriority::Medium);
    assert_eq!(ticket.assigned_expert_id, None);
    assert_eq!(fx.store.find_ticket(ticket.id).await.unwrap(), Some(ticket));
}

#[tokio::test]
async fn test_client_naming_own_org_is_fine() {
    let fx = Fixture::new().await;
    let principal = principal_of(&fx.client_admin);

    let mut req = request(Some(fx.org1));
    req.priority = Some(TicketPriority::Urgent);
    let ticket = create_ticket(fx.store.as_ref(), &principal, req).await.unwrap();

    assert_eq!(ticket.organization_id, fx.org1);
    assert_eq!(ticket.priority, TicketPriority::Urgent);
}

#[tokio::test]
async fn test_client_cannot_target_foreign_org() {
    let fx = Fixture::new().await;
    let principal = principal_of(&fx.client_sub);

    let err = create_ticket(fx.store.as_ref(), &principal, request(Some(fx.org2)))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketingError::Forbidden(_)));
}

#[tokio::test]
async fn test_client_who_is_also_admin_may_target_foreign_org() {
    let fx = Fixture::new().await;
    let hybrid = create_test_user("hybrid@acme.test", &[Role::ClientAdmin, Role::PlatformAdmin], Some(fx.org1));
    fx.store.put_user(hybrid.clone()).await.unwrap();

    let ticket = create_ticket(fx.store.as_ref(), &principal_of(&hybrid), request(Some(fx.org2)))
        .await
        .unwrap();
    assert_eq!(ticket.organization_id, fx.org2);
}

#[tokio::test]
async fn test_client_without_org_is_rejected() {
    let fx = Fixture::new().await;
    let err = create_ticket(fx.store.as_ref(), &principal_of(&fx.client_no_org), request(None))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketingError::OrganizationRequired(_)));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_admin_must_supply_org() {
    let fx = Fixture::new().await;
    for admin in [&fx.platform_admin, &fx.operation_admin] {
        let err = create_ticket(fx.store.as_ref(), &principal_of(admin), request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::OrganizationRequired(_)));
    }
}

#[tokio::test]
async fn test_admin_creates_for_named_org() {
    let fx = Fixture::new().await;
    let principal = principal_of(&fx.operation_admin);

    let ticket = create_ticket(fx.store.as_ref(), &principal, request(Some(fx.org2)))
        .await
        .unwrap();
    assert_eq!(ticket.organization_id, fx.org2);
    assert_eq!(ticket.created_by_id, fx.operation_admin.id);
}

#[tokio::test]
async fn test_unknown_org_is_not_found() {
    let fx = Fixture::new().await;
    let missing = Uuid::new_v4();

    let err = create_ticket(fx.store.as_ref(), &principal_of(&fx.platform_admin), request(Some(missing)))
        .await
        .unwrap_err();
    match err {
        TicketingError::OrganizationNotFound(id) => assert_eq!(id, missing),
        other => panic!("Expected OrganizationNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_roles_need_org() {
    let fx = Fixture::new().await;
    let err = create_ticket(fx.store.as_ref(), &principal_of(&fx.expert), request(None))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketingError::OrganizationRequired(_)));
}

#[tokio::test]
async fn test_deleted_user_is_principal_not_found() {
    let fx = Fixture::new().await;
    let principal = principal_of(&fx.client_sub);
    fx.store.remove_user(fx.client_sub.id).await;

    let err = create_ticket(fx.store.as_ref(), &principal, request(None)).await.unwrap_err();
    assert!(matches!(err, TicketingError::PrincipalNotFound));
}

#[tokio::test]
async fn test_stored_organization_is_used() {
    let fx = Fixture::new().await;
    // Moved to org2 after the principal was built
    let mut moved = fx.client_sub.clone();
    moved.organization_id = Some(fx.org2);
    fx.store.put_user(moved).await.unwrap();

    let ticket = create_ticket(fx.store.as_ref(), &principal_of(&fx.client_sub), request(None))
        .await
        .unwrap();
    assert_eq!(ticket.organization_id, fx.org2);
}

#[tokio::test]
async fn test_blank_fields_rejected() {
    let fx = Fixture::new().await;
    let principal = principal_of(&fx.client_sub);

    let mut blank_title = request(None);
    blank_title.title = "   ".to_string();
    let err = create_ticket(fx.store.as_ref(), &principal, blank_title).await.unwrap_err();
    assert!(matches!(err, TicketingError::ValidationFailed(_)));

    let mut blank_description = request(None);
    blank_description.description = String::new();
    let err = create_ticket(fx.store.as_ref(), &principal, blank_description).await.unwrap_err();
    assert!(matches!(err, TicketingError::ValidationFailed(_)));
}

#[tokio::test]
async fn test_storage_failure_is_internal() {
    let store = FailingStore;
    let user = create_test_user("x@acme.test", &[Role::ClientSubUser], Some(Uuid::new_v4()));

    let err = create_ticket(&store, &principal_of(&user), request(None)).await.unwrap_err();
    assert!(matches!(err, TicketingError::StorageError(_)));
    assert_eq!(err.user_message(), "Internal error");
}
