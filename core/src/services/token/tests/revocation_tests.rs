//! Unit tests for owner-scoped revocation

use std::sync::Arc;

use crate::domain::entities::{Role, TokenClass};
use crate::errors::DomainError;
use crate::services::token::{RevocationService, RevokeRequest};

use super::support::Harness;

#[tokio::test]
async fn test_request_without_selector_is_invalid() {
    let h = Harness::new().await;
    let service = RevocationService::new(h.credentials.clone());
    h.sessions.login(h.owner.id).await.unwrap();

    let result = service.revoke(h.owner.id, RevokeRequest::default()).await;

    assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    assert_eq!(h.credentials.live_count(h.owner.id).await, 2);
}

#[tokio::test]
async fn test_request_with_both_selectors_is_invalid() {
    let h = Harness::new().await;
    let service = RevocationService::new(h.credentials.clone());
    let pair = h.sessions.login(h.owner.id).await.unwrap();

    let request = RevokeRequest {
        token_ids: Some(vec![pair.access_credential_id]),
        all: true,
        except_id: None,
    };
    let result = service.revoke(h.owner.id, request).await;

    assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    assert_eq!(h.credentials.live_count(h.owner.id).await, 2);
}

#[tokio::test]
async fn test_empty_id_list_revokes_nothing() {
    let h = Harness::new().await;
    let service = RevocationService::new(h.credentials.clone());
    h.sessions.login(h.owner.id).await.unwrap();

    let revoked = service
        .revoke(h.owner.id, RevokeRequest::tokens(Vec::new()))
        .await
        .unwrap();

    assert_eq!(revoked, 0);
    assert_eq!(h.credentials.live_count(h.owner.id).await, 2);
}

#[tokio::test]
async fn test_revoke_all_is_idempotent() {
    let h = Harness::new().await;
    let service = RevocationService::new(h.credentials.clone());
    let pair = h.sessions.login(h.owner.id).await.unwrap();
    h.sessions.issue_password_reset(h.owner.id).await.unwrap();

    assert_eq!(service.revoke(h.owner.id, RevokeRequest::all()).await.unwrap(), 3);
    assert_eq!(service.revoke(h.owner.id, RevokeRequest::all()).await.unwrap(), 0);
    assert!(h.sessions.authenticate(&pair.access_token).await.is_err());
}

#[tokio::test]
async fn test_revoke_all_without_credentials() {
    let h = Harness::new().await;
    let service = RevocationService::new(h.credentials.clone());

    let revoked = service.revoke(h.owner.id, RevokeRequest::all()).await.unwrap();
    assert_eq!(revoked, 0);
}

#[tokio::test]
async fn test_revocation_never_crosses_owners() {
    let h = Harness::new().await;
    let service = RevocationService::new(h.credentials.clone());
    let other = h.add_owner("client@agency.test", Role::Client).await;
    let theirs = h.sessions.login(other.id).await.unwrap();

    let revoked = service
        .revoke(
            h.owner.id,
            RevokeRequest::tokens(vec![theirs.access_credential_id, theirs.refresh_credential_id]),
        )
        .await
        .unwrap();

    assert_eq!(revoked, 0);
    h.sessions.authenticate(&theirs.access_token).await.unwrap();
    assert_eq!(h.credentials.live_count(other.id).await, 2);
}

#[tokio::test]
async fn test_except_keeps_one_credential() {
    let h = Harness::new().await;
    let service = RevocationService::new(h.credentials.clone());
    let current = h.sessions.login(h.owner.id).await.unwrap();
    let elsewhere = h.sessions.login(h.owner.id).await.unwrap();

    let revoked = service
        .revoke(
            h.owner.id,
            RevokeRequest::all().except(current.access_credential_id),
        )
        .await
        .unwrap();

    assert_eq!(revoked, 3);
    h.sessions.authenticate(&current.access_token).await.unwrap();
    assert!(h.sessions.authenticate(&elsewhere.access_token).await.is_err());
    assert!(h.sessions.refresh(&current.refresh_token).await.is_err());
}

#[tokio::test]
async fn test_revoke_selected_ids() {
    let h = Harness::new().await;
    let service = RevocationService::new(Arc::clone(&h.credentials));
    let pair = h.sessions.login(h.owner.id).await.unwrap();

    let revoked = service
        .revoke(h.owner.id, RevokeRequest::tokens(vec![pair.refresh_credential_id]))
        .await
        .unwrap();

    assert_eq!(revoked, 1);
    let refresh = h.credentials.snapshot(pair.refresh_credential_id).await.unwrap();
    assert_eq!(refresh.class, TokenClass::Refresh);
    assert!(refresh.is_revoked());
    h.sessions.authenticate(&pair.access_token).await.unwrap();
}
