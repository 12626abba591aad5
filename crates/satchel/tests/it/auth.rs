//! tests for the authorization flow

use crate::utils::TestController;
use satchel::{
    store::{MemoryBackend, StorageBackend},
    StateError,
};
use satchel_core::{
    auth::{AuthResponse, AuthorizedAccountsDiff},
    request::AuthorizePayload,
};
use std::sync::Arc;
use tokio::sync::oneshot;

fn payload(name: &str) -> AuthorizePayload {
    AuthorizePayload { origin: name.to_string() }
}

#[tokio::test]
async fn second_request_for_same_origin_is_a_duplicate() {
    let t = TestController::new();

    let (tx, _rx) = oneshot::channel();
    t.state
        .authorize_url("https://dapp.test/app", "req-1", payload("dapp"), tx)
        .await
        .unwrap();

    // same origin, different path and id
    let (tx, _rx) = oneshot::channel();
    let err = t
        .state
        .authorize_url("https://dapp.test/other", "req-2", payload("dapp"), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::DuplicateRequest(_)), "{err}");
    assert_eq!(t.state.auth_requests_number().unwrap(), 1);
}

#[tokio::test]
async fn decided_origin_short_circuits_without_enqueueing() {
    let t = TestController::new();
    t.state
        .add_authorized_url("req-0", "dapp", "https://dapp.test/app", vec!["5Alice".into()])
        .unwrap();

    let (tx, rx) = oneshot::channel();
    t.state
        .authorize_url("https://dapp.test/elsewhere", "req-1", payload("dapp"), tx)
        .await
        .unwrap();

    let response = rx.await.unwrap();
    assert_eq!(response, AuthResponse { authorized_accounts: vec![], result: false });
    assert_eq!(t.state.auth_requests_number().unwrap(), 0);
}

#[tokio::test]
async fn decided_origin_with_empty_account_scope_still_short_circuits() {
    let t = TestController::new();
    t.state.add_authorized_url("req-0", "dapp", "https://dapp.test", vec![]).unwrap();

    let (tx, rx) = oneshot::channel();
    t.state.authorize_url("https://dapp.test", "req-1", payload("dapp"), tx).await.unwrap();

    let response = rx.await.unwrap();
    assert!(!response.result);
    assert!(response.authorized_accounts.is_empty());
    assert_eq!(t.state.auth_requests_number().unwrap(), 0);
}

#[tokio::test]
async fn legacy_entry_without_grant_is_rejected() {
    // an entry written before account scoping, never re-approved
    let backend = Arc::new(MemoryBackend::default());
    let document = serde_json::json!({
        "https://legacy.example": {
            "id": "1",
            "origin": "Legacy dapp",
            "url": "https://legacy.example",
            "lastAuth": 0,
            "count": 3
        }
    });
    backend.write("auth_urls", &serde_json::to_vec(&document).unwrap()).unwrap();
    let t = TestController::with_backend(backend);

    let (tx, _rx) = oneshot::channel();
    let err = t
        .state
        .authorize_url("https://legacy.example", "req-1", payload("legacy"), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::NotAuthorized(_)), "{err}");
}

#[tokio::test]
async fn legacy_allowed_entry_short_circuits() {
    let backend = Arc::new(MemoryBackend::default());
    let document = serde_json::json!({
        "https://legacy.example": {
            "id": "1",
            "origin": "Legacy dapp",
            "url": "https://legacy.example",
            "lastAuth": 0,
            "isAllowed": true
        }
    });
    backend.write("auth_urls", &serde_json::to_vec(&document).unwrap()).unwrap();
    let t = TestController::with_backend(backend);

    let (tx, rx) = oneshot::channel();
    t.state
        .authorize_url("https://legacy.example", "req-1", payload("legacy"), tx)
        .await
        .unwrap();
    assert!(!rx.await.unwrap().result);
}

#[tokio::test]
async fn add_authorized_url_normalizes_to_origin_and_seeds_default_selection() {
    let t = TestController::new();
    let accounts = vec!["5Alice".to_string(), "5Bob".to_string()];
    t.state
        .add_authorized_url("req-1", "dapp", "https://a.example/page?tab=1", accounts.clone())
        .unwrap();

    let urls = t.state.auth_urls().unwrap();
    assert_eq!(urls.len(), 1);
    let entry = &urls["https://a.example"];
    assert_eq!(entry.url, "https://a.example");
    assert_eq!(entry.accounts(), accounts.as_slice());
    assert!(entry.grants_access());

    assert_eq!(t.state.default_auth_account_selection().unwrap(), accounts);
}

#[tokio::test]
async fn remove_authorization_requires_a_known_origin() {
    let t = TestController::new();
    t.state.add_authorized_url("1", "a", "https://a.example", vec!["5Alice".into()]).unwrap();
    t.state.add_authorized_url("2", "b", "https://b.example", vec!["5Alice".into()]).unwrap();

    let err = t.state.remove_authorization("https://c.example").unwrap_err();
    assert!(matches!(err, StateError::UnknownOrigin(_)), "{err}");

    let remaining = t.state.remove_authorization("https://a.example/deep/path").unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.contains_key("https://b.example"));
}

#[tokio::test]
async fn ensure_url_authorized_checks_existence_only() {
    let t = TestController::new();

    let err = t.state.ensure_url_authorized("https://a.example").unwrap_err();
    assert!(matches!(err, StateError::NotEnabled(_)), "{err}");

    // an empty account scope is still an existing authorization
    t.state.add_authorized_url("1", "a", "https://a.example", vec![]).unwrap();
    t.state.ensure_url_authorized("https://a.example/sub").unwrap();
}

#[tokio::test]
async fn update_authorized_accounts_merges_and_creates() {
    let t = TestController::new();
    t.state.add_authorized_url("1", "a", "https://a.example", vec!["5Alice".into()]).unwrap();
    let before = t.state.auth_urls().unwrap()["https://a.example"].clone();

    let mut diff = AuthorizedAccountsDiff::new();
    diff.insert("https://a.example/settings".to_string(), vec!["5Bob".to_string()]);
    diff.insert("https://new.example".to_string(), vec!["5Alice".to_string()]);
    t.state.update_authorized_accounts(diff).unwrap();

    let urls = t.state.auth_urls().unwrap();
    let updated = &urls["https://a.example"];
    assert_eq!(updated.accounts(), ["5Bob".to_string()].as_slice());
    // identity fields survive the account-scope merge
    assert_eq!(updated.id, before.id);
    assert_eq!(updated.origin, before.origin);

    assert_eq!(urls["https://new.example"].accounts(), ["5Alice".to_string()].as_slice());
}

#[tokio::test]
async fn update_authorized_date_refreshes_known_entries_only() {
    let t = TestController::new();
    t.state.add_authorized_url("1", "a", "https://a.example", vec!["5Alice".into()]).unwrap();
    let before = t.state.auth_urls().unwrap()["https://a.example"].last_auth;

    t.state.update_authorized_date("https://a.example/revisit").unwrap();
    let after = t.state.auth_urls().unwrap()["https://a.example"].last_auth;
    assert!(after >= before);

    // unknown origins are not implicitly created
    t.state.update_authorized_date("https://unknown.example").unwrap();
    assert_eq!(t.state.auth_urls().unwrap().len(), 1);
}

#[tokio::test]
async fn removing_a_request_cancels_its_responder() {
    let t = TestController::new();

    let (tx, rx) = oneshot::channel();
    t.state.authorize_url("https://dapp.test", "req-1", payload("dapp"), tx).await.unwrap();

    t.state.remove_auth_request("req-1").await.unwrap();
    assert_eq!(t.state.auth_requests_number().unwrap(), 0);
    // the channel closed without a decision
    assert!(rx.await.is_err());
}

#[tokio::test]
async fn responding_delivers_the_decision_once() {
    let t = TestController::new();

    let (tx, rx) = oneshot::channel();
    t.state.authorize_url("https://dapp.test", "req-1", payload("dapp"), tx).await.unwrap();

    let granted = AuthResponse::granted(vec!["5Alice".to_string()]);
    assert!(t.state.respond_auth_request("req-1", granted.clone()));
    assert_eq!(rx.await.unwrap(), granted);

    // the responder is gone afterwards
    assert!(!t.state.respond_auth_request("req-1", AuthResponse::already_decided()));
}

#[tokio::test]
async fn removing_an_absent_request_is_a_no_op() {
    let t = TestController::new();
    t.state.remove_auth_request("missing").await.unwrap();
    assert_eq!(t.state.auth_requests_number().unwrap(), 0);
}

#[tokio::test]
async fn connected_tabs_are_filtered_to_authorized_origins() {
    let t = TestController::new();
    t.state.add_authorized_url("1", "a", "https://a.example", vec!["5Alice".into()]).unwrap();

    let tabs = vec![
        "https://a.example/app".to_string(),
        "https://stranger.example/".to_string(),
        "not a url".to_string(),
    ];
    t.state.update_current_tabs_url(&tabs).unwrap();

    assert_eq!(t.state.connected_tabs_url(), vec!["https://a.example".to_string()]);
}

#[tokio::test]
async fn pending_auth_request_is_retrievable_by_id() {
    let t = TestController::new();

    let (tx, _rx) = oneshot::channel();
    t.state.authorize_url("https://dapp.test/app", "req-1", payload("dapp"), tx).await.unwrap();

    let request = t.state.get_auth_request("req-1").unwrap().unwrap();
    assert_eq!(request.origin, "https://dapp.test");
    assert_eq!(request.url, "https://dapp.test/app");
    assert_eq!(request.payload.origin, "dapp");

    assert!(t.state.get_auth_request("req-2").unwrap().is_none());
}
