//! tests for the signing queue

use crate::utils::{raw_sign_payload, TestController};
use satchel_core::request::AccountInfo;

#[tokio::test]
async fn sign_request_round_trip_drives_the_badge() {
    let t = TestController::new();

    t.state
        .invoke_signature_request(
            "https://dapp.test",
            raw_sign_payload("5Alice"),
            AccountInfo::new("5Alice"),
            "s1",
        )
        .await
        .unwrap();

    assert_eq!(t.state.sign_requests_number().unwrap(), 1);
    assert_eq!(t.badge.last().as_deref(), Some("1"));

    t.state.remove_sign_request("s1").await.unwrap();
    assert_eq!(t.state.sign_requests_number().unwrap(), 0);
    assert_eq!(t.badge.last().as_deref(), Some(""));
}

#[tokio::test]
async fn sign_queue_preserves_insertion_order() {
    let t = TestController::new();

    for (id, address) in [("s1", "5Alice"), ("s2", "5Bob"), ("s3", "5Charlie")] {
        t.state
            .invoke_signature_request(
                "https://dapp.test",
                raw_sign_payload(address),
                AccountInfo::new(address),
                id,
            )
            .await
            .unwrap();
    }

    let requests = t.state.all_sign_requests().unwrap();
    let ids: Vec<_> = requests.iter().map(|request| request.id.as_str()).collect();
    assert_eq!(ids, ["s1", "s2", "s3"]);
    assert_eq!(t.badge.last().as_deref(), Some("3"));

    // removal targets exactly the given id
    t.state.remove_sign_request("s2").await.unwrap();
    let ids: Vec<_> = t
        .state
        .all_sign_requests()
        .unwrap()
        .into_iter()
        .map(|request| request.id)
        .collect();
    assert_eq!(ids, ["s1", "s3"]);
}

#[tokio::test]
async fn sign_request_is_retrievable_by_id() {
    let t = TestController::new();
    t.state
        .invoke_signature_request(
            "https://dapp.test",
            raw_sign_payload("5Alice"),
            AccountInfo::new("5Alice"),
            "s1",
        )
        .await
        .unwrap();

    let request = t.state.get_sign_request("s1").unwrap().unwrap();
    assert_eq!(request.account.address, "5Alice");
    assert_eq!(request.payload.address(), "5Alice");
    assert_eq!(request.url, "https://dapp.test");

    assert!(t.state.get_sign_request("nope").unwrap().is_none());
}

#[tokio::test]
async fn pending_auth_outranks_sign_count_on_the_badge() {
    let t = TestController::new();

    t.state
        .invoke_signature_request(
            "https://dapp.test",
            raw_sign_payload("5Alice"),
            AccountInfo::new("5Alice"),
            "s1",
        )
        .await
        .unwrap();
    assert_eq!(t.badge.last().as_deref(), Some("1"));

    let (tx, _rx) = tokio::sync::oneshot::channel();
    t.state
        .authorize_url(
            "https://other.test",
            "a1",
            satchel_core::request::AuthorizePayload { origin: "other".into() },
            tx,
        )
        .await
        .unwrap();
    assert_eq!(t.badge.last().as_deref(), Some("Auth"));

    // resolving the auth request falls back to the sign count
    t.state.remove_auth_request("a1").await.unwrap();
    assert_eq!(t.badge.last().as_deref(), Some("1"));
}
