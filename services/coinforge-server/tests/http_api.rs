//! HTTP API Integration Tests
//!
//! Drives the full router against an in-memory ledger, verifying the wire
//! contract of every endpoint: success bodies, each business-failure
//! comment, and the health probe.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use coinforge_billing::{Billing, LedgerStore, MemoryLedger};
use coinforge_server::router;
use serde_json::{json, Value};
use tower::ServiceExt;

/// A router over a fresh ledger seeded with the stock roster
async fn test_router() -> Router {
    let store = Arc::new(MemoryLedger::new());
    store.add_user("boris", 5000).await.unwrap();
    store.add_user("maria", 1000).await.unwrap();
    store.add_user("oleg", 800).await.unwrap();
    router(Billing::new(store))
}

/// Make a request and decode the JSON response
async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    let body = match body {
        Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
        None => Body::empty(),
    };
    let request = request.body(body).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));

    (status, json)
}

async fn emit(router: &Router, amount: u64) -> (StatusCode, Value) {
    json_request(
        router,
        "POST",
        "/api/v1/coins/emission",
        Some(json!({ "amount": amount })),
    )
    .await
}

async fn move_coins(router: &Router, src: &str, dst: &str, amount: u64) -> (StatusCode, Value) {
    json_request(
        router,
        "POST",
        "/api/v1/coins/move",
        Some(json!({ "src_user": src, "dst_user": dst, "amount": amount })),
    )
    .await
}

#[tokio::test]
async fn test_health_probe() {
    let router = test_router().await;
    let (status, json) = json_request(&router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "coinforge-server");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_users_start_with_empty_wallets() {
    let router = test_router().await;
    let (status, json) = json_request(&router, "GET", "/api/v1/users", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            { "name": "boris", "amount": 0 },
            { "name": "maria", "amount": 0 },
            { "name": "oleg", "amount": 0 },
        ])
    );
}

#[tokio::test]
async fn test_emission_distributes_by_rating() {
    let router = test_router().await;
    let (status, json) = emit(&router, 10).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["comment"], "10 coins distributed successfully");

    let (_, users) = json_request(&router, "GET", "/api/v1/users", None).await;
    assert_eq!(
        users,
        json!([
            { "name": "boris", "amount": 6 },
            { "name": "maria", "amount": 2 },
            { "name": "oleg", "amount": 2 },
        ])
    );
}

#[tokio::test]
async fn test_emission_below_user_count_fails_with_minimum() {
    let router = test_router().await;
    let (status, json) = emit(&router, 2).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "failed");
    assert_eq!(
        json["comment"],
        "coin amount must be at least the user count (3)"
    );

    let (_, users) = json_request(&router, "GET", "/api/v1/users", None).await;
    for user in users.as_array().unwrap() {
        assert_eq!(user["amount"], 0);
    }
}

#[tokio::test]
async fn test_move_reports_the_transfer() {
    let router = test_router().await;
    emit(&router, 10).await;

    let (status, json) = move_coins(&router, "boris", "maria", 3).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["comment"], "boris sent 3 coins to maria");

    let (_, users) = json_request(&router, "GET", "/api/v1/users", None).await;
    assert_eq!(
        users,
        json!([
            { "name": "boris", "amount": 3 },
            { "name": "maria", "amount": 5 },
            { "name": "oleg", "amount": 2 },
        ])
    );
}

#[tokio::test]
async fn test_move_of_one_coin_reads_singular() {
    let router = test_router().await;
    emit(&router, 10).await;

    let (_, json) = move_coins(&router, "boris", "oleg", 1).await;
    assert_eq!(json["comment"], "boris sent 1 coin to oleg");
}

#[tokio::test]
async fn test_move_to_unknown_user_names_the_offender() {
    let router = test_router().await;
    emit(&router, 10).await;

    let (status, json) = move_coins(&router, "boris", "nadia", 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "failed");
    assert_eq!(json["comment"], "user 'nadia' could not be found");

    let (_, json) = move_coins(&router, "igor", "maria", 1).await;
    assert_eq!(json["comment"], "user 'igor' could not be found");
}

#[tokio::test]
async fn test_move_beyond_balance_reports_both_counts() {
    let router = test_router().await;
    emit(&router, 10).await;

    let (status, json) = move_coins(&router, "oleg", "maria", 5).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "failed");
    assert_eq!(json["comment"], "user 'oleg' owns only 2 coins, cannot send 5");

    // Nothing moved.
    let (_, users) = json_request(&router, "GET", "/api/v1/users", None).await;
    assert_eq!(users[2], json!({ "name": "oleg", "amount": 2 }));
}

#[tokio::test]
async fn test_move_of_zero_coins_fails() {
    let router = test_router().await;
    emit(&router, 10).await;

    let (status, json) = move_coins(&router, "boris", "maria", 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "failed");
    assert_eq!(json["comment"], "transfer amount must be positive");
}

#[tokio::test]
async fn test_longest_history_on_empty_ledger_is_the_sentinel() {
    let router = test_router().await;
    let (status, json) = json_request(&router, "GET", "/api/v1/coins/longest-history", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "id": 0, "history": "" }));
}

#[tokio::test]
async fn test_longest_history_follows_the_travelling_coin() {
    let router = test_router().await;
    emit(&router, 10).await;

    // Boris's oldest coin (id 1) moves along the whole roster.
    move_coins(&router, "boris", "maria", 1).await;
    move_coins(&router, "maria", "oleg", 1).await;

    let (status, json) = json_request(&router, "GET", "/api/v1/coins/longest-history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "id": 1, "history": "boris;maria;oleg" }));
}

#[tokio::test]
async fn test_malformed_json_is_a_transport_error() {
    let router = test_router().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/coins/emission")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
