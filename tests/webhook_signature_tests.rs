// SPDX-License-Identifier: MIT

//! Webhook endpoint tests, end-to-end through the router.
//!
//! Signature verification has its own unit tests; here we check the HTTP
//! contract: rejection codes, the always-200 for authentic-but-unhandled
//! events, and the 500 retry signal when the store is down.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

mod common;

fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn signed_request(secret: &str, body: &str) -> Request<Body> {
    let timestamp = Utc::now().timestamp();
    let signature = sign(secret, timestamp, body.as_bytes());

    Request::builder()
        .method("POST")
        .uri("/webhook/stripe")
        .header("Stripe-Signature", format!("t={},v1={}", timestamp, signature))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_missing_signature_header_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook/stripe")
                .body(Body::from(r#"{"type":"customer.subscription.updated"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let (app, _) = common::create_test_app();
    let body = r#"{"type":"customer.subscription.updated"}"#;

    // Signed with the wrong secret
    let response = app
        .oneshot(signed_request("whsec_wrong_secret", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unhandled_event_acknowledged() {
    let (app, state) = common::create_test_app();
    let body = r#"{"type":"charge.succeeded","data":{"object":{}}}"#;

    let response = app
        .oneshot(signed_request(&state.config.stripe_webhook_secret, body))
        .await
        .unwrap();

    // Authentic events we don't act on still get 200 so Stripe stops
    // retrying
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unparseable_authentic_payload_acknowledged() {
    let (app, state) = common::create_test_app();
    let body = "not json at all";

    let response = app
        .oneshot(signed_request(&state.config.stripe_webhook_secret, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_subscription_event_store_failure_returns_500() {
    let (app, state) = common::create_test_app();
    let body = r#"{
        "type": "customer.subscription.updated",
        "data": {
            "object": {
                "customer": "cus_test123",
                "status": "active"
            }
        }
    }"#;

    let response = app
        .oneshot(signed_request(&state.config.stripe_webhook_secret, body))
        .await
        .unwrap();

    // The offline mock store errors, which must surface as 500 so Stripe
    // retries the delivery
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_non_active_subscription_ignored() {
    let (app, state) = common::create_test_app();
    let body = r#"{
        "type": "customer.subscription.created",
        "data": {
            "object": {
                "customer": "cus_test123",
                "status": "incomplete"
            }
        }
    }"#;

    let response = app
        .oneshot(signed_request(&state.config.stripe_webhook_secret, body))
        .await
        .unwrap();

    // Non-active states never touch the store, so the mock can't fail
    assert_eq!(response.status(), StatusCode::OK);
}
