// SPDX-License-Identifier: MIT

//! Webhook route for Stripe subscription events.
//!
//! Fire-and-forget state sync: lifecycle events map to the
//! `subscription_status` field on the user profile. Nothing downstream of
//! the core pull logic consumes these events.

use crate::models::SubscriptionStatus;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Reject events signed more than five minutes ago (replay window).
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook/stripe", post(handle_stripe_event))
}

/// Why a signature header was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum SignatureError {
    Malformed,
    Expired,
    Mismatch,
}

/// Parse a `Stripe-Signature` header: `t=<unix>,v1=<hex>[,v1=<hex>...]`.
fn parse_signature_header(header: &str) -> Result<(i64, Vec<Vec<u8>>), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => {
                let sig = hex::decode(value).map_err(|_| SignatureError::Malformed)?;
                signatures.push(sig);
            }
            _ => {} // Ignore other schemes (v0 etc.)
        }
    }

    match (timestamp, signatures.is_empty()) {
        (Some(t), false) => Ok((t, signatures)),
        _ => Err(SignatureError::Malformed),
    }
}

/// Verify a Stripe webhook signature over the raw request body.
///
/// The signed payload is `"{t}.{body}"`; comparison is constant-time.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let (timestamp, signatures) = parse_signature_header(header)?;

    if (now.timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    for signature in &signatures {
        if expected.ct_eq(&signature[..]).into() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

/// Stripe event envelope (only the fields this service reads).
#[derive(Deserialize, Debug)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Deserialize, Debug)]
struct StripeEventData {
    object: StripeObject,
}

#[derive(Deserialize, Debug, Default)]
struct StripeObject {
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Handle incoming Stripe events (POST).
///
/// Invalid signatures get 400. Authentic but unparseable payloads get 200
/// so Stripe stops retrying; store failures get 500 so it retries.
async fn handle_stripe_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(signature) = headers.get("stripe-signature").and_then(|h| h.to_str().ok()) else {
        tracing::warn!("Webhook rejected: missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    if let Err(reason) = verify_signature(
        &state.config.stripe_webhook_secret,
        signature,
        &body,
        Utc::now(),
    ) {
        tracing::warn!(?reason, "Webhook rejected: signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: StripeEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse webhook event");
            return StatusCode::OK;
        }
    };

    tracing::info!(
        event_type = %event.event_type,
        customer = ?event.data.object.customer,
        "Webhook event received"
    );

    match event.event_type.as_str() {
        "customer.subscription.created" | "customer.subscription.updated" => {
            let object = &event.data.object;
            let Some(customer) = object.customer.as_deref() else {
                tracing::warn!("Subscription event without customer reference");
                return StatusCode::OK;
            };

            // Only an active subscription grants premium; incomplete or
            // past_due states leave the profile untouched
            if object.status.as_deref() != Some("active") {
                tracing::debug!(
                    status = ?object.status,
                    "Ignoring subscription event in non-active state"
                );
                return StatusCode::OK;
            }

            match state
                .db
                .set_subscription_by_customer(
                    customer,
                    SubscriptionStatus::Premium,
                    Some(Utc::now().date_naive()),
                )
                .await
            {
                Ok(0) => {
                    tracing::warn!(customer, "No user matched billing customer");
                }
                Ok(_) => {
                    tracing::info!(customer, "User upgraded to premium");
                }
                Err(e) => {
                    tracing::error!(error = %e, customer, "Failed to apply subscription upgrade");
                    return StatusCode::INTERNAL_SERVER_ERROR;
                }
            }
        }
        "customer.subscription.deleted" => {
            let Some(customer) = event.data.object.customer.as_deref() else {
                tracing::warn!("Subscription deletion without customer reference");
                return StatusCode::OK;
            };

            match state
                .db
                .set_subscription_by_customer(customer, SubscriptionStatus::Free, None)
                .await
            {
                Ok(_) => {
                    tracing::info!(customer, "User downgraded to free tier");
                }
                Err(e) => {
                    tracing::error!(error = %e, customer, "Failed to apply subscription downgrade");
                    return StatusCode::INTERNAL_SERVER_ERROR;
                }
            }
        }
        "invoice.payment_failed" => {
            // Dunning is Stripe's job; surface it in the logs only
            tracing::warn!(
                customer = ?event.data.object.customer,
                "Payment failed for customer"
            );
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Ignoring unhandled event type");
        }
    }

    StatusCode::OK
}
