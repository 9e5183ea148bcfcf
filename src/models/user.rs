//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// Subscription tier, synced from billing webhook events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Free,
    Premium,
}

impl SubscriptionStatus {
    pub fn is_premium(self) -> bool {
        matches!(self, SubscriptionStatus::Premium)
    }
}

/// User profile row in the `users` table.
///
/// The row is created by the auth flow; this service reads it for the
/// chosen deck and signup timestamp, and updates it on profile edits and
/// subscription webhook events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth-provider user id (opaque UUID string)
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(default = "default_status")]
    pub subscription_status: SubscriptionStatus,
    /// Date premium began ("YYYY-MM-DD"); None for free tier
    pub premium_start_date: Option<chrono::NaiveDate>,
    /// Deck the user draws from; None until they pick one
    pub chosen_deck_id: Option<i64>,
    /// Billing customer reference set at checkout
    pub stripe_customer_id: Option<String>,
    /// Signup timestamp (RFC 3339) - anchors the free-tier retention window
    pub created_at: String,
    #[serde(default)]
    pub last_login: Option<String>,
}

fn default_status() -> SubscriptionStatus {
    SubscriptionStatus::Free
}

/// Patch shape for profile edits; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_deck_id: Option<i64>,
}
