// SPDX-License-Identifier: MIT

//! Daily pull model for storage and API.

use crate::models::Card;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the card was drawn: in-app random or a physical deck the user
/// transcribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullType {
    Digital,
    Physical,
}

impl std::fmt::Display for PullType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullType::Digital => write!(f, "digital"),
            PullType::Physical => write!(f, "physical"),
        }
    }
}

/// Stored pull record in the `daily_pulls` table.
///
/// The store enforces at most one row per (user_id, pull_date); everything
/// here assumes that invariant holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPull {
    pub id: String,
    pub user_id: String,
    pub card_id: i64,
    /// Local calendar day the pull belongs to (day granularity)
    pub pull_date: NaiveDate,
    pub pull_type: PullType,
    /// Free-text journal note, bounded length
    pub notes: Option<String>,
    pub is_reversed: bool,
    pub created_at: String,
    pub updated_at: String,
    /// Denormalized card row joined by the store query
    #[serde(default)]
    pub card: Option<Card>,
}

/// Insert shape for a new pull (ids and timestamps are store-assigned).
#[derive(Debug, Clone, Serialize)]
pub struct NewPull {
    pub user_id: String,
    pub card_id: i64,
    pub pull_date: NaiveDate,
    pub pull_type: PullType,
    pub notes: Option<String>,
    pub is_reversed: bool,
}
