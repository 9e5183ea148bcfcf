// SPDX-License-Identifier: MIT

//! Supabase (PostgREST) client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, subscription sync)
//! - Decks/Cards (immutable reference data)
//! - Daily pulls (one row per user per local day)
//!
//! The store is the single source of truth; this wrapper is a thin
//! request/response layer with no retries or local state. Uniqueness of
//! (user_id, pull_date) is enforced by the store's schema and surfaces
//! here as HTTP 409.

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::tables;
use crate::error::AppError;
use crate::models::user::ProfileChanges;
use crate::models::{Card, DailyPull, Deck, NewPull, SubscriptionStatus, UserProfile};

/// Pull rows are fetched with the card row embedded.
const PULL_SELECT: &str = "*,card:tarot_cards(*)";

/// Supabase database client.
#[derive(Clone)]
pub struct SupabaseDb {
    inner: Option<Inner>,
}

#[derive(Clone)]
struct Inner {
    http: reqwest::Client,
    rest_url: String,
}

impl SupabaseDb {
    /// Create a new client against a Supabase project.
    ///
    /// The service-role key is attached to every request; row-level
    /// security is the store's concern, ownership filters are ours.
    pub fn new(supabase_url: &str, service_key: &str) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(service_key)
            .map_err(|e| AppError::Database(format!("Invalid service key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", service_key))
            .map_err(|e| AppError::Database(format!("Invalid service key: {}", e)))?;
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Database(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner: Some(Inner {
                http,
                rest_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            }),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { inner: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_inner(&self) -> Result<&Inner, AppError> {
        self.inner
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Row Operations ──────────────────────────────────

    async fn request(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
        representation: bool,
    ) -> Result<reqwest::Response, AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/{}", inner.rest_url, table);

        let mut req = inner.http.request(method, &url).query(query);
        if representation {
            req = req.header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Database(format!("{}: {}", table, e)))?;

        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Err(AppError::Conflict("row already exists".to_string()));
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AppError::Database(format!(
                "{}: HTTP {}: {}",
                table, status, detail
            )));
        }

        Ok(resp)
    }

    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let resp = self.request(Method::GET, table, query, None, false).await?;
        resp.json()
            .await
            .map_err(|e| AppError::Database(format!("{}: decode: {}", table, e)))
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, AppError> {
        let mut query = query.to_vec();
        query.push(("limit", "1".to_string()));
        let mut rows = self.select_rows(table, &query).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn insert_row<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
        select: &str,
    ) -> Result<R, AppError> {
        let body = serde_json::to_value(row)
            .map_err(|e| AppError::Database(format!("{}: encode: {}", table, e)))?;
        let query = [("select", select.to_string())];

        let resp = self
            .request(Method::POST, table, &query, Some(&body), true)
            .await?;
        let mut rows: Vec<R> = resp
            .json()
            .await
            .map_err(|e| AppError::Database(format!("{}: decode: {}", table, e)))?;

        if rows.is_empty() {
            return Err(AppError::Database(format!(
                "{}: insert returned no representation",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    async fn update_rows<R: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        patch: serde_json::Value,
    ) -> Result<Vec<R>, AppError> {
        let resp = self
            .request(Method::PATCH, table, query, Some(&patch), true)
            .await?;
        resp.json()
            .await
            .map_err(|e| AppError::Database(format!("{}: decode: {}", table, e)))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by auth-provider id.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.select_one(tables::USERS, &[("id", format!("eq.{}", user_id))])
            .await
    }

    /// Apply profile edits (username, chosen deck).
    pub async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<Option<UserProfile>, AppError> {
        let patch = serde_json::to_value(changes)
            .map_err(|e| AppError::Database(format!("users: encode: {}", e)))?;
        let mut rows = self
            .update_rows(tables::USERS, &[("id", format!("eq.{}", user_id))], patch)
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Sync subscription state from a billing event, matched by the
    /// billing customer reference. Returns how many rows changed.
    pub async fn set_subscription_by_customer(
        &self,
        customer_id: &str,
        status: SubscriptionStatus,
        premium_start: Option<NaiveDate>,
    ) -> Result<usize, AppError> {
        let patch = serde_json::json!({
            "subscription_status": status,
            "premium_start_date": premium_start,
        });
        let rows: Vec<UserProfile> = self
            .update_rows(
                tables::USERS,
                &[("stripe_customer_id", format!("eq.{}", customer_id))],
                patch,
            )
            .await?;
        Ok(rows.len())
    }

    // ─── Reference Data ──────────────────────────────────────────

    /// All decks, ordered by id.
    pub async fn list_decks(&self) -> Result<Vec<Deck>, AppError> {
        self.select_rows(tables::DECKS, &[("order", "id.asc".to_string())])
            .await
    }

    /// All cards in a deck, ordered by card number.
    pub async fn list_cards(&self, deck_id: i64) -> Result<Vec<Card>, AppError> {
        self.select_rows(
            tables::CARDS,
            &[
                ("deck_id", format!("eq.{}", deck_id)),
                ("order", "card_number.asc".to_string()),
            ],
        )
        .await
    }

    // ─── Daily Pull Operations ───────────────────────────────────

    /// The pull dated `date` for a user, card embedded, if one exists.
    pub async fn get_pull_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPull>, AppError> {
        self.select_one(
            tables::PULLS,
            &[
                ("select", PULL_SELECT.to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("pull_date", format!("eq.{}", date)),
            ],
        )
        .await
    }

    /// Whether the user has any pull record at all.
    pub async fn has_any_pull(&self, user_id: &str) -> Result<bool, AppError> {
        let rows: Vec<serde_json::Value> = self
            .select_rows(
                tables::PULLS,
                &[
                    ("select", "id".to_string()),
                    ("user_id", format!("eq.{}", user_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Pulls dated on or after `since`, most recent first, cards embedded.
    pub async fn pulls_since(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<DailyPull>, AppError> {
        self.select_rows(
            tables::PULLS,
            &[
                ("select", PULL_SELECT.to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("pull_date", format!("gte.{}", since)),
                ("order", "pull_date.desc".to_string()),
            ],
        )
        .await
    }

    /// Insert today's pull. The store's unique (user_id, pull_date) index
    /// rejects a second pull for the same day with a conflict.
    pub async fn insert_pull(&self, pull: &NewPull) -> Result<DailyPull, AppError> {
        self.insert_row(tables::PULLS, pull, PULL_SELECT).await
    }

    /// Delete free-tier pulls older than the retention window. The cutoff
    /// logic lives in a store procedure so it stays next to the schema.
    pub async fn prune_expired_pulls(&self) -> Result<(), AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/rpc/delete_expired_free_user_pulls", inner.rest_url);

        let resp = inner
            .http
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AppError::Database(format!("prune: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AppError::Database(format!(
                "prune: HTTP {}: {}",
                status, detail
            )));
        }
        Ok(())
    }

    /// Replace the note on a pull; `None` clears it to NULL. Filtered by
    /// owner, so a foreign pull id comes back as None rather than touching
    /// another user's row.
    pub async fn update_pull_notes(
        &self,
        pull_id: &str,
        user_id: &str,
        notes: Option<&str>,
    ) -> Result<Option<DailyPull>, AppError> {
        let patch = serde_json::json!({
            "notes": notes,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        });
        let mut rows: Vec<DailyPull> = self
            .update_rows(
                tables::PULLS,
                &[
                    ("select", PULL_SELECT.to_string()),
                    ("id", format!("eq.{}", pull_id)),
                    ("user_id", format!("eq.{}", user_id)),
                ],
                patch,
            )
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }
}
