// SPDX-License-Identifier: MIT

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::analytics::{aggregate_pulls, PullAggregate};
use crate::models::{DailyPull, Deck, NewPull, ProfileChanges, PullType, SubscriptionStatus};
use crate::services::daily::{
    local_day_key, resolve_eligibility, retention_days_remaining, PullEligibility,
    ANALYTICS_WINDOW_DAYS, DISPLAY_WINDOW_DAYS,
};
use crate::services::draw;
use crate::services::export::pulls_to_csv;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).patch(update_me))
        .route("/api/decks", get(get_decks))
        .route("/api/decks/{deck_id}/cards", get(get_deck_cards))
        .route("/api/pulls/today", get(get_today))
        .route("/api/pulls", post(create_pull).get(get_pulls))
        .route("/api/pulls/{pull_id}/notes", patch(update_notes))
        .route("/api/analytics", get(get_analytics))
        .route("/api/export.csv", get(export_csv))
}

/// Timezone context shared by the date-sensitive endpoints. Minutes east
/// of UTC; JS callers send `-new Date().getTimezoneOffset()`.
#[derive(Deserialize)]
struct TzQuery {
    #[serde(default)]
    tz_offset: i32,
}

/// Clamp a requested history window to 1..=60 days.
fn clamp_window(days: Option<i64>, default: i64) -> i64 {
    days.unwrap_or(default).clamp(1, ANALYTICS_WINDOW_DAYS)
}

/// First day of a window ending today, inclusive.
fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days - 1)
}

/// Trim a journal note; whitespace-only input means "no note".
fn normalize_notes(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub premium_start_date: Option<NaiveDate>,
    pub chosen_deck_id: Option<i64>,
    /// Days before history starts expiring; None on premium
    pub retention_days_remaining: Option<i64>,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(tz): Query<TzQuery>,
) -> Result<Json<MeResponse>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let retention = if profile.subscription_status.is_premium() {
        None
    } else {
        let today = local_day_key(Utc::now(), tz.tz_offset);
        retention_days_remaining(&profile.created_at, today, state.config.free_retention_days)
    };

    Ok(Json(MeResponse {
        id: profile.id,
        username: profile.username,
        email: profile.email,
        subscription_status: profile.subscription_status,
        premium_start_date: profile.premium_start_date,
        chosen_deck_id: profile.chosen_deck_id,
        retention_days_remaining: retention,
    }))
}

/// Profile edit request.
#[derive(Deserialize, Validate)]
struct UpdateMeRequest {
    #[validate(length(min = 3, max = 32))]
    username: Option<String>,
    chosen_deck_id: Option<i64>,
}

/// Update username and/or chosen deck.
///
/// Switching decks deliberately leaves existing pulls alone: the recorded
/// card of the day and its notes stay as drawn.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<MeResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if payload.username.is_none() && payload.chosen_deck_id.is_none() {
        return Err(AppError::BadRequest("No changes supplied".to_string()));
    }

    if let Some(deck_id) = payload.chosen_deck_id {
        let decks = state.db.list_decks().await?;
        if !decks.iter().any(|d| d.id == deck_id) {
            return Err(AppError::BadRequest(format!("Unknown deck: {}", deck_id)));
        }
    }

    let changes = ProfileChanges {
        username: payload.username,
        chosen_deck_id: payload.chosen_deck_id,
    };

    let profile = state
        .db
        .update_profile(&user.user_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    tracing::info!(user_id = %user.user_id, "Profile updated");

    Ok(Json(MeResponse {
        id: profile.id,
        username: profile.username,
        email: profile.email,
        subscription_status: profile.subscription_status,
        premium_start_date: profile.premium_start_date,
        chosen_deck_id: profile.chosen_deck_id,
        retention_days_remaining: None,
    }))
}

// ─── Reference Data ──────────────────────────────────────────

/// List available decks.
async fn get_decks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Deck>>> {
    Ok(Json(state.db.list_decks().await?))
}

/// List all cards in a deck (served from the reference-data cache).
async fn get_deck_cards(
    State(state): State<Arc<AppState>>,
    Path(deck_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let cards = state.catalog.cards_for_deck(&state.db, deck_id).await?;
    if cards.is_empty() {
        return Err(AppError::NotFound(format!("Deck {} has no cards", deck_id)));
    }
    Ok(Json(cards.as_ref().clone()))
}

// ─── Today's Pull ────────────────────────────────────────────

/// Today's pull state for the dashboard.
#[derive(Serialize)]
pub struct TodayResponse {
    /// The viewer's local calendar day the answer applies to
    pub date: NaiveDate,
    pub eligibility: PullEligibility,
    pub pull: Option<DailyPull>,
}

/// Resolve today's day key, eligibility, and pull (if drawn).
async fn get_today(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(tz): Query<TzQuery>,
) -> Result<Json<TodayResponse>> {
    let today = local_day_key(Utc::now(), tz.tz_offset);

    let todays_pull = state.db.get_pull_on(&user.user_id, today).await?;
    let has_history = if todays_pull.is_some() {
        true
    } else {
        state.db.has_any_pull(&user.user_id).await?
    };

    let eligibility = resolve_eligibility(today, todays_pull.as_ref(), has_history);

    tracing::debug!(
        user_id = %user.user_id,
        date = %today,
        ?eligibility,
        "Resolved today's pull state"
    );

    Ok(Json(TodayResponse {
        date: today,
        eligibility,
        pull: todays_pull,
    }))
}

// ─── Creating a Pull ─────────────────────────────────────────

/// Draw request. Digital pulls pick a random card from the chosen deck;
/// physical pulls record a card the user drew from a real deck.
#[derive(Deserialize, Validate)]
struct CreatePullRequest {
    pull_type: PullType,
    /// Required for physical pulls, ignored for digital
    card_id: Option<i64>,
    #[validate(length(max = 2000))]
    notes: Option<String>,
    #[serde(default)]
    is_reversed: bool,
    #[serde(default)]
    tz_offset: i32,
}

/// Create today's pull.
async fn create_pull(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreatePullRequest>,
) -> Result<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if payload.pull_type == PullType::Physical && payload.card_id.is_none() {
        return Err(AppError::BadRequest(
            "card_id is required for physical pulls".to_string(),
        ));
    }

    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let deck_id = profile
        .chosen_deck_id
        .ok_or_else(|| AppError::BadRequest("No deck selected".to_string()))?;

    let today = local_day_key(Utc::now(), payload.tz_offset);

    // Pre-check keeps the common double-submit out of the store; the
    // unique (user_id, pull_date) index still backstops the race
    if state.db.get_pull_on(&user.user_id, today).await?.is_some() {
        return Err(AppError::Conflict("Already pulled today".to_string()));
    }

    let cards = state.catalog.cards_for_deck(&state.db, deck_id).await?;

    let card_id = match payload.pull_type {
        PullType::Physical => {
            let card_id = payload.card_id.ok_or_else(|| {
                AppError::BadRequest("card_id is required for physical pulls".to_string())
            })?;
            cards
                .iter()
                .find(|c| c.id == card_id)
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Card {} does not belong to deck {}",
                        card_id, deck_id
                    ))
                })?
                .id
        }
        PullType::Digital => {
            draw::draw_card(&cards)
                .ok_or_else(|| AppError::Database(format!("Deck {} has no cards", deck_id)))?
                .id
        }
    };

    let notes = payload.notes.as_deref().and_then(normalize_notes);

    let pull = state
        .db
        .insert_pull(&NewPull {
            user_id: user.user_id.clone(),
            card_id,
            pull_date: today,
            pull_type: payload.pull_type,
            notes,
            is_reversed: payload.is_reversed,
        })
        .await
        .map_err(|e| match e {
            // Lost the race: another request drew today's card first
            AppError::Conflict(_) => AppError::Conflict("Already pulled today".to_string()),
            other => other,
        })?;

    tracing::info!(
        user_id = %user.user_id,
        card_id,
        date = %today,
        pull_type = %payload.pull_type,
        "Daily pull recorded"
    );

    Ok((StatusCode::CREATED, Json(pull)))
}

// ─── Notes ───────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct UpdateNotesRequest {
    #[validate(length(max = 2000))]
    notes: String,
}

/// Replace the note on an owned pull. An empty body clears the note.
async fn update_notes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pull_id): Path<String>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<Json<DailyPull>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let notes = normalize_notes(&payload.notes);
    let pull = state
        .db
        .update_pull_notes(&pull_id, &user.user_id, notes.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pull {} not found", pull_id)))?;

    tracing::debug!(user_id = %user.user_id, pull_id = %pull.id, "Pull notes updated");

    Ok(Json(pull))
}

// ─── History ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct HistoryQuery {
    /// Window length in days (clamped to 1..=60)
    days: Option<i64>,
    #[serde(default)]
    tz_offset: i32,
}

#[derive(Serialize)]
pub struct PullsResponse {
    pub pulls: Vec<DailyPull>,
    /// Effective window after clamping
    pub days: i64,
}

/// Recent pulls, most recent first, cards joined.
async fn get_pulls(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<PullsResponse>> {
    let days = clamp_window(params.days, DISPLAY_WINDOW_DAYS);
    let today = local_day_key(Utc::now(), params.tz_offset);

    let pulls = state
        .db
        .pulls_since(&user.user_id, window_start(today, days))
        .await?;

    Ok(Json(PullsResponse { pulls, days }))
}

// ─── Analytics ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub days: i64,
    pub has_data: bool,
    pub analytics: PullAggregate,
}

/// Aggregate the pull window into per-card tallies and a summary.
async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<AnalyticsResponse>> {
    let days = clamp_window(params.days, ANALYTICS_WINDOW_DAYS);
    let today = local_day_key(Utc::now(), params.tz_offset);

    let pulls = state
        .db
        .pulls_since(&user.user_id, window_start(today, days))
        .await?;

    let analytics = aggregate_pulls(&pulls);

    Ok(Json(AnalyticsResponse {
        days,
        has_data: !analytics.is_empty(),
        analytics,
    }))
}

// ─── CSV Export ──────────────────────────────────────────────

/// Export the analytics window as a downloadable CSV.
async fn export_csv(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(tz): Query<TzQuery>,
) -> Result<impl IntoResponse> {
    let today = local_day_key(Utc::now(), tz.tz_offset);

    let pulls = state
        .db
        .pulls_since(&user.user_id, window_start(today, ANALYTICS_WINDOW_DAYS))
        .await?;

    let csv = pulls_to_csv(&pulls);

    tracing::info!(
        user_id = %user.user_id,
        rows = pulls.len(),
        "Pull history exported"
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"chronoarcana-pulls-{}.csv\"", today),
            ),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_window() {
        assert_eq!(clamp_window(None, 7), 7);
        assert_eq!(clamp_window(Some(30), 7), 30);
        assert_eq!(clamp_window(Some(0), 7), 1);
        assert_eq!(clamp_window(Some(-5), 7), 1);
        assert_eq!(clamp_window(Some(500), 7), 60);
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes("  a thought  "), Some("a thought".to_string()));
        // Empty and whitespace-only notes clear rather than store ""
        assert_eq!(normalize_notes(""), None);
        assert_eq!(normalize_notes("   \n\t"), None);
    }

    #[test]
    fn test_window_start_inclusive_of_today() {
        let today: NaiveDate = "2024-03-10".parse().unwrap();

        // A one-day window is just today
        assert_eq!(window_start(today, 1), today);
        // A week ends today and starts six days back
        assert_eq!(window_start(today, 7).to_string(), "2024-03-04");
    }
}
