// SPDX-License-Identifier: MIT

//! ChronoArcana: daily tarot pulls with journaling and analytics
//!
//! This crate provides the backend API for resolving one tarot pull per
//! user per local day, keeping a pull journal, and aggregating pull
//! history into per-card analytics.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::SupabaseDb;
use services::DeckCatalog;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SupabaseDb,
    pub catalog: DeckCatalog,
}
