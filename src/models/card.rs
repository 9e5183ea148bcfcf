// SPDX-License-Identifier: MIT

//! Deck and card reference data.
//!
//! Both are immutable rows seeded in the external store; the service only
//! ever reads them, wholesale per deck.

use serde::{Deserialize, Serialize};

/// A tarot deck (e.g. "Rider Waite").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Cover image URL
    pub image_url: Option<String>,
}

/// A single card within a deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    /// Owning deck
    pub deck_id: i64,
    pub card_name: String,
    /// Ordinal within the deck (0 = The Fool for major arcana)
    pub card_number: Option<i32>,
    /// Suit for minor arcana; None for major arcana
    pub suit: Option<String>,
    pub upright_meaning: String,
    pub reversed_meaning: Option<String>,
    pub symbol_associations: Option<String>,
    /// Comma-separated keyword tags
    pub keywords: Option<String>,
    pub image_url: Option<String>,
}
