// SPDX-License-Identifier: MIT

//! In-process cache for deck/card reference data.
//!
//! Cards are immutable seeded rows, so they are fetched wholesale per deck
//! and kept for the life of the process. The cache is warmed at startup and
//! filled lazily on miss, shared across all requests in this instance.

use std::sync::Arc;

use dashmap::DashMap;

use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::Card;

/// Shared card cache keyed by deck id.
#[derive(Clone, Default)]
pub struct DeckCatalog {
    cards_by_deck: Arc<DashMap<i64, Arc<Vec<Card>>>>,
}

impl DeckCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All cards for a deck, ordered by card number.
    pub async fn cards_for_deck(
        &self,
        db: &SupabaseDb,
        deck_id: i64,
    ) -> Result<Arc<Vec<Card>>, AppError> {
        if let Some(cards) = self.cards_by_deck.get(&deck_id) {
            return Ok(cards.clone());
        }

        let cards = Arc::new(db.list_cards(deck_id).await?);
        self.cards_by_deck.insert(deck_id, cards.clone());
        Ok(cards)
    }

    /// Pre-load every deck's cards at startup.
    ///
    /// Returns (deck count, card count). Failures leave the cache to fill
    /// lazily on first use.
    pub async fn warm(&self, db: &SupabaseDb) -> Result<(usize, usize), AppError> {
        let decks = db.list_decks().await?;
        let mut total_cards = 0;

        for deck in &decks {
            let cards = self.cards_for_deck(db, deck.id).await?;
            total_cards += cards.len();
        }

        Ok((decks.len(), total_cards))
    }

    /// Insert a deck's cards directly (tests).
    #[doc(hidden)]
    pub fn preload(&self, deck_id: i64, cards: Vec<Card>) {
        self.cards_by_deck.insert(deck_id, Arc::new(cards));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64, deck_id: i64) -> Card {
        Card {
            id,
            deck_id,
            card_name: format!("Card {id}"),
            card_number: Some(id as i32),
            suit: None,
            upright_meaning: "meaning".to_string(),
            reversed_meaning: None,
            symbol_associations: None,
            keywords: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_cached_deck_skips_the_store() {
        // Offline mock store errors on any query; a preloaded deck must be
        // served from the cache without touching it
        let db = SupabaseDb::new_mock();
        let catalog = DeckCatalog::new();
        catalog.preload(1, vec![card(1, 1), card(2, 1)]);

        let cards = catalog.cards_for_deck(&db, 1).await.unwrap();
        assert_eq!(cards.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_miss_surfaces_store_error() {
        let db = SupabaseDb::new_mock();
        let catalog = DeckCatalog::new();

        let err = catalog.cards_for_deck(&db, 99).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
