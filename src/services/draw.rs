// SPDX-License-Identifier: MIT

//! Random card selection for digital pulls.

use rand::seq::IndexedRandom;

use crate::models::Card;

/// Pick one card uniformly from the deck's card list.
///
/// Returns None for an empty list; card lists are seeded reference data, so
/// callers treat that as a data error rather than a user error.
pub fn draw_card(cards: &[Card]) -> Option<&Card> {
    cards.choose(&mut rand::rng())
}
