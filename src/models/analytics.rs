//! Pull-history aggregates for the dashboard.
//!
//! Everything here is a pure function over the request-scoped pull list
//! (at most 60 days of records); nothing is persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::DailyPull;

/// Count and share of the window for one distinct card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTally {
    pub card_id: i64,
    pub card_name: String,
    pub count: u32,
    /// Share of all pulls in the window, rounded to one decimal
    pub percentage: f64,
}

/// Aggregate over a window of pull records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullAggregate {
    /// Per-card tallies, sorted by count descending. Ties keep the order
    /// cards were first encountered in the input (most-recent-first).
    pub tallies: Vec<CardTally>,
    pub total_pulls: u32,
    pub distinct_cards: u32,
    /// Average pulls per distinct card, rounded to one decimal
    pub average_per_card: f64,
    pub most_pulled: Option<CardTally>,
}

impl PullAggregate {
    /// An empty window produces an empty aggregate ("no data").
    pub fn is_empty(&self) -> bool {
        self.total_pulls == 0
    }
}

/// Group a window of pulls by card identity.
///
/// Input order is preserved for tie-breaking, so callers should pass the
/// list as fetched (most-recent-first). Pure and idempotent.
pub fn aggregate_pulls(pulls: &[DailyPull]) -> PullAggregate {
    let mut tallies: Vec<CardTally> = Vec::new();
    let mut index_by_card: HashMap<i64, usize> = HashMap::new();

    for pull in pulls {
        match index_by_card.get(&pull.card_id) {
            Some(&i) => tallies[i].count += 1,
            None => {
                let card_name = pull
                    .card
                    .as_ref()
                    .map(|c| c.card_name.clone())
                    .unwrap_or_else(|| "Unknown Card".to_string());
                index_by_card.insert(pull.card_id, tallies.len());
                tallies.push(CardTally {
                    card_id: pull.card_id,
                    card_name,
                    count: 1,
                    percentage: 0.0,
                });
            }
        }
    }

    let total = pulls.len() as u32;
    for tally in &mut tallies {
        tally.percentage = round_one_decimal(f64::from(tally.count) * 100.0 / f64::from(total));
    }

    // Stable sort keeps first-encountered order among equal counts
    tallies.sort_by(|a, b| b.count.cmp(&a.count));

    let distinct = tallies.len() as u32;
    let average = if distinct == 0 {
        0.0
    } else {
        round_one_decimal(f64::from(total) / f64::from(distinct))
    };

    PullAggregate {
        most_pulled: tallies.first().cloned(),
        total_pulls: total,
        distinct_cards: distinct,
        average_per_card: average,
        tallies,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PullType;

    fn make_pull(card_id: i64, card_name: &str, date: &str) -> DailyPull {
        DailyPull {
            id: format!("pull-{card_id}-{date}"),
            user_id: "user-1".to_string(),
            card_id,
            pull_date: date.parse().unwrap(),
            pull_type: PullType::Digital,
            notes: None,
            is_reversed: false,
            created_at: format!("{date}T09:00:00Z"),
            updated_at: format!("{date}T09:00:00Z"),
            card: Some(crate::models::Card {
                id: card_id,
                deck_id: 1,
                card_name: card_name.to_string(),
                card_number: Some(card_id as i32),
                suit: None,
                upright_meaning: "meaning".to_string(),
                reversed_meaning: None,
                symbol_associations: None,
                keywords: None,
                image_url: None,
            }),
        }
    }

    #[test]
    fn test_aggregate_counts_and_percentages() {
        // Two pulls of A, one of B
        let pulls = vec![
            make_pull(1, "The Fool", "2024-03-03"),
            make_pull(1, "The Fool", "2024-03-02"),
            make_pull(2, "The Magician", "2024-03-01"),
        ];

        let agg = aggregate_pulls(&pulls);

        assert_eq!(agg.total_pulls, 3);
        assert_eq!(agg.distinct_cards, 2);
        assert_eq!(agg.average_per_card, 1.5);

        assert_eq!(agg.tallies[0].card_name, "The Fool");
        assert_eq!(agg.tallies[0].count, 2);
        assert_eq!(agg.tallies[0].percentage, 66.7);
        assert_eq!(agg.tallies[1].count, 1);
        assert_eq!(agg.tallies[1].percentage, 33.3);

        let most = agg.most_pulled.expect("most-pulled present");
        assert_eq!(most.card_id, 1);
    }

    #[test]
    fn test_aggregate_tie_keeps_input_order() {
        // B first in input, both count 1 -> B stays ahead of A
        let pulls = vec![
            make_pull(2, "The Magician", "2024-03-02"),
            make_pull(1, "The Fool", "2024-03-01"),
        ];

        let agg = aggregate_pulls(&pulls);

        assert_eq!(agg.tallies[0].card_id, 2);
        assert_eq!(agg.tallies[1].card_id, 1);
    }

    #[test]
    fn test_aggregate_empty_input() {
        let agg = aggregate_pulls(&[]);

        assert!(agg.is_empty());
        assert!(agg.tallies.is_empty());
        assert_eq!(agg.total_pulls, 0);
        assert_eq!(agg.distinct_cards, 0);
        assert_eq!(agg.average_per_card, 0.0);
        assert!(agg.most_pulled.is_none());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let pulls = vec![
            make_pull(1, "The Fool", "2024-03-03"),
            make_pull(3, "The High Priestess", "2024-03-02"),
            make_pull(1, "The Fool", "2024-03-01"),
        ];

        let first = aggregate_pulls(&pulls);
        let second = aggregate_pulls(&pulls);

        assert_eq!(first.tallies, second.tallies);
        assert_eq!(first.total_pulls, second.total_pulls);
    }

    #[test]
    fn test_aggregate_missing_card_join() {
        let mut pull = make_pull(7, "ignored", "2024-03-01");
        pull.card = None;

        let agg = aggregate_pulls(&[pull]);

        assert_eq!(agg.tallies[0].card_name, "Unknown Card");
        assert_eq!(agg.tallies[0].percentage, 100.0);
    }
}
