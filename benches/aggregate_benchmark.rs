use chronoarcana::models::analytics::aggregate_pulls;
use chronoarcana::models::{Card, DailyPull, PullType};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use chrono::{Duration, NaiveDate};

fn card(id: i64) -> Card {
    Card {
        id,
        deck_id: 1,
        card_name: format!("Card {}", id),
        card_number: Some(id as i32),
        suit: Some("Major Arcana".to_string()),
        upright_meaning: "New beginnings".to_string(),
        reversed_meaning: None,
        symbol_associations: None,
        keywords: Some("fate, change".to_string()),
        image_url: None,
    }
}

/// Build a full analytics window: one pull per day, cycling through a
/// 78-card deck.
fn window(days: i64) -> Vec<DailyPull> {
    let start: NaiveDate = "2024-01-01".parse().unwrap();
    (0..days)
        .map(|i| {
            let date = start + Duration::days(i);
            DailyPull {
                id: format!("pull-{}", i),
                user_id: "bench-user".to_string(),
                card_id: i % 78,
                pull_date: date,
                pull_type: PullType::Digital,
                notes: None,
                is_reversed: i % 3 == 0,
                created_at: format!("{}T08:00:00Z", date),
                updated_at: format!("{}T08:00:00Z", date),
                card: Some(card(i % 78)),
            }
        })
        .collect()
}

fn benchmark_aggregate(c: &mut Criterion) {
    let week = window(7);
    let full_window = window(60);

    let mut group = c.benchmark_group("aggregate_pulls");

    group.bench_function("week", |b| b.iter(|| aggregate_pulls(black_box(&week))));

    group.bench_function("sixty_days", |b| {
        b.iter(|| aggregate_pulls(black_box(&full_window)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_aggregate);
criterion_main!(benches);
