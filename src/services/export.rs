// SPDX-License-Identifier: MIT

//! CSV export of pull history.
//!
//! The artifact is downloaded by the client; nothing is persisted server
//! side. Input order (most-recent-first, as fetched) is preserved.

use crate::models::DailyPull;

/// Fixed header row.
pub const CSV_HEADER: &str = "Date,Card Name,Card Number,Suit,Pull Type,Notes,Reversed,Keywords";

/// Render pulls as CSV. Zero records yields exactly the header line.
pub fn pulls_to_csv(pulls: &[DailyPull]) -> String {
    let mut lines = Vec::with_capacity(pulls.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for pull in pulls {
        let card = pull.card.as_ref();
        let fields = [
            pull.pull_date.to_string(),
            card.map(|c| c.card_name.clone()).unwrap_or_default(),
            card.and_then(|c| c.card_number)
                .map(|n| n.to_string())
                .unwrap_or_default(),
            card.and_then(|c| c.suit.clone()).unwrap_or_default(),
            pull.pull_type.to_string(),
            pull.notes.clone().unwrap_or_default(),
            if pull.is_reversed { "Yes" } else { "No" }.to_string(),
            card.and_then(|c| c.keywords.clone()).unwrap_or_default(),
        ];

        let row: Vec<String> = fields.iter().map(|f| quote_field(f)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// Quote a field unconditionally, doubling embedded quotes, so commas and
/// newlines inside notes survive.
fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
