// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod analytics;
pub mod card;
pub mod pull;
pub mod user;

pub use analytics::{CardTally, PullAggregate};
pub use card::{Card, Deck};
pub use pull::{DailyPull, NewPull, PullType};
pub use user::{ProfileChanges, SubscriptionStatus, UserProfile};
