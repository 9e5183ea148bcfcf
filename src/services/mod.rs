// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod catalog;
pub mod daily;
pub mod draw;
pub mod export;

pub use catalog::DeckCatalog;
pub use daily::PullEligibility;
