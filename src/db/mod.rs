//! Database layer (Supabase REST).

pub mod supabase;

pub use supabase::SupabaseDb;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const DECKS: &str = "tarot_decks";
    pub const CARDS: &str = "tarot_cards";
    pub const PULLS: &str = "daily_pulls";
}
