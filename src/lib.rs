//! Kindred - matchmaking backend
//!
//! Users discover each other through a filtered deck, express interest with
//! likes and superlikes, and chat once the pair is matched. The relationship
//! ledger is the single source of truth for pairwise state.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{CoreError, Matchmaker, MatchmakerOptions, RelationshipLedger, DiscoveryEngine, ConversationGate};
pub use models::{User, InterestEdge, InterestKind, LikeOutcome, DeckFilters, DeckCandidate, MatchSummary};
pub use services::{MemoryStore, PostgresClient, IdentityCache};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let outcome = LikeOutcome { already_existed: false, is_match: true };
        assert!(outcome.is_match);
    }
}
