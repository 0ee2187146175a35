// Core algorithm exports
pub mod discovery;
pub mod error;
pub mod filters;
pub mod gate;
pub mod ledger;
pub mod matchmaker;

pub use discovery::{assemble_deck, DiscoveryEngine};
pub use error::CoreError;
pub use filters::{is_discoverable, matches_deck_filters, ANY_GENDER};
pub use gate::ConversationGate;
pub use ledger::{match_partners, plan_transition, PairState, RelationshipLedger, Transition};
pub use matchmaker::{Matchmaker, MatchmakerOptions};
