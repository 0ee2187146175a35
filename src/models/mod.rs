// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{User, NewProfile, ProfileUpdate, InterestKind, InterestEdge, LikeOutcome, Message, DeckFilters, DeckCandidate, MatchSummary, ConversationMessage};
pub use requests::{ViewerQuery, LoginRequest, SearchQuery, TargetForm, MessagesQuery, SendMessageForm, ProfileUpdateForm, parse_flag};
pub use responses::{SessionUser, LoginResponse, ProfileResponse, SearchResponse, LikeResponse, MatchesResponse, MessagesResponse, AckResponse, HealthResponse, ErrorResponse};
