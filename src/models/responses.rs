use serde::{Deserialize, Serialize};
use crate::models::domain::{ConversationMessage, DeckCandidate, MatchSummary, User};

/// Short user view returned on login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub tg_id: String,
    pub display_name: String,
    pub invisible_mode: bool,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            tg_id: user.external_id.clone(),
            display_name: user.display_name.clone(),
            invisible_mode: !user.visible,
        }
    }
}

/// Response for the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub user: SessionUser,
}

/// Full profile of the viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub tg_id: String,
    pub display_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub looking_for: String,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<String>,
    pub photo: Option<String>,
    pub invisible_mode: bool,
    pub last_active: chrono::DateTime<chrono::Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            tg_id: user.external_id,
            display_name: user.display_name,
            age: user.age,
            gender: user.gender,
            looking_for: user.looking_for,
            city: user.city,
            bio: user.bio,
            interests: user.interests,
            photo: user.photo,
            invisible_mode: !user.visible,
            last_active: user.last_active,
        }
    }
}

/// Discovery deck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub users: Vec<DeckCandidate>,
}

/// Like / superlike result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub ok: bool,
    pub already: bool,
    pub is_match: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub superlike: bool,
}

/// Match partners of the viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<MatchSummary>,
}

/// Conversation with one partner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<ConversationMessage>,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
