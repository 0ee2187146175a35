use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user as supplied by the profile store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub external_id: String,
    pub display_name: String,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub looking_for: String,
    pub bio: Option<String>,
    pub interests: Option<String>,
    pub photo: Option<String>,
    /// When false the user never shows up in anyone's deck, but can still act
    pub visible: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Data needed to create a user on first login
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub external_id: String,
    pub display_name: String,
    pub visible: bool,
}

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub looking_for: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<String>,
    pub photo: Option<String>,
    pub visible: Option<bool>,
}

impl ProfileUpdate {
    /// Apply the update to a user, normalising blank strings the same way
    /// for every storage backend.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(name) = &self.display_name {
            let name = name.trim();
            if !name.is_empty() {
                user.display_name = name.to_string();
            }
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(city) = &self.city {
            user.city = non_blank(city);
        }
        if let Some(gender) = &self.gender {
            user.gender = non_blank(gender);
        }
        if let Some(looking_for) = &self.looking_for {
            user.looking_for = non_blank(looking_for).unwrap_or_else(|| "all".to_string());
        }
        if let Some(bio) = &self.bio {
            user.bio = non_blank(bio);
        }
        if let Some(interests) = &self.interests {
            user.interests = non_blank(interests);
        }
        if let Some(photo) = &self.photo {
            user.photo = non_blank(photo);
        }
        if let Some(visible) = self.visible {
            user.visible = visible;
        }
        user.last_active = now;
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Kind of interest one user expressed in another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interest_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterestKind {
    Like,
    Superlike,
}

/// Directed interest from one user to another.
///
/// There is at most one edge per ordered pair. `matched` is a cached copy of
/// the pair's match state and is kept equal on both directions whenever both
/// exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestEdge {
    pub from_user: i64,
    pub to_user: i64,
    pub kind: InterestKind,
    pub matched: bool,
    pub created_at: DateTime<Utc>,
}

impl InterestEdge {
    /// Whether this edge on its own opens the conversation between its endpoints
    #[inline]
    pub fn unlocks_chat(&self) -> bool {
        self.matched || self.kind == InterestKind::Superlike
    }

    /// The endpoint that is not `user_id`
    #[inline]
    pub fn partner_of(&self, user_id: i64) -> i64 {
        if self.from_user == user_id {
            self.to_user
        } else {
            self.from_user
        }
    }
}

/// Result of a like or superlike action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub already_existed: bool,
    pub is_match: bool,
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub from_user: i64,
    pub to_user: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Optional deck filters
#[derive(Debug, Clone, Default)]
pub struct DeckFilters {
    pub gender: Option<String>,
    pub city_contains: Option<String>,
}

/// A deck entry annotated with the pair's relationship state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckCandidate {
    pub id: i64,
    pub display_name: String,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<String>,
    pub photo: Option<String>,
    pub liked_me: bool,
    pub liked_by_me: bool,
    pub is_match: bool,
}

/// Summary of a match partner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: i64,
    pub display_name: String,
    pub city: Option<String>,
    pub photo: Option<String>,
    pub last_active: DateTime<Utc>,
}

impl From<User> for MatchSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            city: user.city,
            photo: user.photo,
            last_active: user.last_active,
        }
    }
}

/// A message as seen by one side of the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: i64,
    pub body: String,
    pub is_from_viewer: bool,
    pub created_at: DateTime<Utc>,
}
