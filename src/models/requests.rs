use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::core::CoreError;
use crate::models::domain::{DeckFilters, ProfileUpdate};

/// Identifies the acting user on every authenticated endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ViewerQuery {
    #[validate(length(min = 1))]
    pub tg_id: String,
}

/// Login form posted by the web app
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub tg_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Deck search parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1))]
    pub tg_id: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl SearchQuery {
    pub fn filters(&self) -> DeckFilters {
        DeckFilters {
            gender: self.gender.clone(),
            city_contains: self.city.clone(),
        }
    }
}

/// Like / superlike form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetForm {
    pub target_id: i64,
}

/// Conversation lookup parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MessagesQuery {
    #[validate(length(min = 1))]
    pub tg_id: String,
    pub partner_id: i64,
}

/// Message send form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageForm {
    pub partner_id: i64,
    pub body: String,
}

/// Profile update form; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdateForm {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub looking_for: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    /// Free-form flag from the client ("true"/"false", "1"/"0", ...)
    #[serde(default)]
    pub invisible_mode: Option<String>,
}

impl ProfileUpdateForm {
    /// Convert into a typed update, rejecting malformed flags
    pub fn into_update(self) -> Result<ProfileUpdate, CoreError> {
        let visible = match self.invisible_mode.as_deref() {
            Some(raw) => Some(!parse_flag(raw)?),
            None => None,
        };

        Ok(ProfileUpdate {
            display_name: self.display_name,
            age: self.age,
            city: self.city,
            gender: self.gender,
            looking_for: self.looking_for,
            bio: self.bio,
            interests: self.interests,
            photo: self.photo,
            visible,
        })
    }
}

/// Strictly parse a boolean flag sent as text
pub fn parse_flag(raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CoreError::InvalidOperation(format!(
            "malformed boolean flag: {:?}",
            raw
        ))),
    }
}
