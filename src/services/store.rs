use async_trait::async_trait;
use thiserror::Error;
use crate::models::{InterestEdge, InterestKind, LikeOutcome, Message, NewProfile, ProfileUpdate, User};

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Write conflict persisted after {0} attempts")]
    Conflict(u32),
}

/// Persistence for user profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Find the user for an external identity, creating it on first sight.
    /// Touches `last_active` on every call.
    async fn resolve(&self, profile: NewProfile) -> Result<User, StoreError>;

    /// Find a user by external identity without creating or touching it
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Fetch several users; unknown ids are skipped
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<User>, StoreError>;

    /// All users except `exclude_id`, in store order (ascending id)
    async fn list_candidates(&self, exclude_id: i64) -> Result<Vec<User>, StoreError>;

    /// Apply a partial update and return the stored result
    async fn update(&self, id: i64, update: ProfileUpdate) -> Result<User, StoreError>;
}

/// Persistence for interest edges.
///
/// `apply_interest` is the only write path. Implementations must load both
/// directions of the pair, run [`crate::core::ledger::plan_transition`] and
/// persist the plan atomically with respect to any other action on the
/// same pair of users.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    async fn apply_interest(
        &self,
        from_user: i64,
        to_user: i64,
        kind: InterestKind,
    ) -> Result<LikeOutcome, StoreError>;

    /// Edges in either direction between two users
    async fn edges_between(&self, a: i64, b: i64) -> Result<Vec<InterestEdge>, StoreError>;

    /// Every edge where `user_id` is either endpoint
    async fn edges_involving(&self, user_id: i64) -> Result<Vec<InterestEdge>, StoreError>;
}

/// Persistence for chat messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(&self, from_user: i64, to_user: i64, body: &str) -> Result<Message, StoreError>;

    /// Messages exchanged between two users, oldest first
    async fn list_between(&self, a: i64, b: i64) -> Result<Vec<Message>, StoreError>;
}
