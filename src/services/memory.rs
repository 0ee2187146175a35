use std::collections::{BTreeMap, HashMap};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use crate::core::ledger::{plan_transition, PairState};
use crate::models::{InterestEdge, InterestKind, LikeOutcome, Message, NewProfile, ProfileUpdate, User};
use super::store::{EdgeStore, MessageStore, ProfileStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    by_external_id: HashMap<String, i64>,
    /// Keyed by ordered pair `(from_user, to_user)`
    edges: BTreeMap<(i64, i64), InterestEdge>,
    messages: Vec<Message>,
    next_user_id: i64,
    next_message_id: i64,
}

/// In-memory backend for tests and local development.
///
/// All writes go through one lock, which serializes every ledger
/// transition. Readers share the lock and never see a half-applied one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed user, keeping its id. Used to seed fixtures.
    pub async fn insert_user(&self, user: User) {
        let mut state = self.state.write().await;
        state.next_user_id = state.next_user_id.max(user.id);
        state.by_external_id.insert(user.external_id.clone(), user.id);
        state.users.insert(user.id, user);
    }

    /// Snapshot of every edge, ordered by `(from_user, to_user)`
    pub async fn all_edges(&self) -> Vec<InterestEdge> {
        self.state.read().await.edges.values().cloned().collect()
    }

    /// Number of stored edges
    pub async fn num_edges(&self) -> usize {
        self.state.read().await.edges.len()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn resolve(&self, profile: NewProfile) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(id) = state.by_external_id.get(&profile.external_id).copied() {
            if let Some(user) = state.users.get_mut(&id) {
                user.last_active = now;
                return Ok(user.clone());
            }
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            external_id: profile.external_id,
            display_name: profile.display_name,
            age: None,
            city: None,
            gender: None,
            looking_for: "all".to_string(),
            bio: None,
            interests: None,
            photo: None,
            visible: profile.visible,
            created_at: now,
            last_active: now,
        };
        state.by_external_id.insert(user.external_id.clone(), user.id);
        state.users.insert(user.id, user.clone());

        tracing::debug!("Created user {} for {}", user.id, user.external_id);
        Ok(user)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .by_external_id
            .get(external_id)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn list_candidates(&self, exclude_id: i64) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|user| user.id != exclude_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, update: ProfileUpdate) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;

        update.apply_to(user, Utc::now());
        Ok(user.clone())
    }
}

#[async_trait]
impl EdgeStore for MemoryStore {
    async fn apply_interest(
        &self,
        from_user: i64,
        to_user: i64,
        kind: InterestKind,
    ) -> Result<LikeOutcome, StoreError> {
        let mut state = self.state.write().await;

        let pair = PairState {
            forward: state.edges.get(&(from_user, to_user)).cloned(),
            reverse: state.edges.get(&(to_user, from_user)).cloned(),
        };
        let transition = plan_transition(from_user, to_user, kind, &pair, Utc::now());

        if let Some(edge) = transition.write {
            state.edges.insert((from_user, to_user), edge);
        }
        if transition.match_reverse {
            if let Some(reverse) = state.edges.get_mut(&(to_user, from_user)) {
                reverse.matched = true;
            }
        }

        Ok(transition.outcome)
    }

    async fn edges_between(&self, a: i64, b: i64) -> Result<Vec<InterestEdge>, StoreError> {
        let state = self.state.read().await;
        Ok([(a, b), (b, a)]
            .iter()
            .filter_map(|key| state.edges.get(key).cloned())
            .collect())
    }

    async fn edges_involving(&self, user_id: i64) -> Result<Vec<InterestEdge>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .edges
            .values()
            .filter(|edge| edge.from_user == user_id || edge.to_user == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, from_user: i64, to_user: i64, body: &str) -> Result<Message, StoreError> {
        let mut state = self.state.write().await;
        state.next_message_id += 1;

        let message = Message {
            id: state.next_message_id,
            from_user,
            to_user,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        state.messages.push(message.clone());

        Ok(message)
    }

    async fn list_between(&self, a: i64, b: i64) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| (m.from_user == a && m.to_user == b) || (m.from_user == b && m.to_user == a))
            .cloned()
            .collect();

        messages.sort_by(|x, y| x.created_at.cmp(&y.created_at).then(x.id.cmp(&y.id)));
        Ok(messages)
    }
}
