use std::sync::Arc;
use crate::core::{
    discovery::DiscoveryEngine,
    gate::ConversationGate,
    ledger::RelationshipLedger,
    CoreError,
};
use crate::models::{
    ConversationMessage, DeckCandidate, DeckFilters, InterestKind, LikeOutcome, MatchSummary,
    Message, NewProfile, ProfileUpdate, User,
};
use crate::services::{EdgeStore, IdentityCache, MessageStore, ProfileStore};

/// Behaviour knobs for the matchmaker
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchmakerOptions {
    /// Visibility given to users created on first login
    pub visible_by_default: bool,
}

/// API facade: every operation is keyed by the viewer's external identity
///
/// Operations never create users, except `login`. An unknown identity is
/// a `NotFound` failure.
#[derive(Clone)]
pub struct Matchmaker {
    profiles: Arc<dyn ProfileStore>,
    ledger: RelationshipLedger,
    discovery: DiscoveryEngine,
    gate: ConversationGate,
    identities: IdentityCache,
    options: MatchmakerOptions,
}

impl Matchmaker {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        edges: Arc<dyn EdgeStore>,
        messages: Arc<dyn MessageStore>,
        identities: IdentityCache,
        options: MatchmakerOptions,
    ) -> Self {
        let ledger = RelationshipLedger::new(profiles.clone(), edges);
        let discovery = DiscoveryEngine::new(profiles.clone(), ledger.clone());
        let gate = ConversationGate::new(ledger.clone(), messages);

        Self {
            profiles,
            ledger,
            discovery,
            gate,
            identities,
            options,
        }
    }

    pub fn gate(&self) -> &ConversationGate {
        &self.gate
    }

    /// Load the viewer's full record
    async fn viewer(&self, external_id: &str) -> Result<User, CoreError> {
        let user = self
            .profiles
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("user {}", external_id)))?;

        self.identities.insert(external_id, user.id).await;
        Ok(user)
    }

    /// Resolve the viewer's internal id, from cache when possible
    async fn viewer_id(&self, external_id: &str) -> Result<i64, CoreError> {
        if let Some(id) = self.identities.get(external_id).await {
            return Ok(id);
        }
        Ok(self.viewer(external_id).await?.id)
    }

    /// Create the user on first sight, otherwise touch its activity timestamp
    pub async fn login(
        &self,
        external_id: &str,
        name: Option<&str>,
        username: Option<&str>,
    ) -> Result<User, CoreError> {
        let display_name = [name, username]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("User {}", external_id));

        let user = self
            .profiles
            .resolve(NewProfile {
                external_id: external_id.to_string(),
                display_name,
                visible: self.options.visible_by_default,
            })
            .await?;

        self.identities.insert(external_id, user.id).await;
        tracing::info!("User {} logged in as {}", external_id, user.id);

        Ok(user)
    }

    pub async fn profile(&self, external_id: &str) -> Result<User, CoreError> {
        self.viewer(external_id).await
    }

    pub async fn update_profile(
        &self,
        external_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, CoreError> {
        let viewer_id = self.viewer_id(external_id).await?;
        Ok(self.profiles.update(viewer_id, update).await?)
    }

    pub async fn search(
        &self,
        external_id: &str,
        filters: &DeckFilters,
    ) -> Result<Vec<DeckCandidate>, CoreError> {
        let viewer_id = self.viewer_id(external_id).await?;
        self.discovery.build_deck(viewer_id, filters).await
    }

    pub async fn like(&self, external_id: &str, target_id: i64) -> Result<LikeOutcome, CoreError> {
        let viewer_id = self.viewer_id(external_id).await?;
        self.ledger.record_like_as(viewer_id, target_id, InterestKind::Like).await
    }

    pub async fn superlike(
        &self,
        external_id: &str,
        target_id: i64,
    ) -> Result<LikeOutcome, CoreError> {
        let viewer_id = self.viewer_id(external_id).await?;
        self.ledger.record_like_as(viewer_id, target_id, InterestKind::Superlike).await
    }

    /// Everyone the viewer can chat with. No ordering is promised.
    pub async fn matches(&self, external_id: &str) -> Result<Vec<MatchSummary>, CoreError> {
        let viewer_id = self.viewer_id(external_id).await?;
        let partner_ids = self.ledger.match_partner_ids(viewer_id).await?;
        if partner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let partners = self.profiles.get_many(&partner_ids).await?;
        Ok(partners.into_iter().map(MatchSummary::from).collect())
    }

    pub async fn get_messages(
        &self,
        external_id: &str,
        partner_id: i64,
    ) -> Result<Vec<ConversationMessage>, CoreError> {
        let viewer_id = self.viewer_id(external_id).await?;
        self.gate.list_messages(viewer_id, partner_id).await
    }

    pub async fn send_message(
        &self,
        external_id: &str,
        partner_id: i64,
        body: &str,
    ) -> Result<Message, CoreError> {
        let viewer_id = self.viewer_id(external_id).await?;
        self.gate.send_message(viewer_id, partner_id, body).await
    }
}
