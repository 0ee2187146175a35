use std::collections::HashMap;
use std::sync::Arc;
use crate::core::{
    filters::{is_discoverable, matches_deck_filters},
    ledger::{PairState, RelationshipLedger},
    CoreError,
};
use crate::models::{DeckCandidate, DeckFilters, InterestEdge, User};
use crate::services::ProfileStore;

/// Assemble the deck for `viewer_id` from raw store data
///
/// # Pipeline Stages
/// 1. Drop the viewer and invisible users
/// 2. Gender and city filters
/// 3. Newest profiles first (stable, so ties keep store order)
/// 4. Annotate with the pair's relationship state
pub fn assemble_deck(
    viewer_id: i64,
    users: Vec<User>,
    edges: Vec<InterestEdge>,
    filters: &DeckFilters,
) -> Vec<DeckCandidate> {
    // Partner id -> both directions of the pair, from the viewer's side
    let mut pairs: HashMap<i64, PairState> = HashMap::new();
    for edge in edges {
        let partner = edge.partner_of(viewer_id);
        let state = pairs.entry(partner).or_default();
        if edge.from_user == viewer_id {
            state.forward = Some(edge);
        } else {
            state.reverse = Some(edge);
        }
    }

    let mut candidates: Vec<User> = users
        .into_iter()
        .filter(|user| is_discoverable(user, viewer_id))
        .filter(|user| matches_deck_filters(user, filters))
        .collect();

    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    candidates
        .into_iter()
        .map(|user| {
            let state = pairs.get(&user.id);
            DeckCandidate {
                liked_me: state.is_some_and(|s| s.reverse.is_some()),
                liked_by_me: state.is_some_and(|s| s.forward.is_some()),
                is_match: state.is_some_and(PairState::is_match),
                id: user.id,
                display_name: user.display_name,
                age: user.age,
                city: user.city,
                gender: user.gender,
                bio: user.bio,
                interests: user.interests,
                photo: user.photo,
            }
        })
        .collect()
}

/// Produces the candidate deck for a viewer
#[derive(Clone)]
pub struct DiscoveryEngine {
    profiles: Arc<dyn ProfileStore>,
    ledger: RelationshipLedger,
}

impl DiscoveryEngine {
    pub fn new(profiles: Arc<dyn ProfileStore>, ledger: RelationshipLedger) -> Self {
        Self { profiles, ledger }
    }

    /// Build the full filtered deck for `viewer_id`. Read-only.
    pub async fn build_deck(
        &self,
        viewer_id: i64,
        filters: &DeckFilters,
    ) -> Result<Vec<DeckCandidate>, CoreError> {
        if self.profiles.get_by_id(viewer_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("user {}", viewer_id)));
        }

        let users = self.profiles.list_candidates(viewer_id).await?;
        let edges = self.ledger.edges_involving(viewer_id).await?;
        let total = users.len();

        let deck = assemble_deck(viewer_id, users, edges, filters);

        tracing::debug!(
            "Built deck of {} for user {} (from {} users)",
            deck.len(),
            viewer_id,
            total
        );

        Ok(deck)
    }
}
