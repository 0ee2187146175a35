use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::core::CoreError;
use crate::models::{InterestEdge, InterestKind, LikeOutcome};
use crate::services::{EdgeStore, ProfileStore};

/// Both directions of interest between an ordered pair `(from, to)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairState {
    /// Edge `from -> to`
    pub forward: Option<InterestEdge>,
    /// Edge `to -> from`
    pub reverse: Option<InterestEdge>,
}

impl PairState {
    /// Split a set of edges into the two directions of `(from, to)`.
    /// Edges that belong to other pairs are ignored.
    pub fn from_edges<I>(from: i64, to: i64, edges: I) -> Self
    where
        I: IntoIterator<Item = InterestEdge>,
    {
        let mut state = PairState::default();
        for edge in edges {
            if edge.from_user == from && edge.to_user == to {
                state.forward = Some(edge);
            } else if edge.from_user == to && edge.to_user == from {
                state.reverse = Some(edge);
            }
        }
        state
    }

    /// The match predicate: some edge is matched or is a superlike
    pub fn is_match(&self) -> bool {
        self.forward.iter().chain(self.reverse.iter()).any(InterestEdge::unlocks_chat)
    }
}

/// Writes needed to move a pair from one state to the next
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// New value of the forward edge; `None` when it is unchanged
    pub write: Option<InterestEdge>,
    /// Set `matched = true` on the existing reverse edge
    pub match_reverse: bool,
    pub outcome: LikeOutcome,
}

/// Plan the effect of `from` expressing `kind` interest in `to`.
///
/// This is the single place where relationship transitions are decided.
/// Backends call it while holding their per-pair serialization point and
/// persist the returned writes in one atomic step.
pub fn plan_transition(
    from: i64,
    to: i64,
    kind: InterestKind,
    state: &PairState,
    now: DateTime<Utc>,
) -> Transition {
    let reverse_unmatched = state.reverse.as_ref().is_some_and(|edge| !edge.matched);

    match (&state.forward, kind) {
        // Repeat like, or like after superlike: nothing changes
        (Some(existing), InterestKind::Like) => Transition {
            write: None,
            match_reverse: false,
            outcome: LikeOutcome {
                already_existed: true,
                is_match: existing.matched,
            },
        },
        (Some(existing), InterestKind::Superlike) => {
            let upgraded = InterestEdge {
                kind: InterestKind::Superlike,
                matched: true,
                ..existing.clone()
            };
            Transition {
                write: (upgraded != *existing).then_some(upgraded),
                match_reverse: reverse_unmatched,
                outcome: LikeOutcome {
                    already_existed: true,
                    is_match: true,
                },
            }
        }
        (None, InterestKind::Like) => {
            let matched = state.reverse.is_some();
            Transition {
                write: Some(InterestEdge {
                    from_user: from,
                    to_user: to,
                    kind,
                    matched,
                    created_at: now,
                }),
                match_reverse: matched && reverse_unmatched,
                outcome: LikeOutcome {
                    already_existed: false,
                    is_match: matched,
                },
            }
        }
        // A superlike opens the pair unilaterally; the reverse edge is never invented
        (None, InterestKind::Superlike) => Transition {
            write: Some(InterestEdge {
                from_user: from,
                to_user: to,
                kind,
                matched: true,
                created_at: now,
            }),
            match_reverse: reverse_unmatched,
            outcome: LikeOutcome {
                already_existed: false,
                is_match: true,
            },
        },
    }
}

/// Partner ids of every open pair in `edges`, first occurrence wins
pub fn match_partners(viewer_id: i64, edges: &[InterestEdge]) -> Vec<i64> {
    let mut seen = HashSet::new();
    edges
        .iter()
        .filter(|edge| edge.unlocks_chat())
        .map(|edge| edge.partner_of(viewer_id))
        .filter(|partner| seen.insert(*partner))
        .collect()
}

/// Owner of all relationship state between users
#[derive(Clone)]
pub struct RelationshipLedger {
    profiles: Arc<dyn ProfileStore>,
    edges: Arc<dyn EdgeStore>,
}

impl RelationshipLedger {
    pub fn new(profiles: Arc<dyn ProfileStore>, edges: Arc<dyn EdgeStore>) -> Self {
        Self { profiles, edges }
    }

    /// Record a like or superlike from `actor_id` to `target_id`
    pub async fn record_like(
        &self,
        actor_id: i64,
        target_id: i64,
        kind: InterestKind,
    ) -> Result<LikeOutcome, CoreError> {
        if actor_id != target_id {
            self.ensure_exists(actor_id).await?;
        }
        self.record_like_as(actor_id, target_id, kind).await
    }

    /// Like `record_like`, for an actor whose existence is already established
    pub async fn record_like_as(
        &self,
        actor_id: i64,
        target_id: i64,
        kind: InterestKind,
    ) -> Result<LikeOutcome, CoreError> {
        if actor_id == target_id {
            return Err(CoreError::InvalidOperation("cannot act on self".to_string()));
        }
        self.ensure_exists(target_id).await?;

        let outcome = self.edges.apply_interest(actor_id, target_id, kind).await?;

        if outcome.is_match {
            tracing::info!(
                "Pair {} <-> {} is matched after {:?} (already existed: {})",
                actor_id,
                target_id,
                kind,
                outcome.already_existed
            );
        } else {
            tracing::debug!("Recorded {:?} {} -> {}", kind, actor_id, target_id);
        }

        Ok(outcome)
    }

    async fn ensure_exists(&self, id: i64) -> Result<(), CoreError> {
        match self.profiles.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound(format!("user {}", id))),
        }
    }

    /// Current state of the pair as seen from `a`
    pub async fn pair_state(&self, a: i64, b: i64) -> Result<PairState, CoreError> {
        let edges = self.edges.edges_between(a, b).await?;
        Ok(PairState::from_edges(a, b, edges))
    }

    /// Whether `a` and `b` currently form a match
    pub async fn is_match(&self, a: i64, b: i64) -> Result<bool, CoreError> {
        Ok(self.pair_state(a, b).await?.is_match())
    }

    /// Every edge touching `user_id`, in either direction
    pub async fn edges_involving(&self, user_id: i64) -> Result<Vec<InterestEdge>, CoreError> {
        Ok(self.edges.edges_involving(user_id).await?)
    }

    /// Ids of everyone the viewer can chat with
    pub async fn match_partner_ids(&self, viewer_id: i64) -> Result<Vec<i64>, CoreError> {
        let edges = self.edges.edges_involving(viewer_id).await?;
        Ok(match_partners(viewer_id, &edges))
    }
}
