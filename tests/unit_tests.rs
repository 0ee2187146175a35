// Unit tests for the Kindred relationship ledger

use std::sync::Arc;
use chrono::Utc;
use kindred::core::{assemble_deck, plan_transition, CoreError, PairState, RelationshipLedger};
use kindred::models::{DeckFilters, InterestEdge, InterestKind, NewProfile};
use kindred::services::{MemoryStore, ProfileStore};

const ACTIONS: [(usize, usize, InterestKind); 4] = [
    (0, 1, InterestKind::Like),
    (0, 1, InterestKind::Superlike),
    (1, 0, InterestKind::Like),
    (1, 0, InterestKind::Superlike),
];

async fn ledger_with_pair() -> (Arc<MemoryStore>, RelationshipLedger, [i64; 2]) {
    let store = Arc::new(MemoryStore::new());
    let mut ids = [0; 2];
    for (slot, name) in ids.iter_mut().zip(["a", "b"]) {
        *slot = store
            .resolve(NewProfile {
                external_id: name.to_string(),
                display_name: name.to_string(),
                visible: true,
            })
            .await
            .unwrap()
            .id;
    }
    let ledger = RelationshipLedger::new(store.clone(), store.clone());
    (store, ledger, ids)
}

/// matched on A->B implies B->A exists and is matched, or A->B is a superlike
fn assert_symmetry(edges: &[InterestEdge]) {
    for edge in edges {
        let reverse = edges
            .iter()
            .find(|e| e.from_user == edge.to_user && e.to_user == edge.from_user);

        if let Some(reverse) = reverse {
            assert_eq!(edge.matched, reverse.matched, "asymmetric pair: {:?} / {:?}", edge, reverse);
        }
        if edge.matched {
            assert!(
                reverse.is_some_and(|r| r.matched) || edge.kind == InterestKind::Superlike,
                "dangling match on {:?}",
                edge
            );
        } else {
            // An unmatched edge can never face a superlike
            assert!(!reverse.is_some_and(|r| r.kind == InterestKind::Superlike));
        }
    }
}

#[tokio::test]
async fn test_symmetry_holds_for_every_action_sequence() {
    // Every sequence of up to four actions over one pair
    for len in 1..=4u32 {
        for code in 0..4usize.pow(len) {
            let (store, ledger, ids) = ledger_with_pair().await;

            let mut rest = code;
            for _ in 0..len {
                let (from, to, kind) = ACTIONS[rest % 4];
                rest /= 4;
                ledger.record_like(ids[from], ids[to], kind).await.unwrap();

                let edges = store.all_edges().await;
                assert!(edges.len() <= 2);
                assert_symmetry(&edges);
            }
        }
    }
}

#[tokio::test]
async fn test_match_state_is_monotonic() {
    let (_store, ledger, [a, b]) = ledger_with_pair().await;

    ledger.record_like(a, b, InterestKind::Superlike).await.unwrap();
    assert!(ledger.is_match(a, b).await.unwrap());

    for kind in [InterestKind::Like, InterestKind::Superlike] {
        let outcome = ledger.record_like(a, b, kind).await.unwrap();
        assert!(outcome.is_match);
        let outcome = ledger.record_like(b, a, kind).await.unwrap();
        assert!(outcome.is_match);
    }
    assert!(ledger.is_match(b, a).await.unwrap());
}

#[tokio::test]
async fn test_partner_ids_are_unique() {
    let (_store, ledger, [a, b]) = ledger_with_pair().await;

    ledger.record_like(a, b, InterestKind::Like).await.unwrap();
    ledger.record_like(b, a, InterestKind::Superlike).await.unwrap();

    assert_eq!(ledger.match_partner_ids(a).await.unwrap(), vec![b]);
    assert_eq!(ledger.match_partner_ids(b).await.unwrap(), vec![a]);
}

#[tokio::test]
async fn test_unknown_users_are_rejected_by_the_ledger() {
    let (store, ledger, [a, _b]) = ledger_with_pair().await;

    let err = ledger.record_like(404, a, InterestKind::Like).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = ledger.record_like_as(a, 404, InterestKind::Superlike).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = ledger.record_like_as(a, a, InterestKind::Like).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));

    assert_eq!(store.num_edges().await, 0);
}

#[test]
fn test_plan_for_like_against_superlike_reverse() {
    let state = PairState {
        forward: None,
        reverse: Some(InterestEdge {
            from_user: 2,
            to_user: 1,
            kind: InterestKind::Superlike,
            matched: true,
            created_at: Utc::now(),
        }),
    };

    let t = plan_transition(1, 2, InterestKind::Like, &state, Utc::now());

    assert!(t.outcome.is_match);
    assert!(t.write.unwrap().matched);
    // Reverse is already matched; nothing to update there
    assert!(!t.match_reverse);
}

#[test]
fn test_empty_deck_for_lonely_viewer() {
    let deck = assemble_deck(1, vec![], vec![], &DeckFilters::default());
    assert!(deck.is_empty());
}
