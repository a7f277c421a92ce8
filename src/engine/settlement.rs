//! Settlement: who wins a closed nomination, and at what price.

use super::tiebreaker::{RankUpdates, TiebreakerOrder};
use crate::domain::{Bid, ManagerId};

/// Outcome of the winner computation over a set of bids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub winner: ManagerId,
    pub value: i64,
    /// Every manager that bid `value`, in manager-id order.
    pub tied: Vec<ManagerId>,
}

impl Award {
    pub fn decided_by_tiebreak(&self) -> bool {
        self.tied.len() > 1
    }
}

/// What closing a nomination should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseDecision {
    /// Ownership goes straight to the award winner.
    Resolve(Award),
    /// The match-right holder decides; `leader` is not applied yet.
    AwaitMatch { matcher: ManagerId, leader: Award },
}

/// Compute the winner among bids, optionally ignoring one manager.
///
/// Returns `None` when no eligible bid has a value.
pub fn compute_award(
    bids: &[Bid],
    order: &TiebreakerOrder,
    exclude: Option<ManagerId>,
) -> Option<Award> {
    let eligible: Vec<&Bid> = bids
        .iter()
        .filter(|b| Some(b.manager_id) != exclude)
        .collect();
    let value = eligible.iter().filter_map(|b| b.value).max()?;

    let mut tied: Vec<ManagerId> = eligible
        .iter()
        .filter(|b| b.value == Some(value))
        .map(|b| b.manager_id)
        .collect();
    tied.sort();
    tied.dedup();

    let winner = if tied.len() == 1 {
        tied[0]
    } else {
        order.pick_tie_winner(&tied)?
    };

    Some(Award { winner, value, tied })
}

/// Decide how a nomination closes given its player's match-right holder.
pub fn decide_close(
    bids: &[Bid],
    order: &TiebreakerOrder,
    matcher: Option<ManagerId>,
) -> Option<CloseDecision> {
    let leader = compute_award(bids, order, None)?;
    match matcher {
        Some(matcher) if matcher != leader.winner => {
            Some(CloseDecision::AwaitMatch { matcher, leader })
        }
        _ => Some(CloseDecision::Resolve(leader)),
    }
}

/// Rank changes that accompany an award: a tiebreak winner goes to the back.
pub fn demotion_for(award: &Award, order: &TiebreakerOrder) -> RankUpdates {
    if award.decided_by_tiebreak() {
        order.drop_to_bottom(award.winner)
    } else {
        RankUpdates::new()
    }
}

/// Price a match-right holder pays to match `winning`.
///
/// A hometown discount takes 10% off, rounding down, but never below the
/// minimum bid. Split into tens so large bids cannot overflow.
pub fn match_value(winning: i64, hometown_discount: bool, minimum_bid: i64) -> i64 {
    if hometown_discount {
        let discounted = winning / 10 * 9 + winning % 10 * 9 / 10;
        discounted.max(minimum_bid)
    } else {
        winning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: i64) -> ManagerId {
        ManagerId::new(id)
    }

    fn bids(entries: &[(i64, Option<i64>)]) -> Vec<Bid> {
        entries.iter().map(|&(id, v)| Bid::new(m(id), v)).collect()
    }

    const A: i64 = 1;
    const B: i64 = 2;
    const C: i64 = 3;
    const D: i64 = 4;

    fn ranks_abc() -> TiebreakerOrder {
        TiebreakerOrder::new([(m(A), Some(3)), (m(B), Some(1)), (m(C), Some(2)), (m(D), Some(4))])
    }

    #[test]
    fn test_outright_winner() {
        let award = compute_award(&bids(&[(A, Some(20)), (B, Some(15))]), &ranks_abc(), None).unwrap();
        assert_eq!(award.winner, m(A));
        assert_eq!(award.value, 20);
        assert!(!award.decided_by_tiebreak());
        assert!(demotion_for(&award, &ranks_abc()).is_empty());
    }

    #[test]
    fn test_tie_goes_to_lowest_rank_then_demoted() {
        let order = ranks_abc();
        let award = compute_award(
            &bids(&[(A, Some(50)), (B, Some(50)), (C, Some(40))]),
            &order,
            None,
        )
        .unwrap();
        assert_eq!(award.winner, m(B));
        assert_eq!(award.tied, vec![m(A), m(B)]);

        let mut after = order.clone();
        after.apply(&demotion_for(&award, &order));
        assert_eq!(after.rank_of(m(B)), Some(4));
        assert_eq!(after.rank_of(m(C)), Some(1));
        assert_eq!(after.rank_of(m(A)), Some(2));
        assert_eq!(after.rank_of(m(D)), Some(3));
        assert!(after.is_dense());
    }

    #[test]
    fn test_no_values_no_award() {
        assert!(compute_award(&bids(&[(A, None), (B, None)]), &ranks_abc(), None).is_none());
        assert!(compute_award(&bids(&[(A, Some(30))]), &ranks_abc(), Some(m(A))).is_none());
    }

    #[test]
    fn test_exclusion_recomputes_tie() {
        let award = compute_award(
            &bids(&[(A, Some(30)), (B, Some(30)), (C, Some(5)), (D, Some(35))]),
            &ranks_abc(),
            Some(m(D)),
        )
        .unwrap();
        assert_eq!(award.winner, m(B));
        assert_eq!(award.value, 30);
    }

    #[test]
    fn test_close_awaits_match_when_holder_not_leading() {
        let decision = decide_close(&bids(&[(A, Some(30)), (B, Some(10))]), &ranks_abc(), Some(m(C))).unwrap();
        match decision {
            CloseDecision::AwaitMatch { matcher, leader } => {
                assert_eq!(matcher, m(C));
                assert_eq!(leader.winner, m(A));
            }
            other => panic!("expected AwaitMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_close_resolves_when_holder_leads() {
        let decision = decide_close(&bids(&[(A, Some(30)), (C, Some(40))]), &ranks_abc(), Some(m(C))).unwrap();
        assert!(matches!(decision, CloseDecision::Resolve(ref a) if a.winner == m(C)));
    }

    #[test]
    fn test_close_without_matcher_resolves() {
        let decision = decide_close(&bids(&[(A, Some(20)), (B, Some(15))]), &ranks_abc(), None).unwrap();
        assert!(matches!(decision, CloseDecision::Resolve(ref a) if a.winner == m(A)));
    }

    #[test]
    fn test_match_value_discount_rounds_down() {
        assert_eq!(match_value(101, true, 11), 90);
        assert_eq!(match_value(101, false, 11), 101);
    }

    #[test]
    fn test_match_value_discount_clamped_to_floor() {
        assert_eq!(match_value(101, true, 95), 95);
        assert_eq!(match_value(11, true, 11), 11);
    }

    #[test]
    fn test_match_value_large_bid_does_not_overflow() {
        assert_eq!(match_value(i64::MAX, true, 11), 8_301_034_833_169_298_226);
        let half = i64::MAX / 2;
        assert_eq!(match_value(half, true, 11), half / 10 * 9 + half % 10 * 9 / 10);
        assert!(match_value(half, true, 11) > half / 2);
    }
}
