//! Rotating tiebreaker order.
//!
//! Ranks form a strict total order over ranked managers (1 = first in line).
//! The order itself is pure; persistence applies the returned [`RankUpdates`]
//! by clearing every affected rank before reassigning, so the unique
//! constraint is never violated mid-transaction.

use crate::domain::ManagerId;
use crate::error::AuctionError;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// New rank per manager; managers not listed keep their rank.
pub type RankUpdates = BTreeMap<ManagerId, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TiebreakerError {
    #[error("Tiebreaker order values must be positive integers.")]
    NonPositive,
    #[error("Tiebreaker order values must be unique.")]
    Duplicate,
    #[error("Manager {0}")]
    UnknownManager(ManagerId),
}

impl From<TiebreakerError> for AuctionError {
    fn from(err: TiebreakerError) -> Self {
        match err {
            TiebreakerError::NonPositive => AuctionError::Validation(err.to_string()),
            TiebreakerError::Duplicate => AuctionError::Conflict(err.to_string()),
            TiebreakerError::UnknownManager(_) => AuctionError::NotFound(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TiebreakerOrder {
    ranks: BTreeMap<ManagerId, Option<i64>>,
}

impl TiebreakerOrder {
    pub fn new(entries: impl IntoIterator<Item = (ManagerId, Option<i64>)>) -> Self {
        Self {
            ranks: entries.into_iter().collect(),
        }
    }

    pub fn rank_of(&self, manager: ManagerId) -> Option<i64> {
        self.ranks.get(&manager).copied().flatten()
    }

    /// Ranked managers, first in line first.
    pub fn ranked(&self) -> Vec<(ManagerId, i64)> {
        let mut ranked: Vec<_> = self
            .ranks
            .iter()
            .filter_map(|(&m, &r)| r.map(|r| (m, r)))
            .collect();
        ranked.sort_by_key(|&(m, r)| (r, m));
        ranked
    }

    pub fn max_rank(&self) -> Option<i64> {
        self.ranks.values().filter_map(|r| *r).max()
    }

    /// True when ranks are exactly 1..=n over the ranked managers.
    pub fn is_dense(&self) -> bool {
        self.ranked()
            .iter()
            .enumerate()
            .all(|(i, &(_, r))| r == i as i64 + 1)
    }

    /// Choose among tied managers: lowest rank wins, ranked before unranked,
    /// manager id as the final deterministic fallback.
    pub fn pick_tie_winner(&self, tied: &[ManagerId]) -> Option<ManagerId> {
        tied.iter()
            .copied()
            .min_by_key(|&m| {
                let rank = self.rank_of(m);
                (rank.is_none(), rank, m)
            })
    }

    /// Plan moving `manager` to the back of the line.
    ///
    /// Every manager ranked behind them moves up one place. Returns no updates
    /// when the manager is unranked or already last.
    pub fn drop_to_bottom(&self, manager: ManagerId) -> RankUpdates {
        let mut updates = RankUpdates::new();
        let Some(original) = self.rank_of(manager) else {
            return updates;
        };

        let mut max_rank = original;
        for (&other, &rank) in &self.ranks {
            if let Some(rank) = rank {
                if rank > original {
                    max_rank = max_rank.max(rank);
                    updates.insert(other, rank - 1);
                }
            }
        }

        if !updates.is_empty() {
            updates.insert(manager, max_rank);
        }
        updates
    }

    /// Plan a batch of explicit rank edits.
    ///
    /// Only edits that change a rank are returned. Fails if any rank is not
    /// positive, a manager is unknown, or the resulting ranks collide.
    pub fn reorder(&self, edits: &BTreeMap<ManagerId, i64>) -> Result<RankUpdates, TiebreakerError> {
        for (&manager, &rank) in edits {
            if !self.ranks.contains_key(&manager) {
                return Err(TiebreakerError::UnknownManager(manager));
            }
            if rank <= 0 {
                return Err(TiebreakerError::NonPositive);
            }
        }

        let mut seen = HashSet::new();
        for (manager, current) in &self.ranks {
            let resulting = edits.get(manager).copied().or(*current);
            if let Some(rank) = resulting {
                if !seen.insert(rank) {
                    return Err(TiebreakerError::Duplicate);
                }
            }
        }

        Ok(edits
            .iter()
            .filter(|&(&m, &r)| self.rank_of(m) != Some(r))
            .map(|(&m, &r)| (m, r))
            .collect())
    }

    pub fn apply(&mut self, updates: &RankUpdates) {
        for (&manager, &rank) in updates {
            self.ranks.insert(manager, Some(rank));
        }
    }
}
