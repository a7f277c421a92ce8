//! Pure computation engine(s) for deterministic auction logic.
//!
//! Nothing here touches storage; the auction service loads state, asks the
//! engine what should happen, and persists the answer in one transaction.

pub mod bids;
pub mod schedule;
pub mod settlement;
pub mod tiebreaker;

pub use schedule::{can_nominate, group_by_round, RoundPlan};
pub use settlement::{compute_award, decide_close, demotion_for, match_value, Award, CloseDecision};
pub use tiebreaker::{RankUpdates, TiebreakerError, TiebreakerOrder};
