//! Bid ledger rules: seeding, validation and ordering of a nomination's bids.

use crate::domain::{Bid, ManagerId};
use crate::error::AuctionError;

/// Parse a bid value from external input.
///
/// Accepts JSON integers and integer strings; `null` and blank strings mean
/// "no bid".
pub fn parse_bid_value(raw: &serde_json::Value) -> Result<Option<i64>, AuctionError> {
    let not_integer = || AuctionError::validation("Bid value must be an integer.");
    match raw {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n.as_i64().map(Some).ok_or_else(not_integer),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => s.trim().parse::<i64>().map(Some).map_err(|_| not_integer()),
        _ => Err(not_integer()),
    }
}

/// Reject values below the league's minimum bid.
pub fn check_floor(value: i64, minimum_bid: i64) -> Result<(), AuctionError> {
    if value < minimum_bid {
        return Err(AuctionError::validation(format!(
            "Minimum bid value is ${}.",
            minimum_bid
        )));
    }
    Ok(())
}

/// Build the initial bid rows for a new nomination: the nominator's floor bid
/// plus one empty bid for every other manager, in the order given.
pub fn seed(
    managers: &[ManagerId],
    nominator: ManagerId,
    initial_value: i64,
    minimum_bid: i64,
) -> Result<Vec<Bid>, AuctionError> {
    check_floor(initial_value, minimum_bid)?;
    if !managers.contains(&nominator) {
        return Err(AuctionError::validation(
            "The nominator is not a registered manager.",
        ));
    }

    Ok(managers
        .iter()
        .map(|&manager| {
            let value = (manager == nominator).then_some(initial_value);
            Bid::new(manager, value)
        })
        .collect())
}

/// Validate a bid update before it is written.
pub fn validate_bid(
    nominator: ManagerId,
    manager: ManagerId,
    value: Option<i64>,
    minimum_bid: i64,
) -> Result<(), AuctionError> {
    match value {
        None if manager == nominator => Err(AuctionError::validation(
            "The nominator cannot reset their bid.",
        )),
        None => Ok(()),
        Some(v) => check_floor(v, minimum_bid),
    }
}

/// Bids ordered by value descending with empty bids last; equal values keep
/// manager-id order. Enumeration only: ties are decided by settlement.
pub fn highest(bids: &[Bid]) -> Vec<Bid> {
    let mut ordered = bids.to_vec();
    ordered.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.manager_id.cmp(&b.manager_id))
    });
    ordered
}

/// Highest bid value, optionally ignoring one manager.
pub fn top_value(bids: &[Bid], exclude: Option<ManagerId>) -> Option<i64> {
    bids.iter()
        .filter(|b| Some(b.manager_id) != exclude)
        .filter_map(|b| b.value)
        .max()
}
