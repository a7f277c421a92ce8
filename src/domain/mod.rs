//! Domain types for the free-agent auction.
//!
//! This module provides:
//! - Typed identifiers for managers, players, slots and nominations
//! - Millisecond timestamp conversion helpers for persistence
//! - Entity records (manager, player, slot, nomination, bid)
//! - Outbound notification records and their event kinds

pub mod manager;
pub mod nomination;
pub mod notification;
pub mod player;
pub mod primitives;
pub mod slot;

pub use manager::{Manager, NewManager};
pub use nomination::{Bid, Nomination, NominationState};
pub use notification::{EventKind, NewNotification, Notification};
pub use player::{NewPlayer, Player};
pub use primitives::{from_millis, to_millis, ManagerId, NominationId, PlayerId, SlotId};
pub use slot::Slot;
