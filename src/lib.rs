pub mod api;
pub mod auction;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod notify;

pub use auction::{AuctionService, CloseOutcome};
pub use config::{AuctionSettings, Config};
pub use db::{init_db, Repository};
pub use domain::{
    Bid, EventKind, Manager, ManagerId, Nomination, NominationId, NominationState, Notification,
    Player, PlayerId, Slot, SlotId,
};
pub use error::{AppError, AuctionError, ErrorKind};
pub use notify::{NotificationEmitter, RecordingEmitter};
