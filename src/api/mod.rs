pub mod health;
pub mod managers;
pub mod nominations;
pub mod players;
pub mod rounds;

use crate::auction::AuctionService;
use crate::db::Repository;
use crate::domain::ManagerId;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Source of "now" for command handlers.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub service: AuctionService,
    pub clock: Clock,
}

impl AppState {
    pub fn new(service: AuctionService) -> Self {
        Self {
            service,
            clock: Arc::new(Utc::now),
        }
    }

    /// Pin handler time, e.g. to replay a deadline in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn repo(&self) -> &Arc<Repository> {
        self.service.repo()
    }
}

/// Acting manager for requests without a body.
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor: ManagerId,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/managers",
            get(managers::list_managers).post(managers::register_manager),
        )
        .route("/v1/tiebreaker", put(managers::reorder_tiebreaker))
        .route("/v1/players", post(players::add_player))
        .route("/v1/players/available", get(players::list_available))
        .route(
            "/v1/players/:id",
            get(players::get_player).put(players::edit_player),
        )
        .route("/v1/players/:id/sign", post(players::sign_player))
        .route("/v1/rounds", post(rounds::create_round))
        .route("/v1/rounds/:round", delete(rounds::delete_round))
        .route("/v1/slots", get(rounds::list_open_slots))
        .route("/v1/slots/nominatable", get(rounds::list_nominatable_slots))
        .route(
            "/v1/nominations",
            get(nominations::list_nominations).post(nominations::nominate),
        )
        .route(
            "/v1/nominations/:id",
            get(nominations::get_nomination)
                .put(nominations::edit_nomination)
                .delete(nominations::delete_nomination),
        )
        .route("/v1/nominations/:id/bid", put(nominations::place_bid))
        .route("/v1/nominations/:id/match", post(nominations::decide_match))
        .route("/v1/nominations/:id/close", post(nominations::close_nomination))
        .layer(cors)
        .with_state(state)
}
