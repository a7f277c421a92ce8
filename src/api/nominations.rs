use crate::api::{ActorQuery, AppState};
use crate::auction::CloseOutcome;
use crate::domain::{Bid, ManagerId, Nomination, NominationId, PlayerId, SlotId};
use crate::engine::bids;
use crate::error::{AppError, AuctionError};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominateRequest {
    pub actor: ManagerId,
    pub player_id: PlayerId,
    pub slot_id: SlotId,
    /// Integer or integer string.
    pub bid_value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub actor: ManagerId,
    /// `null` or blank clears the bid.
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub actor: ManagerId,
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditNominationRequest {
    pub actor: ManagerId,
    pub slot_id: SlotId,
    #[serde(default)]
    pub owner_id: Option<ManagerId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NominationDetail {
    #[serde(flatten)]
    pub nomination: Nomination,
    /// Highest first; empty bids last.
    pub bids: Vec<Bid>,
}

pub async fn list_nominations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Nomination>>, AppError> {
    Ok(Json(state.repo().list_nominations().await?))
}

pub async fn get_nomination(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NominationDetail>, AppError> {
    let id = NominationId::new(id);
    let nomination = state
        .repo()
        .get_nomination(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Nomination {}", id)))?;
    let ledger = state.repo().bids_for(id).await?;

    Ok(Json(NominationDetail {
        nomination,
        bids: bids::highest(&ledger),
    }))
}

pub async fn nominate(
    State(state): State<AppState>,
    Json(body): Json<NominateRequest>,
) -> Result<(StatusCode, Json<Nomination>), AppError> {
    let value = bids::parse_bid_value(&body.bid_value)?
        .ok_or_else(|| AuctionError::validation("Nominations require a bid value."))?;
    let nomination = state
        .service
        .nominate(body.actor, body.player_id, body.slot_id, value, state.now())
        .await?;
    Ok((StatusCode::CREATED, Json(nomination)))
}

pub async fn place_bid(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<BidRequest>,
) -> Result<Json<Bid>, AppError> {
    let value = bids::parse_bid_value(&body.value)?;
    let bid = state
        .service
        .place_bid(body.actor, NominationId::new(id), value, state.now())
        .await?;
    Ok(Json(bid))
}

pub async fn decide_match(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<MatchRequest>,
) -> Result<Json<Nomination>, AppError> {
    let nomination = state
        .service
        .decide_match(body.actor, NominationId::new(id), body.accept, state.now())
        .await?;
    Ok(Json(nomination))
}

pub async fn edit_nomination(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<EditNominationRequest>,
) -> Result<Json<Nomination>, AppError> {
    let nomination = state
        .service
        .admin_edit(
            body.actor,
            NominationId::new(id),
            body.slot_id,
            body.owner_id,
            state.now(),
        )
        .await?;
    Ok(Json(nomination))
}

pub async fn delete_nomination(
    Query(params): Query<ActorQuery>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .service
        .admin_delete(params.actor, NominationId::new(id), state.now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Settle one closed nomination without waiting for the sweep.
pub async fn close_nomination(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CloseOutcome>, AppError> {
    let outcome = state
        .service
        .close(NominationId::new(id), state.now())
        .await?;
    Ok(Json(outcome))
}
