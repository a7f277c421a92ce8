use crate::api::{ActorQuery, AppState};
use crate::auction::{RoundDeletion, SlotFilter};
use crate::domain::{ManagerId, Slot};
use crate::engine::RoundPlan;
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoundRequest {
    pub actor: ManagerId,
    #[serde(flatten)]
    pub plan: RoundPlan,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub round: Option<i64>,
    /// Restrict to slots taking nominations right now.
    #[serde(default)]
    pub nominatable: bool,
}

#[derive(Debug, Deserialize)]
pub struct ManagerQuery {
    pub manager: ManagerId,
}

pub async fn create_round(
    State(state): State<AppState>,
    Json(body): Json<CreateRoundRequest>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let slots = state
        .service
        .create_round(body.actor, &body.plan, state.now())
        .await?;
    Ok(Json(slots))
}

pub async fn delete_round(
    Query(params): Query<ActorQuery>,
    State(state): State<AppState>,
    Path(round): Path<i64>,
) -> Result<Json<RoundDeletion>, AppError> {
    let outcome = state
        .service
        .delete_round(params.actor, round, state.now())
        .await?;
    Ok(Json(outcome))
}

pub async fn list_open_slots(
    Query(params): Query<SlotsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let filter = SlotFilter {
        round: params.round,
        nominatable_at: params.nominatable.then(|| state.now()),
    };
    Ok(Json(state.service.open_slots(filter).await?))
}

/// Slots the manager could nominate into now, keyed by round.
pub async fn list_nominatable_slots(
    Query(params): Query<ManagerQuery>,
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<i64, Vec<Slot>>>, AppError> {
    let slots = state
        .service
        .nominatable_slots(params.manager, state.now())
        .await?;
    Ok(Json(slots))
}
