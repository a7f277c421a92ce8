use crate::api::AppState;
use crate::domain::{Manager, ManagerId, NewManager};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEdit {
    pub manager_id: ManagerId,
    pub rank: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiebreakerRequest {
    pub actor: ManagerId,
    pub ranks: Vec<RankEdit>,
}

pub async fn list_managers(State(state): State<AppState>) -> Result<Json<Vec<Manager>>, AppError> {
    Ok(Json(state.repo().list_managers().await?))
}

pub async fn register_manager(
    State(state): State<AppState>,
    Json(body): Json<NewManager>,
) -> Result<Json<Manager>, AppError> {
    let manager = state.service.register_manager(&body, state.now()).await?;
    Ok(Json(manager))
}

/// Apply rank edits; responds with every manager in the new order.
pub async fn reorder_tiebreaker(
    State(state): State<AppState>,
    Json(body): Json<TiebreakerRequest>,
) -> Result<Json<Vec<Manager>>, AppError> {
    let mut edits = BTreeMap::new();
    for edit in body.ranks {
        if edits.insert(edit.manager_id, edit.rank).is_some() {
            return Err(AppError::BadRequest(format!(
                "Manager {} appears more than once",
                edit.manager_id
            )));
        }
    }

    let mut managers = state.service.tiebreaker_reorder(body.actor, &edits).await?;
    managers.sort_by_key(|m| (m.tiebreaker_rank.is_none(), m.tiebreaker_rank, m.id));
    Ok(Json(managers))
}
