use crate::api::AppState;
use crate::auction::PlayerEdit;
use crate::domain::{ManagerId, NewPlayer, Player, PlayerId};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlayerRequest {
    pub actor: ManagerId,
    #[serde(flatten)]
    pub player: NewPlayer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPlayerRequest {
    pub actor: ManagerId,
    #[serde(flatten)]
    pub edit: PlayerEdit,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub actor: ManagerId,
    pub contract_length: i64,
    pub salary: i64,
}

pub async fn add_player(
    State(state): State<AppState>,
    Json(body): Json<AddPlayerRequest>,
) -> Result<Json<Player>, AppError> {
    Ok(Json(state.service.add_player(body.actor, &body.player).await?))
}

/// Free agents nobody has nominated yet.
pub async fn list_available(State(state): State<AppState>) -> Result<Json<Vec<Player>>, AppError> {
    Ok(Json(state.repo().list_nominatable_players().await?))
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Player>, AppError> {
    state
        .repo()
        .get_player(PlayerId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Player {}", id)))
}

pub async fn edit_player(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<EditPlayerRequest>,
) -> Result<Json<Player>, AppError> {
    let player = state
        .service
        .admin_edit_player(body.actor, PlayerId::new(id), &body.edit)
        .await?;
    Ok(Json(player))
}

pub async fn sign_player(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SignRequest>,
) -> Result<Json<Player>, AppError> {
    let player = state
        .service
        .sign_player(body.actor, PlayerId::new(id), body.contract_length, body.salary)
        .await?;
    Ok(Json(player))
}
