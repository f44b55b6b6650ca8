use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mm_common::api::page::{PageQuery, Paginated};
use mm_common::api::team_request::{NewTeam, TeamUpdate};
use mm_common::api::DataResponse;
use mm_common::Team;

use super::pagination::validate_page;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::SharedState;

pub async fn list_teams(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<DataResponse<Paginated<Team>>>, ApiError> {
    let page = validate_page(query)?;
    let teams = state.service.list_teams(page).await?;
    Ok(Json(DataResponse::new(teams)))
}

pub async fn get_team(
    State(state): State<SharedState>,
    Path(team_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<DataResponse<Team>>, ApiError> {
    let team = state.service.get_team(&team_id).await?;
    Ok(Json(DataResponse::new(team)))
}

pub async fn create_team(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<NewTeam>,
) -> Result<(StatusCode, Json<DataResponse<Team>>), ApiError> {
    let team = state.service.create_team(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(team))))
}

pub async fn update_team(
    State(state): State<SharedState>,
    Path(team_id): Path<String>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<TeamUpdate>,
) -> Result<Json<DataResponse<Team>>, ApiError> {
    let team = state.service.update_team(&team_id, payload).await?;
    Ok(Json(DataResponse::new(team)))
}
