use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mm_common::api::match_request::{MatchUpdate, NewMatch, ParticipantFilter};
use mm_common::api::DataResponse;
use mm_common::model::Match;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::SharedState;

pub async fn list_matches(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(filter): ApiQuery<ParticipantFilter>,
) -> Result<Json<DataResponse<Vec<Match>>>, ApiError> {
    let matches = state.service.list_matches(&filter).await?;
    Ok(Json(DataResponse::new(matches)))
}

pub async fn create_match(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<NewMatch>,
) -> Result<(StatusCode, Json<DataResponse<Match>>), ApiError> {
    let record = state.service.create_match(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

pub async fn update_match(
    State(state): State<SharedState>,
    Path(match_id): Path<String>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<MatchUpdate>,
) -> Result<Json<DataResponse<Match>>, ApiError> {
    let record = state.service.update_match(&match_id, payload).await?;
    Ok(Json(DataResponse::new(record)))
}
