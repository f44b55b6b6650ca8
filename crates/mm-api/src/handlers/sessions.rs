use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mm_common::api::match_request::ParticipantFilter;
use mm_common::api::session_request::{NewSession, SessionUpdate};
use mm_common::api::DataResponse;
use mm_common::model::Session;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::SharedState;

pub async fn list_sessions(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(filter): ApiQuery<ParticipantFilter>,
) -> Result<Json<DataResponse<Vec<Session>>>, ApiError> {
    let sessions = state.service.list_sessions(&filter).await?;
    Ok(Json(DataResponse::new(sessions)))
}

pub async fn create_session(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<NewSession>,
) -> Result<(StatusCode, Json<DataResponse<Session>>), ApiError> {
    let session = state.service.create_session(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(session))))
}

pub async fn update_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<SessionUpdate>,
) -> Result<Json<DataResponse<Session>>, ApiError> {
    let session = state.service.update_session(&session_id, payload).await?;
    Ok(Json(DataResponse::new(session)))
}
