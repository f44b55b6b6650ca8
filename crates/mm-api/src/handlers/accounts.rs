use axum::{extract::State, http::StatusCode, Json};
use mm_common::api::account_request::{Credentials, NewUser, ProfileUpdate};
use mm_common::api::DataResponse;
use mm_common::model::User;
use serde::Serialize;

use crate::auth::{issue_token, CurrentUser, IssuedToken};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub user: User,
    #[serde(flatten)]
    pub token: IssuedToken,
}

fn session_for(state: &SharedState, user: User) -> Result<AuthSession, ApiError> {
    let token = issue_token(&state.config.auth, &user)?;
    Ok(AuthSession { user, token })
}

pub async fn register(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<DataResponse<AuthSession>>), ApiError> {
    // Fail before creating an account nobody could sign in to.
    if state.config.auth.jwt_secret.is_none() {
        return Err(ApiError::ServiceUnavailable("JWT_SECRET is not set; registration is disabled".into()));
    }
    let user = state.service.register_user(payload).await?;
    let session = session_for(&state, user)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(session))))
}

pub async fn login(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> Result<Json<DataResponse<AuthSession>>, ApiError> {
    let user = state.service.authenticate(payload).await?;
    let session = session_for(&state, user)?;
    Ok(Json(DataResponse::new(session)))
}

pub async fn me(
    State(state): State<SharedState>,
    current: CurrentUser,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let user = state.service.get_user(&current.user_id).await?;
    Ok(Json(DataResponse::new(user)))
}

pub async fn update_me(
    State(state): State<SharedState>,
    current: CurrentUser,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let user = state.service.update_profile(&current.user_id, payload).await?;
    Ok(Json(DataResponse::new(user)))
}
