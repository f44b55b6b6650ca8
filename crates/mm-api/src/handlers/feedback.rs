use axum::{extract::State, http::StatusCode, Json};
use mm_common::api::feedback_request::{FeedbackQuery, NewFeedback};
use mm_common::api::DataResponse;
use mm_common::model::Feedback;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::SharedState;

pub async fn list_feedback(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<FeedbackQuery>,
) -> Result<Json<DataResponse<Vec<Feedback>>>, ApiError> {
    let feedback = state.service.list_feedback(query.to_id.as_deref()).await?;
    Ok(Json(DataResponse::new(feedback)))
}

pub async fn submit_feedback(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<NewFeedback>,
) -> Result<(StatusCode, Json<DataResponse<Feedback>>), ApiError> {
    let feedback = state.service.create_feedback(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(feedback))))
}
