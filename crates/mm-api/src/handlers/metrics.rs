use axum::{extract::State, Json};
use mm_common::api::DataResponse;
use mm_common::model::Metrics;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn get_metrics(
    State(state): State<SharedState>,
    _auth: AuthUser,
) -> Result<Json<DataResponse<Metrics>>, ApiError> {
    let metrics = state.service.metrics().await?;
    Ok(Json(DataResponse::new(metrics)))
}
