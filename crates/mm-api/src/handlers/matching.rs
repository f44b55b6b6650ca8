use axum::{extract::State, Json};
use mm_common::api::suggest::SuggestRequest;
use mm_common::api::DataResponse;
use mm_common::RankedMentor;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::SharedState;

pub async fn suggest(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(request): ApiJson<SuggestRequest>,
) -> Result<Json<DataResponse<Vec<RankedMentor>>>, ApiError> {
    if request.team_id.trim().is_empty() {
        return Err(ApiError::BadRequest("teamId is required".into()));
    }

    let ranked = state.service.suggest_mentors(&request.team_id).await?;
    Ok(Json(DataResponse::new(ranked)))
}
