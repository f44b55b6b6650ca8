use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mm_common::api::page::{PageQuery, Paginated};
use mm_common::api::report_request::{NewReport, ReportUpdate};
use mm_common::api::DataResponse;
use mm_common::model::Report;

use super::pagination::validate_page;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::SharedState;

pub async fn list_reports(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<DataResponse<Paginated<Report>>>, ApiError> {
    let page = validate_page(query)?;
    let reports = state.service.list_reports(page).await?;
    Ok(Json(DataResponse::new(reports)))
}

pub async fn create_report(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<NewReport>,
) -> Result<(StatusCode, Json<DataResponse<Report>>), ApiError> {
    let report = state.service.create_report(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(report))))
}

pub async fn update_report(
    State(state): State<SharedState>,
    Path(report_id): Path<String>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<ReportUpdate>,
) -> Result<Json<DataResponse<Report>>, ApiError> {
    let report = state.service.update_report(&report_id, payload).await?;
    Ok(Json(DataResponse::new(report)))
}
