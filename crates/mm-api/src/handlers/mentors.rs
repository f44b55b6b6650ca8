use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mm_common::api::mentor_request::{MentorFilter, MentorUpdate, NewMentor};
use mm_common::api::page::{PageQuery, Paginated, DEFAULT_LIMIT, DEFAULT_PAGE};
use mm_common::api::DataResponse;
use mm_common::Mentor;
use serde::Deserialize;

use super::pagination::validate_page;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct MentorListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub region: Option<String>,
    pub language: Option<String>,
    pub skill: Option<String>,
    pub approved: Option<bool>,
}

impl MentorListQuery {
    fn split(self) -> (MentorFilter, PageQuery) {
        let page = PageQuery {
            page: self.page.unwrap_or(DEFAULT_PAGE),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
        };
        let filter = MentorFilter {
            region: self.region,
            language: self.language,
            skill: self.skill,
            approved: self.approved,
        };
        (filter, page)
    }
}

pub async fn list_mentors(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<MentorListQuery>,
) -> Result<Json<DataResponse<Paginated<Mentor>>>, ApiError> {
    let (filter, page) = query.split();
    let page = validate_page(page)?;
    let mentors = state.service.list_mentors(&filter, page).await?;
    Ok(Json(DataResponse::new(mentors)))
}

pub async fn get_mentor(
    State(state): State<SharedState>,
    Path(mentor_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<DataResponse<Mentor>>, ApiError> {
    let mentor = state.service.get_mentor(&mentor_id).await?;
    Ok(Json(DataResponse::new(mentor)))
}

pub async fn create_mentor(
    State(state): State<SharedState>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<NewMentor>,
) -> Result<(StatusCode, Json<DataResponse<Mentor>>), ApiError> {
    let mentor = state.service.create_mentor(payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(mentor))))
}

pub async fn update_mentor(
    State(state): State<SharedState>,
    Path(mentor_id): Path<String>,
    _auth: AuthUser,
    ApiJson(payload): ApiJson<MentorUpdate>,
) -> Result<Json<DataResponse<Mentor>>, ApiError> {
    let mentor = state.service.update_mentor(&mentor_id, payload).await?;
    Ok(Json(DataResponse::new(mentor)))
}

pub async fn approve_mentor(
    State(state): State<SharedState>,
    Path(mentor_id): Path<String>,
    _auth: AuthUser,
) -> Result<Json<DataResponse<Mentor>>, ApiError> {
    let mentor = state.service.approve_mentor(&mentor_id).await?;
    Ok(Json(DataResponse::new(mentor)))
}
