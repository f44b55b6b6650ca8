use serde::Deserialize;

use crate::model::FeedbackFrom;

pub const MAX_NPS: u8 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub from: FeedbackFrom,
    pub to_id: String,
    pub nps: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub to_id: Option<String>,
}
