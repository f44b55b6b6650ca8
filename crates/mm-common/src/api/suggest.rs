use serde::Deserialize;

/// Body of `POST /matching/suggest`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub team_id: String,
}
