pub mod account_request;
pub mod feedback_request;
pub mod match_request;
pub mod mentor_request;
pub mod page;
pub mod report_request;
pub mod session_request;
pub mod suggest;
pub mod team_request;

use serde::Serialize;

/// Success envelope shared by every endpoint: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
