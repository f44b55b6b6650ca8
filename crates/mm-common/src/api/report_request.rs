use serde::Deserialize;

use crate::model::{Report, ReportStatus, ReportTarget};

/// Incoming moderation report. Status is always `new` on creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub target_type: ReportTarget,
    pub target_id: String,
    pub reason: String,
    #[serde(default)]
    pub details: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUpdate {
    pub reason: Option<String>,
    pub details: Option<String>,
    pub status: Option<ReportStatus>,
}

impl ReportUpdate {
    pub fn apply(self, report: &mut Report) {
        if let Some(reason) = self.reason {
            report.reason = reason;
        }
        if self.details.is_some() {
            report.details = self.details;
        }
        if let Some(status) = self.status {
            report.status = status;
        }
    }
}
