use chrono::Utc;
use tracing::{info, instrument};

use super::{not_found, require_text, MentorshipService, ServiceError};
use crate::api::match_request::ParticipantFilter;
use crate::api::mentor_request::MentorFilter;
use crate::api::page::{PageQuery, Paginated};
use crate::api::report_request::{NewReport, ReportUpdate};
use crate::ids;
use crate::model::{Metrics, Report, ReportStatus};

impl MentorshipService {
    pub async fn list_reports(&self, page: PageQuery) -> Result<Paginated<Report>, ServiceError> {
        let reports = self.store.list_reports().await?;
        Ok(Paginated::from_items(reports, page))
    }

    #[instrument(skip(self, request), fields(target_id = %request.target_id))]
    pub async fn create_report(&self, request: NewReport) -> Result<Report, ServiceError> {
        require_text("targetId", &request.target_id)?;
        require_text("reason", &request.reason)?;

        let now = Utc::now();
        let report = Report {
            id: ids::generate("report"),
            target_type: request.target_type,
            target_id: request.target_id,
            reason: request.reason,
            details: request.details,
            created_by: request.created_by,
            status: ReportStatus::New,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_report(&report).await?;
        info!(report_id = %report.id, "report filed");
        Ok(report)
    }

    #[instrument(skip(self, update))]
    pub async fn update_report(&self, id: &str, update: ReportUpdate) -> Result<Report, ServiceError> {
        let mut report = self
            .store
            .get_report(id)
            .await?
            .ok_or_else(|| not_found("report", id))?;
        update.apply(&mut report);
        require_text("reason", &report.reason)?;
        report.updated_at = Utc::now();

        if !self.store.update_report(&report).await? {
            return Err(not_found("report", id));
        }
        info!(report_id = %report.id, status = report.status.as_ref(), "report updated");
        Ok(report)
    }

    /// Aggregates computed from the current contents of the store.
    pub async fn metrics(&self) -> Result<Metrics, ServiceError> {
        let everyone = ParticipantFilter::default();
        let teams = self.store.list_teams().await?;
        let mentors = self.store.list_mentors(&MentorFilter::default()).await?;
        let matches = self.store.list_matches(&everyone).await?;
        let sessions = self.store.list_sessions(&everyone).await?;
        let feedback = self.store.list_feedback(None).await?;
        let reports = self.store.list_reports().await?;

        let avg_nps = if feedback.is_empty() {
            0.0
        } else {
            feedback.iter().map(|f| f64::from(f.nps)).sum::<f64>() / feedback.len() as f64
        };

        Ok(Metrics {
            total_teams: teams.len(),
            total_mentors: mentors.len(),
            total_matches: matches.len(),
            total_sessions: sessions.len(),
            avg_nps,
            flagged_reports: reports
                .iter()
                .filter(|r| r.status == ReportStatus::New)
                .count(),
        })
    }
}
