use chrono::Utc;
use tracing::{info, instrument};

use super::{not_found, require_text, MentorshipService, ServiceError};
use crate::api::feedback_request::{NewFeedback, MAX_NPS};
use crate::api::match_request::{MatchUpdate, NewMatch, ParticipantFilter};
use crate::api::session_request::{NewSession, SessionUpdate};
use crate::ids;
use crate::matching::MatchFactors;
use crate::model::{Feedback, Match, Session};

fn validate_match(score: u8, factors: &MatchFactors) -> Result<(), ServiceError> {
    if score > 100 {
        return Err(ServiceError::Validation(format!(
            "score must be between 0 and 100, got {score}"
        )));
    }

    let values = [
        factors.area,
        factors.schedule,
        factors.language,
        factors.modality,
        factors.region,
    ];
    if values.iter().any(|v| !(0.0..=100.0).contains(v)) {
        return Err(ServiceError::Validation(
            "match factors must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

impl MentorshipService {
    async fn require_participants(&self, team_id: &str, mentor_id: &str) -> Result<(), ServiceError> {
        require_text("teamId", team_id)?;
        require_text("mentorId", mentor_id)?;
        self.get_team(team_id).await?;
        self.get_mentor(mentor_id).await?;
        Ok(())
    }

    pub async fn list_matches(&self, filter: &ParticipantFilter) -> Result<Vec<Match>, ServiceError> {
        Ok(self.store.list_matches(filter).await?)
    }

    #[instrument(skip(self, request), fields(team_id = %request.team_id, mentor_id = %request.mentor_id))]
    pub async fn create_match(&self, request: NewMatch) -> Result<Match, ServiceError> {
        validate_match(request.score, &request.factors)?;
        self.require_participants(&request.team_id, &request.mentor_id)
            .await?;

        let now = Utc::now();
        let record = Match {
            id: ids::generate("match"),
            team_id: request.team_id,
            mentor_id: request.mentor_id,
            score: request.score,
            factors: request.factors,
            status: request.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_match(&record).await?;
        info!(match_id = %record.id, status = record.status.as_ref(), "match created");
        Ok(record)
    }

    #[instrument(skip(self, update))]
    pub async fn update_match(&self, id: &str, update: MatchUpdate) -> Result<Match, ServiceError> {
        let mut record = self
            .store
            .get_match(id)
            .await?
            .ok_or_else(|| not_found("match", id))?;
        update.apply(&mut record);
        validate_match(record.score, &record.factors)?;
        record.updated_at = Utc::now();

        if !self.store.update_match(&record).await? {
            return Err(not_found("match", id));
        }
        Ok(record)
    }

    pub async fn list_sessions(&self, filter: &ParticipantFilter) -> Result<Vec<Session>, ServiceError> {
        Ok(self.store.list_sessions(filter).await?)
    }

    #[instrument(skip(self, request), fields(team_id = %request.team_id, mentor_id = %request.mentor_id))]
    pub async fn create_session(&self, request: NewSession) -> Result<Session, ServiceError> {
        require_text("title", &request.title)?;
        require_text("createdBy", &request.created_by)?;
        if request.duration_min == 0 {
            return Err(ServiceError::Validation("durationMin must be positive".into()));
        }
        self.require_participants(&request.team_id, &request.mentor_id)
            .await?;

        let now = Utc::now();
        let session = Session {
            id: ids::generate("session"),
            team_id: request.team_id,
            mentor_id: request.mentor_id,
            title: request.title,
            date_iso: request.date_iso,
            duration_min: request.duration_min,
            tags: request.tags,
            notes: request.notes,
            meeting_url: request.meeting_url,
            calendar_provider: request.calendar_provider,
            created_by: request.created_by,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_session(&session).await?;
        info!(session_id = %session.id, "session scheduled");
        Ok(session)
    }

    #[instrument(skip(self, update))]
    pub async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<Session, ServiceError> {
        let mut session = self
            .store
            .get_session(id)
            .await?
            .ok_or_else(|| not_found("session", id))?;
        update.apply(&mut session);
        if session.duration_min == 0 {
            return Err(ServiceError::Validation("durationMin must be positive".into()));
        }
        session.updated_at = Utc::now();

        if !self.store.update_session(&session).await? {
            return Err(not_found("session", id));
        }
        Ok(session)
    }

    pub async fn list_feedback(&self, to_id: Option<&str>) -> Result<Vec<Feedback>, ServiceError> {
        Ok(self.store.list_feedback(to_id).await?)
    }

    #[instrument(skip(self, request), fields(to_id = %request.to_id, nps = request.nps))]
    pub async fn create_feedback(&self, request: NewFeedback) -> Result<Feedback, ServiceError> {
        if request.nps > MAX_NPS {
            return Err(ServiceError::Validation(format!(
                "nps must be between 0 and {MAX_NPS}, got {}",
                request.nps
            )));
        }
        require_text("toId", &request.to_id)?;

        let feedback = Feedback {
            id: ids::generate("feedback"),
            from: request.from,
            to_id: request.to_id,
            nps: request.nps,
            comment: request.comment,
            session_id: request.session_id,
            created_by: request.created_by,
            created_at: Utc::now(),
        };

        self.store.insert_feedback(&feedback).await?;
        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::{FeedbackFrom, MatchStatus};
    use crate::service::test_support::{seeded_service, service};

    fn new_match(team_id: &str, mentor_id: &str) -> NewMatch {
        NewMatch {
            team_id: team_id.into(),
            mentor_id: mentor_id.into(),
            score: 68,
            factors: MatchFactors {
                area: 50.0,
                schedule: 50.0,
                language: 100.0,
                modality: 100.0,
                region: 100.0,
            },
            status: None,
        }
    }

    fn new_session(team_id: &str) -> NewSession {
        NewSession {
            team_id: team_id.into(),
            mentor_id: "mentor-1".into(),
            title: "Revisao do robo".into(),
            date_iso: Utc.with_ymd_and_hms(2024, 5, 6, 18, 0, 0).unwrap(),
            duration_min: 60,
            tags: vec!["cad".into()],
            notes: None,
            meeting_url: None,
            calendar_provider: None,
            created_by: "user-1".into(),
        }
    }

    fn new_feedback(to_id: &str, nps: u8) -> NewFeedback {
        NewFeedback {
            from: FeedbackFrom::Team,
            to_id: to_id.into(),
            nps,
            comment: None,
            session_id: None,
            created_by: "user-1".into(),
        }
    }

    #[tokio::test]
    async fn new_matches_default_to_suggested() {
        let svc = seeded_service();
        let created = svc.create_match(new_match("team-1", "mentor-1")).await.unwrap();
        assert_eq!(created.status, MatchStatus::Suggested);

        let accepted = svc
            .update_match(
                &created.id,
                MatchUpdate {
                    status: Some(MatchStatus::Accepted),
                    ..MatchUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(accepted.status, MatchStatus::Accepted);
        assert_eq!(accepted.score, 68);
    }

    #[tokio::test]
    async fn rejects_out_of_range_match_score() {
        let svc = seeded_service();
        let mut request = new_match("team-1", "mentor-1");
        request.score = 101;
        assert!(matches!(
            svc.create_match(request).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn filters_matches_by_participant() {
        let svc = seeded_service();
        svc.create_match(new_match("team-1", "mentor-1")).await.unwrap();
        svc.create_match(new_match("team-2", "mentor-1")).await.unwrap();
        svc.create_match(new_match("team-2", "mentor-2")).await.unwrap();

        let team_two = ParticipantFilter {
            team_id: Some("team-2".into()),
            mentor_id: None,
        };
        assert_eq!(svc.list_matches(&team_two).await.unwrap().len(), 2);

        let both = ParticipantFilter {
            team_id: Some("team-2".into()),
            mentor_id: Some("mentor-1".into()),
        };
        assert_eq!(svc.list_matches(&both).await.unwrap().len(), 1);
        assert_eq!(svc.list_matches(&ParticipantFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn sessions_can_be_rescheduled() {
        let svc = seeded_service();
        let session = svc.create_session(new_session("team-1")).await.unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 13, 18, 0, 0).unwrap();

        let moved = svc
            .update_session(
                &session.id,
                SessionUpdate {
                    date_iso: Some(later),
                    ..SessionUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.date_iso, later);
        assert_eq!(moved.title, session.title);

        let listed = svc
            .list_sessions(&ParticipantFilter {
                team_id: Some("team-1".into()),
                mentor_id: None,
            })
            .await
            .unwrap();
        assert_eq!(listed, vec![moved]);
    }

    #[tokio::test]
    async fn rejects_zero_length_session() {
        let svc = seeded_service();
        let mut request = new_session("team-1");
        request.duration_min = 0;
        assert!(svc.create_session(request).await.is_err());
    }

    #[tokio::test]
    async fn match_with_unknown_mentor_is_not_found() {
        let svc = seeded_service();
        let err = svc
            .create_match(new_match("team-1", "mentor-missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.contains("mentor-missing")));
        assert!(svc.list_matches(&ParticipantFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_with_unknown_team_is_not_found() {
        let svc = seeded_service();
        let err = svc.create_session(new_session("team-missing")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.contains("team-missing")));
    }

    #[tokio::test]
    async fn feedback_enforces_nps_range_and_filters_by_target() {
        let svc = service();
        let err = svc.create_feedback(new_feedback("mentor-1", 11)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("nps")));

        svc.create_feedback(new_feedback("mentor-1", 9)).await.unwrap();
        svc.create_feedback(new_feedback("mentor-2", 7)).await.unwrap();

        assert_eq!(svc.list_feedback(Some("mentor-1")).await.unwrap().len(), 1);
        assert_eq!(svc.list_feedback(None).await.unwrap().len(), 2);
    }
}
