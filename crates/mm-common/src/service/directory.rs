use chrono::Utc;
use tracing::{info, instrument};

use super::{not_found, require_text, MentorshipService, ServiceError};
use crate::api::mentor_request::{MentorFilter, MentorUpdate, NewMentor};
use crate::api::page::{PageQuery, Paginated};
use crate::api::team_request::{NewTeam, TeamUpdate};
use crate::ids;
use crate::matching::validation::{validate_mentor, validate_team};
use crate::model::{Mentor, Team};

// Stored teams and mentors must pass the same checks `rank` applies.
fn validate_team_fields(team: &Team) -> Result<(), ServiceError> {
    require_text("name", &team.name)?;
    require_text("school", &team.school)?;
    require_text("region", &team.region)?;
    require_text("coachContact", &team.coach_contact)?;
    Ok(validate_team(team)?)
}

fn validate_mentor_fields(mentor: &Mentor) -> Result<(), ServiceError> {
    require_text("userId", &mentor.user_id)?;
    require_text("timezone", &mentor.timezone)?;
    Ok(validate_mentor(mentor)?)
}

impl MentorshipService {
    pub async fn list_teams(&self, page: PageQuery) -> Result<Paginated<Team>, ServiceError> {
        let teams = self.store.list_teams().await?;
        Ok(Paginated::from_items(teams, page))
    }

    pub async fn get_team(&self, id: &str) -> Result<Team, ServiceError> {
        self.store
            .get_team(id)
            .await?
            .ok_or_else(|| not_found("team", id))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_team(&self, request: NewTeam) -> Result<Team, ServiceError> {
        let now = Utc::now();
        let team = Team {
            id: ids::generate("team"),
            name: request.name,
            school: request.school,
            region: request.region,
            needs: request.needs,
            languages: request.languages,
            availability: request.availability,
            modality: request.modality,
            steam_areas: request.steam_areas,
            coach_contact: request.coach_contact,
            notes: request.notes,
            user_id: request.user_id,
            created_at: now,
            updated_at: now,
        };
        validate_team_fields(&team)?;

        self.store.insert_team(&team).await?;
        info!(team_id = %team.id, "team created");
        Ok(team)
    }

    #[instrument(skip(self, update))]
    pub async fn update_team(&self, id: &str, update: TeamUpdate) -> Result<Team, ServiceError> {
        let mut team = self.get_team(id).await?;
        update.apply(&mut team);
        validate_team_fields(&team)?;
        team.updated_at = Utc::now();

        if !self.store.update_team(&team).await? {
            return Err(not_found("team", id));
        }
        Ok(team)
    }

    pub async fn list_mentors(
        &self,
        filter: &MentorFilter,
        page: PageQuery,
    ) -> Result<Paginated<Mentor>, ServiceError> {
        let mentors = self.store.list_mentors(filter).await?;
        Ok(Paginated::from_items(mentors, page))
    }

    pub async fn get_mentor(&self, id: &str) -> Result<Mentor, ServiceError> {
        self.store
            .get_mentor(id)
            .await?
            .ok_or_else(|| not_found("mentor", id))
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_mentor(&self, request: NewMentor) -> Result<Mentor, ServiceError> {
        let now = Utc::now();
        let mentor = Mentor {
            id: ids::generate("mentor"),
            user_id: request.user_id,
            skills_tech: request.skills_tech,
            skills_non_tech: request.skills_non_tech,
            languages: request.languages,
            timezone: request.timezone,
            availability: request.availability,
            modality: request.modality,
            regions: request.regions,
            preferences: request.preferences,
            bio: request.bio,
            links: request.links,
            approved: request.approved.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        validate_mentor_fields(&mentor)?;

        self.store.insert_mentor(&mentor).await?;
        info!(mentor_id = %mentor.id, approved = mentor.approved, "mentor created");
        Ok(mentor)
    }

    #[instrument(skip(self, update))]
    pub async fn update_mentor(&self, id: &str, update: MentorUpdate) -> Result<Mentor, ServiceError> {
        let mut mentor = self.get_mentor(id).await?;
        update.apply(&mut mentor);
        validate_mentor_fields(&mentor)?;
        mentor.updated_at = Utc::now();

        if !self.store.update_mentor(&mentor).await? {
            return Err(not_found("mentor", id));
        }
        Ok(mentor)
    }

    #[instrument(skip(self))]
    pub async fn approve_mentor(&self, id: &str) -> Result<Mentor, ServiceError> {
        let mentor = self
            .update_mentor(
                id,
                MentorUpdate {
                    approved: Some(true),
                    ..MentorUpdate::default()
                },
            )
            .await?;
        info!(mentor_id = %mentor.id, "mentor approved");
        Ok(mentor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AvailabilitySlot, Modality, Weekday};
    use crate::service::test_support::service;

    fn new_team(name: &str) -> NewTeam {
        NewTeam {
            name: name.into(),
            school: "EE Central".into(),
            region: "Sul".into(),
            needs: vec![],
            languages: vec!["pt-BR".into()],
            availability: vec![AvailabilitySlot {
                day: Weekday::Mon,
                slots: vec!["08:00-10:00".into()],
            }],
            modality: Modality::Online,
            steam_areas: vec!["programacao".into()],
            coach_contact: "coach@example.com".into(),
            notes: None,
            user_id: "user-1".into(),
        }
    }

    fn new_mentor(region: &str, approved: Option<bool>) -> NewMentor {
        NewMentor {
            user_id: "user-m".into(),
            skills_tech: vec!["programacao".into()],
            skills_non_tech: vec!["gestao".into()],
            languages: vec!["pt-BR".into()],
            timezone: "America/Sao_Paulo".into(),
            availability: vec![],
            modality: Modality::Presential,
            regions: vec![region.into()],
            preferences: Default::default(),
            bio: String::new(),
            links: Default::default(),
            approved,
        }
    }

    #[tokio::test]
    async fn creates_and_fetches_team() {
        let svc = service();
        let created = svc.create_team(new_team("RoboLions")).await.unwrap();

        assert!(created.id.starts_with("team-"));
        let fetched = svc.get_team(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn rejects_team_without_region() {
        let svc = service();
        let mut request = new_team("RoboLions");
        request.region = " ".into();

        let err = svc.create_team(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("region")));
    }

    #[tokio::test]
    async fn update_team_applies_partial_fields() {
        let svc = service();
        let created = svc.create_team(new_team("RoboLions")).await.unwrap();

        let updated = svc
            .update_team(
                &created.id,
                TeamUpdate {
                    modality: Some(Modality::Hybrid),
                    ..TeamUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.modality, Modality::Hybrid);
        assert_eq!(updated.name, "RoboLions");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn missing_team_is_not_found() {
        let svc = service();
        let err = svc.get_team("team-missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = svc
            .update_team("team-missing", TeamUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn teams_are_paginated() {
        let svc = service();
        for i in 0..5 {
            svc.create_team(new_team(&format!("Team {i}"))).await.unwrap();
        }

        let page = svc.list_teams(PageQuery { page: 2, limit: 2 }).await.unwrap();
        assert_eq!(page.total, 5);
        let names: Vec<_> = page.items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Team 2", "Team 3"]);
    }

    #[tokio::test]
    async fn mentors_default_to_approved_and_can_be_approved_later() {
        let svc = service();
        let approved = svc.create_mentor(new_mentor("Sul", None)).await.unwrap();
        assert!(approved.approved);

        let pending = svc.create_mentor(new_mentor("Sul", Some(false))).await.unwrap();
        assert!(!pending.approved);

        let now_approved = svc.approve_mentor(&pending.id).await.unwrap();
        assert!(now_approved.approved);
        assert!(svc.get_mentor(&pending.id).await.unwrap().approved);
    }

    #[tokio::test]
    async fn rejects_team_with_blank_steam_area() {
        let svc = service();
        let mut request = new_team("RoboLions");
        request.steam_areas = vec!["programacao".into(), " ".into()];

        let err = svc.create_team(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("steamAreas")));
        assert_eq!(svc.list_teams(PageQuery::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn rejects_team_update_with_blank_slot() {
        let svc = service();
        let created = svc.create_team(new_team("RoboLions")).await.unwrap();

        let err = svc
            .update_team(
                &created.id,
                TeamUpdate {
                    availability: Some(vec![AvailabilitySlot {
                        day: Weekday::Tue,
                        slots: vec!["".into()],
                    }]),
                    ..TeamUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get_team(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn blank_mentor_language_is_rejected_and_suggestions_keep_working() {
        let svc = service();
        let team = svc.create_team(new_team("RoboLions")).await.unwrap();
        let good = svc.create_mentor(new_mentor("Sul", None)).await.unwrap();

        let mut broken = new_mentor("Sul", None);
        broken.languages = vec!["".into()];
        let err = svc.create_mentor(broken).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("languages")));

        let err = svc
            .update_mentor(
                &good.id,
                MentorUpdate {
                    regions: Some(vec!["Sul".into(), "".into()]),
                    ..MentorUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("regions")));

        let ranked = svc.suggest_mentors(&team.id).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].mentor.id, good.id);
    }

    #[tokio::test]
    async fn mentor_list_honours_filters() {
        let svc = service();
        svc.create_mentor(new_mentor("Sul", None)).await.unwrap();
        svc.create_mentor(new_mentor("Norte", None)).await.unwrap();

        let filter = MentorFilter {
            region: Some("Norte".into()),
            skill: Some("gestao".into()),
            ..MentorFilter::default()
        };
        let page = svc.list_mentors(&filter, PageQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].regions, vec!["Norte"]);
    }
}
