use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use super::{Keyed, Store, StoreError};
use crate::api::match_request::ParticipantFilter;
use crate::api::mentor_request::MentorFilter;
use crate::model::{Feedback, Match, Mentor, Report, Session, Team, UserAccount};

const DEMO_DATA: &str = include_str!("../../fixtures/demo.json");

struct Collection<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Keyed + Clone> Collection<T> {
    fn new(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    async fn filtered(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| keep(*record))
            .cloned()
            .collect()
    }

    async fn get(&self, id: &str) -> Option<T> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.key() == id)
            .cloned()
    }

    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        self.insert_unless(record, |_| false).await
    }

    /// Inserts unless the id or `clashes` matches an existing record.
    async fn insert_unless(&self, record: &T, clashes: impl Fn(&T) -> bool) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|existing| existing.key() == record.key() || clashes(existing))
        {
            return Err(StoreError::Conflict(record.key().to_string()));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn replace(&self, record: &T) -> bool {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|existing| existing.key() == record.key()) {
            Some(slot) => {
                *slot = record.clone();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub mentors: Vec<Mentor>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub feedback: Vec<Feedback>,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub users: Vec<UserAccount>,
}

/// In-process store for tests and the local demo. Nothing is persisted.
pub struct MemoryStore {
    teams: Collection<Team>,
    mentors: Collection<Mentor>,
    matches: Collection<Match>,
    sessions: Collection<Session>,
    feedback: Collection<Feedback>,
    reports: Collection<Report>,
    users: Collection<UserAccount>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::default())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            teams: Collection::new(snapshot.teams),
            mentors: Collection::new(snapshot.mentors),
            matches: Collection::new(snapshot.matches),
            sessions: Collection::new(snapshot.sessions),
            feedback: Collection::new(snapshot.feedback),
            reports: Collection::new(snapshot.reports),
            users: Collection::new(snapshot.users),
        }
    }

    /// Store pre-populated with the bundled demo teams and mentors.
    pub fn with_demo_data() -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_str(DEMO_DATA)?;
        info!(
            teams = snapshot.teams.len(),
            mentors = snapshot.mentors.len(),
            "loaded demo dataset"
        );
        Ok(Self::from_snapshot(snapshot))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        Ok(self.teams.filtered(|_| true).await)
    }

    async fn get_team(&self, id: &str) -> Result<Option<Team>, StoreError> {
        Ok(self.teams.get(id).await)
    }

    async fn insert_team(&self, team: &Team) -> Result<(), StoreError> {
        self.teams.insert(team).await
    }

    async fn update_team(&self, team: &Team) -> Result<bool, StoreError> {
        Ok(self.teams.replace(team).await)
    }

    async fn list_mentors(&self, filter: &MentorFilter) -> Result<Vec<Mentor>, StoreError> {
        Ok(self.mentors.filtered(|mentor| filter.matches(mentor)).await)
    }

    async fn get_mentor(&self, id: &str) -> Result<Option<Mentor>, StoreError> {
        Ok(self.mentors.get(id).await)
    }

    async fn insert_mentor(&self, mentor: &Mentor) -> Result<(), StoreError> {
        self.mentors.insert(mentor).await
    }

    async fn update_mentor(&self, mentor: &Mentor) -> Result<bool, StoreError> {
        Ok(self.mentors.replace(mentor).await)
    }

    async fn list_matches(&self, filter: &ParticipantFilter) -> Result<Vec<Match>, StoreError> {
        Ok(self.matches.filtered(|record| filter.matches(record)).await)
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>, StoreError> {
        Ok(self.matches.get(id).await)
    }

    async fn insert_match(&self, record: &Match) -> Result<(), StoreError> {
        self.matches.insert(record).await
    }

    async fn update_match(&self, record: &Match) -> Result<bool, StoreError> {
        Ok(self.matches.replace(record).await)
    }

    async fn list_sessions(&self, filter: &ParticipantFilter) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .sessions
            .filtered(|session| filter.matches_session(session))
            .await)
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(id).await)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions.insert(session).await
    }

    async fn update_session(&self, session: &Session) -> Result<bool, StoreError> {
        Ok(self.sessions.replace(session).await)
    }

    async fn list_feedback(&self, to_id: Option<&str>) -> Result<Vec<Feedback>, StoreError> {
        Ok(self
            .feedback
            .filtered(|entry| to_id.map_or(true, |id| entry.to_id == id))
            .await)
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        self.feedback.insert(feedback).await
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(self.reports.filtered(|_| true).await)
    }

    async fn get_report(&self, id: &str) -> Result<Option<Report>, StoreError> {
        Ok(self.reports.get(id).await)
    }

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        self.reports.insert(report).await
    }

    async fn update_report(&self, report: &Report) -> Result<bool, StoreError> {
        Ok(self.reports.replace(report).await)
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.users.get(id).await)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .users
            .filtered(|account| account.user.email == email)
            .await
            .into_iter()
            .next())
    }

    async fn insert_user(&self, account: &UserAccount) -> Result<(), StoreError> {
        self.users
            .insert_unless(account, |existing| existing.user.email == account.user.email)
            .await
    }

    async fn update_user(&self, account: &UserAccount) -> Result<bool, StoreError> {
        Ok(self.users.replace(account).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring::fixtures::{mentor, strings, team};

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryStore::new();
        store.insert_team(&team()).await.unwrap();

        let err = store.insert_team(&team()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == "team-1"));
    }

    #[tokio::test]
    async fn update_reports_missing_records() {
        let store = MemoryStore::new();
        assert!(!store.update_team(&team()).await.unwrap());

        store.insert_team(&team()).await.unwrap();
        let mut renamed = team();
        renamed.name = "RoboTigers".into();
        assert!(store.update_team(&renamed).await.unwrap());
        assert_eq!(store.get_team("team-1").await.unwrap().unwrap().name, "RoboTigers");
    }

    #[tokio::test]
    async fn mentor_filters_combine() {
        let store = MemoryStore::new();
        let mut north = mentor("mentor-north");
        north.regions = strings(&["Norte"]);
        north.skills_non_tech = strings(&["gestao"]);
        let mut pending = mentor("mentor-pending");
        pending.approved = false;
        store.insert_mentor(&mentor("mentor-south")).await.unwrap();
        store.insert_mentor(&north).await.unwrap();
        store.insert_mentor(&pending).await.unwrap();

        let by_region = store
            .list_mentors(&MentorFilter {
                region: Some("Norte".into()),
                ..MentorFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_region.len(), 1);
        assert_eq!(by_region[0].id, "mentor-north");

        let by_skill = store
            .list_mentors(&MentorFilter {
                skill: Some("gestao".into()),
                language: Some("pt-BR".into()),
                ..MentorFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_skill.len(), 1);

        let approved = store.list_mentors(&MentorFilter::approved_only()).await.unwrap();
        let ids: Vec<_> = approved.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["mentor-south", "mentor-north"]);
    }

    #[tokio::test]
    async fn users_are_unique_by_email() {
        let store = MemoryStore::new();
        let first = account("user-1", "ana@example.com");
        store.insert_user(&first).await.unwrap();

        let err = store
            .insert_user(&account("user-2", "ana@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == "user-2"));

        let found = store.find_user_by_email("ana@example.com").await.unwrap();
        assert_eq!(found, Some(first));
        assert!(store.find_user_by_email("bia@example.com").await.unwrap().is_none());
    }

    fn account(id: &str, email: &str) -> UserAccount {
        use crate::model::{User, UserRole};

        let now = chrono::Utc::now();
        UserAccount {
            user: User {
                id: id.into(),
                role: UserRole::Team,
                name: "Ana".into(),
                email: email.into(),
                phone: None,
                verified_email: false,
                verified_phone: false,
                locale: "pt-BR".into(),
                timezone: "America/Sao_Paulo".into(),
                avatar_url: None,
                created_at: now,
                updated_at: now,
            },
            password_hash: "hash".into(),
        }
    }

    #[test]
    fn demo_dataset_parses() {
        let store = MemoryStore::with_demo_data();
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn demo_dataset_has_teams_and_mentors() {
        let store = MemoryStore::with_demo_data().unwrap();
        assert!(!store.list_teams().await.unwrap().is_empty());
        assert!(!store.list_mentors(&MentorFilter::default()).await.unwrap().is_empty());
    }
}
