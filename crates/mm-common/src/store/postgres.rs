use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{Json, ToSql};
use tokio_postgres::Row;
use tracing::instrument;

use super::{Keyed, PgPool, Store, StoreError};
use crate::api::match_request::ParticipantFilter;
use crate::api::mentor_request::MentorFilter;
use crate::model::{Feedback, Match, Mentor, Report, Session, Team, UserAccount};

const TEAMS: &str = "teams";
const MENTORS: &str = "mentors";
const MATCHES: &str = "matches";
const SESSIONS: &str = "sessions";
const FEEDBACK: &str = "feedback";
const REPORTS: &str = "reports";
const USERS: &str = "users";

const PARTICIPANT_PREDICATE: &str =
    "($1::text IS NULL OR data->>'teamId' = $1) AND ($2::text IS NULL OR data->>'mentorId' = $2)";

const MENTOR_PREDICATE: &str = "($1::text IS NULL OR data->'regions' ? $1) \
     AND ($2::text IS NULL OR data->'languages' ? $2) \
     AND ($3::text IS NULL OR data->'skillsTech' ? $3 OR data->'skillsNonTech' ? $3) \
     AND ($4::boolean IS NULL OR (data->>'approved')::boolean = $4)";

type Params<'a> = [&'a (dyn ToSql + Sync)];

fn decode<T: DeserializeOwned>(row: &Row) -> Result<T, StoreError> {
    let Json(value): Json<Value> = row.try_get("data")?;
    Ok(serde_json::from_value(value)?)
}

/// PostgreSQL-backed store. Each record is one JSONB document keyed by id.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self, params))]
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        table: &'static str,
        predicate: &'static str,
        params: &Params<'_>,
    ) -> Result<Vec<T>, StoreError> {
        let client = self.pool.get().await?;
        let query = format!("SELECT data FROM mentormatch.{table} WHERE {predicate} ORDER BY created_seq");
        let rows = client.query(query.as_str(), params).await?;
        rows.iter().map(decode).collect()
    }

    #[instrument(skip(self))]
    async fn fetch_one<T: DeserializeOwned>(&self, table: &'static str, id: &str) -> Result<Option<T>, StoreError> {
        let client = self.pool.get().await?;
        let query = format!("SELECT data FROM mentormatch.{table} WHERE id = $1");
        let row = client.query_opt(query.as_str(), &[&id]).await?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self, record), fields(id = record.key()))]
    async fn insert_doc<T: Serialize + Keyed + Sync>(&self, table: &'static str, record: &T) -> Result<(), StoreError> {
        let data = serde_json::to_value(record)?;
        let client = self.pool.get().await?;
        let query = format!("INSERT INTO mentormatch.{table} (id, data) VALUES ($1, $2)");

        match client.execute(query.as_str(), &[&record.key(), &Json(&data)]).await {
            Ok(_) => Ok(()),
            Err(err) if err.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(StoreError::Conflict(record.key().to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, record), fields(id = record.key()))]
    async fn replace_doc<T: Serialize + Keyed + Sync>(&self, table: &'static str, record: &T) -> Result<bool, StoreError> {
        let data = serde_json::to_value(record)?;
        let client = self.pool.get().await?;
        let query = format!("UPDATE mentormatch.{table} SET data = $2 WHERE id = $1");
        let rows = client
            .execute(query.as_str(), &[&record.key(), &Json(&data)])
            .await?;
        Ok(rows > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        self.fetch_all(TEAMS, "TRUE", &[]).await
    }

    async fn get_team(&self, id: &str) -> Result<Option<Team>, StoreError> {
        self.fetch_one(TEAMS, id).await
    }

    async fn insert_team(&self, team: &Team) -> Result<(), StoreError> {
        self.insert_doc(TEAMS, team).await
    }

    async fn update_team(&self, team: &Team) -> Result<bool, StoreError> {
        self.replace_doc(TEAMS, team).await
    }

    async fn list_mentors(&self, filter: &MentorFilter) -> Result<Vec<Mentor>, StoreError> {
        self.fetch_all(
            MENTORS,
            MENTOR_PREDICATE,
            &[&filter.region, &filter.language, &filter.skill, &filter.approved],
        )
        .await
    }

    async fn get_mentor(&self, id: &str) -> Result<Option<Mentor>, StoreError> {
        self.fetch_one(MENTORS, id).await
    }

    async fn insert_mentor(&self, mentor: &Mentor) -> Result<(), StoreError> {
        self.insert_doc(MENTORS, mentor).await
    }

    async fn update_mentor(&self, mentor: &Mentor) -> Result<bool, StoreError> {
        self.replace_doc(MENTORS, mentor).await
    }

    async fn list_matches(&self, filter: &ParticipantFilter) -> Result<Vec<Match>, StoreError> {
        self.fetch_all(MATCHES, PARTICIPANT_PREDICATE, &[&filter.team_id, &filter.mentor_id])
            .await
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>, StoreError> {
        self.fetch_one(MATCHES, id).await
    }

    async fn insert_match(&self, record: &Match) -> Result<(), StoreError> {
        self.insert_doc(MATCHES, record).await
    }

    async fn update_match(&self, record: &Match) -> Result<bool, StoreError> {
        self.replace_doc(MATCHES, record).await
    }

    async fn list_sessions(&self, filter: &ParticipantFilter) -> Result<Vec<Session>, StoreError> {
        self.fetch_all(SESSIONS, PARTICIPANT_PREDICATE, &[&filter.team_id, &filter.mentor_id])
            .await
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError> {
        self.fetch_one(SESSIONS, id).await
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.insert_doc(SESSIONS, session).await
    }

    async fn update_session(&self, session: &Session) -> Result<bool, StoreError> {
        self.replace_doc(SESSIONS, session).await
    }

    async fn list_feedback(&self, to_id: Option<&str>) -> Result<Vec<Feedback>, StoreError> {
        self.fetch_all(FEEDBACK, "($1::text IS NULL OR data->>'toId' = $1)", &[&to_id])
            .await
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError> {
        self.insert_doc(FEEDBACK, feedback).await
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        self.fetch_all(REPORTS, "TRUE", &[]).await
    }

    async fn get_report(&self, id: &str) -> Result<Option<Report>, StoreError> {
        self.fetch_one(REPORTS, id).await
    }

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError> {
        self.insert_doc(REPORTS, report).await
    }

    async fn update_report(&self, report: &Report) -> Result<bool, StoreError> {
        self.replace_doc(REPORTS, report).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, StoreError> {
        self.fetch_one(USERS, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let mut found: Vec<UserAccount> = self.fetch_all(USERS, "data->>'email' = $1", &[&email]).await?;
        Ok(found.pop())
    }

    // Duplicate emails hit idx_users_email and surface as Conflict.
    async fn insert_user(&self, account: &UserAccount) -> Result<(), StoreError> {
        self.insert_doc(USERS, account).await
    }

    async fn update_user(&self, account: &UserAccount) -> Result<bool, StoreError> {
        self.replace_doc(USERS, account).await
    }
}
