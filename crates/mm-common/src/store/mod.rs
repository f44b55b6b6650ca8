//! Storage abstraction. Callers build a concrete store and inject it as `Arc<dyn Store>`.

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;
use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;

use crate::api::match_request::ParticipantFilter;
use crate::api::mentor_request::MentorFilter;
use crate::model::{Feedback, Match, Mentor, Report, Session, Team, UserAccount};

pub use memory::MemoryStore;
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to decode stored record: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("record already exists: {0}")]
    Conflict(String),
}

/// Records addressable by their string id.
pub trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! keyed {
    ($($ty:ty),+ $(,)?) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })+
    };
}

keyed!(Team, Mentor, Match, Session, Feedback, Report);

impl Keyed for UserAccount {
    fn key(&self) -> &str {
        &self.user.id
    }
}

/// Persistence for every record the service manages.
///
/// Lists come back in insertion order. `update_*` returns `false` when no
/// record with that id exists; `insert_*` fails with [`StoreError::Conflict`]
/// on a duplicate id. `insert_user` also conflicts on a duplicate email.
#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError>;
    async fn get_team(&self, id: &str) -> Result<Option<Team>, StoreError>;
    async fn insert_team(&self, team: &Team) -> Result<(), StoreError>;
    async fn update_team(&self, team: &Team) -> Result<bool, StoreError>;

    async fn list_mentors(&self, filter: &MentorFilter) -> Result<Vec<Mentor>, StoreError>;
    async fn get_mentor(&self, id: &str) -> Result<Option<Mentor>, StoreError>;
    async fn insert_mentor(&self, mentor: &Mentor) -> Result<(), StoreError>;
    async fn update_mentor(&self, mentor: &Mentor) -> Result<bool, StoreError>;

    async fn list_matches(&self, filter: &ParticipantFilter) -> Result<Vec<Match>, StoreError>;
    async fn get_match(&self, id: &str) -> Result<Option<Match>, StoreError>;
    async fn insert_match(&self, record: &Match) -> Result<(), StoreError>;
    async fn update_match(&self, record: &Match) -> Result<bool, StoreError>;

    async fn list_sessions(&self, filter: &ParticipantFilter) -> Result<Vec<Session>, StoreError>;
    async fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError>;
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;
    async fn update_session(&self, session: &Session) -> Result<bool, StoreError>;

    async fn list_feedback(&self, to_id: Option<&str>) -> Result<Vec<Feedback>, StoreError>;
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StoreError>;

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError>;
    async fn get_report(&self, id: &str) -> Result<Option<Report>, StoreError>;
    async fn insert_report(&self, report: &Report) -> Result<(), StoreError>;
    async fn update_report(&self, report: &Report) -> Result<bool, StoreError>;

    async fn get_user(&self, id: &str) -> Result<Option<UserAccount>, StoreError>;
    /// `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;
    async fn insert_user(&self, account: &UserAccount) -> Result<(), StoreError>;
    async fn update_user(&self, account: &UserAccount) -> Result<bool, StoreError>;
}
