use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use super::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "document tables for teams, mentors, matches, sessions, feedback, reports",
        sql: r#"
CREATE TABLE IF NOT EXISTS mentormatch.teams (
    id TEXT PRIMARY KEY,
    created_seq BIGSERIAL NOT NULL,
    data JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS mentormatch.mentors (
    id TEXT PRIMARY KEY,
    created_seq BIGSERIAL NOT NULL,
    data JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS mentormatch.matches (
    id TEXT PRIMARY KEY,
    created_seq BIGSERIAL NOT NULL,
    data JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS mentormatch.sessions (
    id TEXT PRIMARY KEY,
    created_seq BIGSERIAL NOT NULL,
    data JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS mentormatch.feedback (
    id TEXT PRIMARY KEY,
    created_seq BIGSERIAL NOT NULL,
    data JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS mentormatch.reports (
    id TEXT PRIMARY KEY,
    created_seq BIGSERIAL NOT NULL,
    data JSONB NOT NULL
);
"#,
    },
    Migration {
        id: 2,
        description: "lookup indexes for participant and approval filters",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_mentors_approved
    ON mentormatch.mentors (((data->>'approved')::boolean));
CREATE INDEX IF NOT EXISTS idx_matches_team ON mentormatch.matches ((data->>'teamId'));
CREATE INDEX IF NOT EXISTS idx_matches_mentor ON mentormatch.matches ((data->>'mentorId'));
CREATE INDEX IF NOT EXISTS idx_sessions_team ON mentormatch.sessions ((data->>'teamId'));
CREATE INDEX IF NOT EXISTS idx_sessions_mentor ON mentormatch.sessions ((data->>'mentorId'));
CREATE INDEX IF NOT EXISTS idx_feedback_to ON mentormatch.feedback ((data->>'toId'));
"#,
    },
    Migration {
        id: 3,
        description: "user accounts with unique email",
        sql: r#"
CREATE TABLE IF NOT EXISTS mentormatch.users (
    id TEXT PRIMARY KEY,
    created_seq BIGSERIAL NOT NULL,
    data JSONB NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON mentormatch.users ((data->>'email'));
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS mentormatch;
             CREATE TABLE IF NOT EXISTS mentormatch.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM mentormatch.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO mentormatch.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_ids_are_strictly_increasing() {
        let ids: Vec<i32> = MIGRATIONS.iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(ids.first(), Some(&1));
    }

    #[test]
    fn migrations_stay_inside_schema() {
        for migration in MIGRATIONS {
            assert!(migration.sql.contains("mentormatch."), "{}", migration.description);
        }
    }

    #[test]
    fn user_emails_are_unique_at_the_database() {
        let users = MIGRATIONS
            .iter()
            .find(|m| m.sql.contains("mentormatch.users"))
            .unwrap();
        assert!(users.sql.contains("CREATE UNIQUE INDEX"));
        assert!(users.sql.contains("data->>'email'"));
    }
}
