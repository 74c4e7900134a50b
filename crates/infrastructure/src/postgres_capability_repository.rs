use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use partledger_application::{CapabilityGrant, CapabilityRepository};
use partledger_core::{AppError, AppResult};
use partledger_domain::{Capability, TargetType};

/// PostgreSQL-backed repository for capability grants.
#[derive(Clone)]
pub struct PostgresCapabilityRepository {
    pool: PgPool,
}

impl PostgresCapabilityRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CapabilityGrantRow {
    capability: String,
    target_type: Option<i16>,
}

fn grant_from_row(row: CapabilityGrantRow) -> AppResult<CapabilityGrant> {
    let capability = Capability::from_str(row.capability.as_str())
        .map_err(|error| AppError::Internal(format!("malformed capability grant: {error}")))?;

    let target_type = match row.target_type {
        None => None,
        Some(code) => Some(TargetType::from_code(code).ok_or_else(|| {
            AppError::Internal(format!(
                "unknown target type code {code} in capability grant"
            ))
        })?),
    };

    Ok(CapabilityGrant {
        capability,
        target_type,
    })
}

#[async_trait]
impl CapabilityRepository for PostgresCapabilityRepository {
    async fn list_grants_for_subject(&self, subject: &str) -> AppResult<Vec<CapabilityGrant>> {
        let rows = sqlx::query_as::<_, CapabilityGrantRow>(
            "SELECT capability, target_type FROM capability_grants WHERE subject = $1",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list capability grants: {error}"))
        })?;

        rows.into_iter().map(grant_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use partledger_application::CapabilityRepository;
    use partledger_domain::{Capability, TargetType};

    use super::PostgresCapabilityRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres capability tests: {error}");
        }

        Some(pool)
    }

    #[tokio::test]
    async fn lists_scoped_and_unscoped_grants_for_a_subject() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresCapabilityRepository::new(pool.clone());
        let subject = format!("subject-{}", Uuid::new_v4());

        let unscoped = sqlx::query(
            r#"
                INSERT INTO capability_grants (subject, capability)
                VALUES ($1, $2)
                "#,
        )
        .bind(subject.as_str())
        .bind(Capability::LogShow.as_str())
        .execute(&pool)
        .await;
        assert!(unscoped.is_ok());

        let scoped = sqlx::query(
            r#"
                INSERT INTO capability_grants (subject, capability, target_type)
                VALUES ($1, $2, $3)
                "#,
        )
        .bind(subject.as_str())
        .bind(Capability::LogShowHistory.as_str())
        .bind(TargetType::Part.code())
        .execute(&pool)
        .await;
        assert!(scoped.is_ok());

        let grants = repository.list_grants_for_subject(subject.as_str()).await;
        assert!(grants.is_ok());
        let grants = grants.unwrap_or_default();

        assert_eq!(grants.len(), 2);
        assert!(
            grants
                .iter()
                .any(|grant| grant.capability == Capability::LogShow && grant.target_type.is_none())
        );
        assert!(grants.iter().any(|grant| {
            grant.capability == Capability::LogShowHistory
                && grant.target_type == Some(TargetType::Part)
        }));

        let other = repository.list_grants_for_subject("nobody").await;
        assert!(matches!(&other, Ok(grants) if grants.is_empty()));
    }
}
