use async_trait::async_trait;
use sqlx::PgPool;

use partledger_application::{ElementSummary, TargetElementRepository};
use partledger_core::{AppError, AppResult};
use partledger_domain::{TargetRef, TargetType};

/// PostgreSQL-backed resolver for live target elements.
///
/// Users and groups live in their own tables; every inventory type shares
/// the element registry, so one lookup per reference suffices.
#[derive(Clone)]
pub struct PostgresTargetElementRepository {
    pool: PgPool,
}

impl PostgresTargetElementRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user(&self, target: TargetRef) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
            .bind(target.target_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to resolve user target: {error}")))
    }

    async fn find_group(&self, target: TargetRef) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM user_groups WHERE id = $1")
            .bind(target.target_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to resolve group target: {error}")))
    }

    async fn find_inventory_element(&self, target: TargetRef) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM inventory_elements WHERE target_type = $1 AND target_id = $2",
        )
        .bind(target.target_type.code())
        .bind(target.target_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to resolve inventory element target: {error}"
            ))
        })
    }
}

#[async_trait]
impl TargetElementRepository for PostgresTargetElementRepository {
    async fn find_element(&self, target: TargetRef) -> AppResult<Option<ElementSummary>> {
        let name = match target.target_type {
            TargetType::None => {
                return Err(AppError::Unsupported(format!(
                    "target type '{}' has no live element lookup",
                    target.target_type.as_str()
                )));
            }
            TargetType::User => self.find_user(target).await?,
            TargetType::Group => self.find_group(target).await?,
            _ => self.find_inventory_element(target).await?,
        };

        Ok(name.map(|name| ElementSummary { target, name }))
    }
}
