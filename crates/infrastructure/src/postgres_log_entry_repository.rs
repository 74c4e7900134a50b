use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use partledger_application::{
    LogCriterion, LogEntryRepository, LogSelection, LogSortField, PageRequest, SortDirection,
};
use partledger_core::{AppError, AppResult};
use partledger_domain::{
    LogEntry, LogEntryId, LogLevel, LogPayload, TargetRef, TargetType, UserId, UserSummary,
};

/// PostgreSQL-backed repository for log entry selection.
///
/// Renders a [`LogSelection`] into one dynamic query. The acting user is
/// always left joined so rows render without a second lookup.
#[derive(Clone)]
pub struct PostgresLogEntryRepository {
    pool: PgPool,
}

impl PostgresLogEntryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LogEntryRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    level: i16,
    username: String,
    user_id: Option<Uuid>,
    target_type: i16,
    target_id: Uuid,
    payload: serde_json::Value,
    actor_username: Option<String>,
    actor_full_name: Option<String>,
    actor_avatar_url: Option<String>,
}

#[async_trait]
impl LogEntryRepository for PostgresLogEntryRepository {
    async fn select_entries(
        &self,
        selection: &LogSelection,
        page: PageRequest,
    ) -> AppResult<Vec<LogEntry>> {
        let page = page.clamped();
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT log_root.id, log_root.created_at, log_root.level, log_root.username, \
             log_root.user_id, log_root.target_type, log_root.target_id, log_root.payload, \
             users.username AS actor_username, users.full_name AS actor_full_name, \
             users.avatar_url AS actor_avatar_url \
             FROM log_entries log_root \
             LEFT JOIN users ON users.id = log_root.user_id",
        );

        push_selection_predicates(&mut builder, selection);
        push_ordering(&mut builder, selection);

        builder.push(" LIMIT ");
        builder.push_bind(page.limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(page.offset as i64);

        let rows = builder
            .build_query_as::<LogEntryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to select log entries: {error}")))?;

        tracing::debug!(rows = rows.len(), "selected log entries");
        rows.into_iter().map(log_entry_from_row).collect()
    }

    async fn count_entries(&self, selection: &LogSelection) -> AppResult<u64> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM log_entries log_root");
        push_selection_predicates(&mut builder, selection);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count log entries: {error}")))?;

        u64::try_from(total)
            .map_err(|error| AppError::Internal(format!("negative log entry count: {error}")))
    }
}

fn push_clause_start(builder: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    if *first {
        builder.push(" WHERE ");
        *first = false;
    } else {
        builder.push(" AND ");
    }
}

fn push_selection_predicates(builder: &mut QueryBuilder<'_, Postgres>, selection: &LogSelection) {
    let mut first = true;

    if let Some(kinds) = &selection.kinds {
        push_clause_start(builder, &mut first);
        if kinds.is_empty() {
            builder.push("FALSE");
        } else {
            builder.push("log_root.entry_kind IN (");
            for (index, kind) in kinds.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push_bind(kind.as_str());
            }
            builder.push(')');
        }
    }

    if !selection.excluded_target_types.is_empty() {
        push_clause_start(builder, &mut first);
        builder.push("log_root.target_type NOT IN (");
        for (index, target_type) in selection.excluded_target_types.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push_bind(target_type.code());
        }
        builder.push(')');
    }

    if !selection.targets.is_empty() {
        push_clause_start(builder, &mut first);
        builder.push('(');
        for (index, target) in selection.targets.iter().enumerate() {
            if index > 0 {
                builder.push(" OR ");
            }
            builder.push("(log_root.target_type = ");
            builder.push_bind(target.target_type.code());
            builder.push(" AND log_root.target_id = ");
            builder.push_bind(target.target_id);
            builder.push(')');
        }
        builder.push(')');
    }

    for criterion in &selection.criteria {
        push_clause_start(builder, &mut first);
        push_criterion_condition(builder, criterion);
    }
}

fn push_criterion_condition(builder: &mut QueryBuilder<'_, Postgres>, criterion: &LogCriterion) {
    match criterion {
        LogCriterion::LevelIn(levels) => {
            if levels.is_empty() {
                builder.push("FALSE");
                return;
            }
            builder.push("log_root.level IN (");
            for (index, level) in levels.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push_bind(level.code());
            }
            builder.push(')');
        }
        LogCriterion::KindIn(kinds) => {
            if kinds.is_empty() {
                builder.push("FALSE");
                return;
            }
            builder.push("log_root.entry_kind IN (");
            for (index, kind) in kinds.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push_bind(kind.as_str());
            }
            builder.push(')');
        }
        LogCriterion::ActorIs(user_id) => {
            builder.push("log_root.user_id = ");
            builder.push_bind(user_id.as_uuid());
        }
        LogCriterion::ActorDeleted(deleted) => {
            if *deleted {
                builder.push("log_root.user_id IS NULL");
            } else {
                builder.push("log_root.user_id IS NOT NULL");
            }
        }
        LogCriterion::TargetTypeIn(target_types) => {
            if target_types.is_empty() {
                builder.push("FALSE");
                return;
            }
            builder.push("log_root.target_type IN (");
            for (index, target_type) in target_types.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push_bind(target_type.code());
            }
            builder.push(')');
        }
        LogCriterion::TargetIdIs(target_id) => {
            builder.push("log_root.target_id = ");
            builder.push_bind(*target_id);
        }
        LogCriterion::TimestampAfter(instant) => {
            builder.push("log_root.created_at >= ");
            builder.push_bind(*instant);
        }
        LogCriterion::TimestampBefore(instant) => {
            builder.push("log_root.created_at <= ");
            builder.push_bind(*instant);
        }
    }
}

fn push_ordering(builder: &mut QueryBuilder<'_, Postgres>, selection: &LogSelection) {
    builder.push(" ORDER BY ");
    let direction = match selection.ordering.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    match selection.ordering.field {
        LogSortField::Timestamp => {
            builder.push("log_root.created_at ");
            builder.push(direction);
        }
        LogSortField::Level => {
            // Codes outside the known severity range sort last in both
            // directions.
            builder.push("(log_root.level NOT BETWEEN 0 AND 7), log_root.level ");
            builder.push(direction);
            builder.push(", log_root.created_at DESC");
        }
    }
}

fn log_entry_from_row(row: LogEntryRow) -> AppResult<LogEntry> {
    let payload: LogPayload = serde_json::from_value(row.payload).map_err(|error| {
        AppError::Internal(format!(
            "malformed payload in log entry '{}': {error}",
            row.id
        ))
    })?;

    let target_type = TargetType::from_code(row.target_type).ok_or_else(|| {
        AppError::Internal(format!(
            "unknown target type code {} in log entry '{}'",
            row.target_type, row.id
        ))
    })?;

    let actor = match (row.user_id, row.actor_username) {
        (Some(user_id), Some(username)) => Some(UserSummary {
            id: UserId::from_uuid(user_id),
            username,
            full_name: row.actor_full_name,
            avatar_url: row.actor_avatar_url,
        }),
        _ => None,
    };

    Ok(LogEntry {
        id: LogEntryId::from_uuid(row.id),
        timestamp: row.created_at,
        level: LogLevel::from_code(row.level),
        username: row.username,
        actor,
        target: TargetRef::new(target_type, row.target_id),
        payload,
    })
}
