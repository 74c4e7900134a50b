use std::collections::BTreeSet;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Query, State};
use chrono::{DateTime, Utc};
use partledger_application::{
    BooleanConstraint, ChoiceConstraint, InstantRangeConstraint, LogEntryFilter, LogOrdering,
    LogSortField, PageRequest, SortDirection, TriState,
};
use partledger_core::{AppError, UserIdentity};
use partledger_domain::{TargetRef, TargetType, UserId};
use uuid::Uuid;

use crate::dto::LogGridResponse;
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: usize = 50;
const LAST_ACTIVITY_LIMIT: usize = 10;

/// Query parameters accepted by the log listing endpoints.
///
/// Set-valued filters arrive as comma separated lists, the deleted-actor
/// filter as an empty string, `1`/`true` or `0`/`false`.
#[derive(Debug, serde::Deserialize)]
pub struct LogListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub level: Option<String>,
    pub kind: Option<String>,
    pub target_type: Option<String>,
    pub actor_id: Option<Uuid>,
    pub actor_deleted: Option<String>,
    pub target_id: Option<Uuid>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub targets: Option<String>,
}

pub async fn system_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<LogListQuery>,
) -> ApiResult<Json<LogGridResponse>> {
    let filter = filter_from_query(&query)?;
    let ordering = ordering_from_query(&query)?;
    let page = page_from_query(&query, DEFAULT_PAGE_LIMIT);

    let grid = state
        .log_grid_service
        .list_system_log(&user, &filter, ordering, page)
        .await?;

    Ok(Json(LogGridResponse::from(grid)))
}

pub async fn element_history_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<LogListQuery>,
) -> ApiResult<Json<LogGridResponse>> {
    let targets = parse_targets(query.targets.as_deref())?;
    let filter = filter_from_query(&query)?;
    let ordering = ordering_from_query(&query)?;
    let page = page_from_query(&query, DEFAULT_PAGE_LIMIT);

    let grid = state
        .log_grid_service
        .list_element_history(&user, targets, &filter, ordering, page)
        .await?;

    Ok(Json(LogGridResponse::from(grid)))
}

pub async fn last_activity_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<LogListQuery>,
) -> ApiResult<Json<LogGridResponse>> {
    let page = page_from_query(&query, LAST_ACTIVITY_LIMIT);

    let grid = state
        .log_grid_service
        .list_last_activity(&user, page)
        .await?;

    Ok(Json(LogGridResponse::from(grid)))
}

fn page_from_query(query: &LogListQuery, default_limit: usize) -> PageRequest {
    PageRequest {
        limit: query.limit.unwrap_or(default_limit),
        offset: query.offset.unwrap_or(0),
    }
}

fn ordering_from_query(query: &LogListQuery) -> Result<LogOrdering, AppError> {
    let mut ordering = LogOrdering::default();
    if let Some(field) = query.sort.as_deref() {
        ordering.field = LogSortField::parse_transport(field)?;
    }
    if let Some(direction) = query.direction.as_deref() {
        ordering.direction = SortDirection::parse_transport(direction)?;
    }

    Ok(ordering)
}

fn filter_from_query(query: &LogListQuery) -> Result<LogEntryFilter, AppError> {
    Ok(LogEntryFilter {
        timestamp: InstantRangeConstraint {
            after: query.after,
            before: query.before,
        },
        level: ChoiceConstraint {
            selected: parse_choices(query.level.as_deref())?,
        },
        kind: ChoiceConstraint {
            selected: parse_choices(query.kind.as_deref())?,
        },
        actor: query.actor_id.map(UserId::from_uuid),
        actor_deleted: BooleanConstraint {
            value: TriState::from_param(query.actor_deleted.as_deref())?,
        },
        target_type: ChoiceConstraint {
            selected: parse_choices(query.target_type.as_deref())?,
        },
        target_id: query.target_id,
    })
}

fn parse_choices<T>(raw: Option<&str>) -> Result<BTreeSet<T>, AppError>
where
    T: FromStr<Err = AppError> + Ord,
{
    let Some(raw) = raw else {
        return Ok(BTreeSet::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(T::from_str)
        .collect()
}

fn parse_targets(raw: Option<&str>) -> Result<Vec<TargetRef>, AppError> {
    let values: Vec<&str> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();

    if values.is_empty() {
        return Err(AppError::Validation(
            "element history requires at least one target".to_owned(),
        ));
    }

    values.into_iter().map(parse_target).collect()
}

fn parse_target(value: &str) -> Result<TargetRef, AppError> {
    let (type_part, id_part) = value.split_once(':').ok_or_else(|| {
        AppError::Validation(format!("target '{value}' must look like <type>:<id>"))
    })?;

    let target_type = TargetType::from_str(type_part)?;
    let target_id = Uuid::parse_str(id_part)
        .map_err(|error| AppError::Validation(format!("invalid target id '{id_part}': {error}")))?;

    Ok(TargetRef::new(target_type, target_id))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use partledger_application::{LogOrdering, LogSortField, SortDirection};
    use partledger_core::AppError;
    use partledger_domain::{LogLevel, TargetType};
    use uuid::Uuid;

    use super::{
        LogListQuery, filter_from_query, ordering_from_query, parse_choices, parse_targets,
    };

    fn empty_query() -> LogListQuery {
        LogListQuery {
            limit: None,
            offset: None,
            sort: None,
            direction: None,
            level: None,
            kind: None,
            target_type: None,
            actor_id: None,
            actor_deleted: None,
            target_id: None,
            after: None,
            before: None,
            targets: None,
        }
    }

    #[test]
    fn choices_parse_comma_lists_and_ignore_blanks() {
        let levels: BTreeSet<LogLevel> = match parse_choices(Some("error, warning,,")) {
            Ok(levels) => levels,
            Err(error) => panic!("expected a parsed set, got {error}"),
        };

        assert_eq!(
            levels,
            BTreeSet::from([LogLevel::Error, LogLevel::Warning])
        );
    }

    #[test]
    fn unknown_choice_is_rejected() {
        let levels: Result<BTreeSet<LogLevel>, AppError> = parse_choices(Some("error,loud"));
        assert!(matches!(levels, Err(AppError::Validation(_))));
    }

    #[test]
    fn targets_parse_type_and_id_pairs() {
        let id = Uuid::new_v4();
        let parsed = parse_targets(Some(&format!("part:{id}")));

        match parsed {
            Ok(targets) => {
                assert_eq!(targets.len(), 1);
                assert_eq!(targets[0].target_type, TargetType::Part);
                assert_eq!(targets[0].target_id, id);
            }
            Err(error) => panic!("expected parsed targets, got {error}"),
        }
    }

    #[test]
    fn missing_targets_are_rejected() {
        assert!(matches!(
            parse_targets(None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_targets(Some(" , ")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn malformed_target_pair_is_rejected() {
        assert!(matches!(
            parse_targets(Some("part")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_targets(Some("part:not-a-uuid")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn empty_query_builds_an_inactive_filter() {
        let filter = match filter_from_query(&empty_query()) {
            Ok(filter) => filter,
            Err(error) => panic!("expected a filter, got {error}"),
        };

        assert!(!filter.timestamp.is_active());
        assert!(!filter.level.is_active());
        assert!(!filter.kind.is_active());
        assert!(!filter.actor_deleted.is_active());
        assert!(filter.actor.is_none());
        assert!(filter.target_id.is_none());
    }

    #[test]
    fn sort_parameters_override_the_default_ordering() {
        let ordering = match ordering_from_query(&empty_query()) {
            Ok(ordering) => ordering,
            Err(error) => panic!("expected an ordering, got {error}"),
        };
        assert_eq!(ordering, LogOrdering::default());

        let mut query = empty_query();
        query.sort = Some("level".to_owned());
        query.direction = Some("asc".to_owned());
        let ordering = match ordering_from_query(&query) {
            Ok(ordering) => ordering,
            Err(error) => panic!("expected an ordering, got {error}"),
        };
        assert_eq!(ordering.field, LogSortField::Level);
        assert_eq!(ordering.direction, SortDirection::Asc);

        query.sort = Some("severity".to_owned());
        assert!(matches!(
            ordering_from_query(&query),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn deleted_actor_values_map_to_the_tri_state() {
        let mut query = empty_query();
        query.actor_deleted = Some("1".to_owned());

        let filter = match filter_from_query(&query) {
            Ok(filter) => filter,
            Err(error) => panic!("expected a filter, got {error}"),
        };
        assert!(filter.actor_deleted.is_active());

        query.actor_deleted = Some("sometimes".to_owned());
        assert!(matches!(
            filter_from_query(&query),
            Err(AppError::Validation(_))
        ));
    }
}
