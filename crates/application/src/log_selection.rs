//! Construction of the predicate set that selects audit log rows.
//!
//! A [`LogSelection`] is plain data. It names which rows a grid wants and how
//! they are ordered, and is rendered to an actual store query by the
//! repository adapter. Building one is synchronous, stateless and free of
//! side effects, so concurrent grids never need coordination.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use partledger_core::{AppError, AppResult};
use partledger_domain::{LogEntryKind, LogLevel, TargetRef, TargetType, UserId};
use uuid::Uuid;

/// Which log grid variant is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDisplayMode {
    /// Full system log for administrators.
    SystemLog,
    /// Change history of one or more concrete elements.
    ElementHistory,
    /// Bounded recent-activity feed for the dashboard.
    LastActivity,
}

impl LogDisplayMode {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemLog => "system_log",
            Self::ElementHistory => "element_history",
            Self::LastActivity => "last_activity",
        }
    }
}

impl FromStr for LogDisplayMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system_log" => Ok(Self::SystemLog),
            "element_history" => Ok(Self::ElementHistory),
            "last_activity" => Ok(Self::LastActivity),
            _ => Err(AppError::Configuration(format!(
                "unknown log display mode '{value}'"
            ))),
        }
    }
}

/// Sort direction for log listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Oldest rows first.
    Asc,
    /// Newest rows first.
    Desc,
}

impl SortDirection {
    /// Parses transport value into a sort direction.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sortable column of the log listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSortField {
    /// Event timestamp.
    Timestamp,
    /// Severity code.
    Level,
}

impl LogSortField {
    /// Parses transport value into a sort field.
    pub fn parse_transport(value: &str) -> AppResult<Self> {
        match value {
            "timestamp" => Ok(Self::Timestamp),
            "level" => Ok(Self::Level),
            _ => Err(AppError::Validation(format!("unknown sort field '{value}'"))),
        }
    }

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Level => "level",
        }
    }
}

/// Sort instruction applied to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOrdering {
    /// Column to sort by.
    pub field: LogSortField,
    /// Sort direction.
    pub direction: SortDirection,
}

impl Default for LogOrdering {
    fn default() -> Self {
        Self {
            field: LogSortField::Timestamp,
            direction: SortDirection::Desc,
        }
    }
}

/// One conjunctive criterion narrowing a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCriterion {
    /// Severity is one of the given levels.
    LevelIn(BTreeSet<LogLevel>),
    /// Subtype is one of the given kinds.
    KindIn(BTreeSet<LogEntryKind>),
    /// Acting user id equals the given id.
    ActorIs(UserId),
    /// Whether the acting user reference still resolves.
    ActorDeleted(bool),
    /// Target type is one of the given types.
    TargetTypeIn(BTreeSet<TargetType>),
    /// Target id equals the given id.
    TargetIdIs(Uuid),
    /// Timestamp is at or after the given instant.
    TimestampAfter(DateTime<Utc>),
    /// Timestamp is at or before the given instant.
    TimestampBefore(DateTime<Utc>),
}

/// Declarative description of which log rows a grid selects.
///
/// All parts combine conjunctively, except `targets`, which is a pure
/// disjunction over its entries. An empty selection matches every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSelection {
    /// Allowlist of subtypes, `None` admits every kind.
    pub kinds: Option<BTreeSet<LogEntryKind>>,
    /// Target types excluded from the result.
    pub excluded_target_types: BTreeSet<TargetType>,
    /// Exact-match target disjunction, entries are independent.
    pub targets: Vec<TargetRef>,
    /// Additional conjunctive criteria.
    pub criteria: Vec<LogCriterion>,
    /// Sort instruction.
    pub ordering: LogOrdering,
    /// Whether a total row count is meaningful for this selection.
    pub include_total: bool,
}

impl LogSelection {
    /// Adds a conjunctive criterion.
    pub fn push_criterion(&mut self, criterion: LogCriterion) {
        self.criteria.push(criterion);
    }

    /// Replaces the sort instruction.
    pub fn order_by(&mut self, field: LogSortField, direction: SortDirection) {
        self.ordering = LogOrdering { field, direction };
    }
}

impl Default for LogSelection {
    fn default() -> Self {
        Self {
            kinds: None,
            excluded_target_types: BTreeSet::new(),
            targets: Vec::new(),
            criteria: Vec::new(),
            ordering: LogOrdering::default(),
            include_total: true,
        }
    }
}

/// Externally supplied predicate builder.
///
/// Implementations extend the selection with additional criteria. The
/// contract is a single call; whatever is pushed composes conjunctively with
/// the mode predicate and the target disjunction and never replaces them.
pub trait LogSelectionCriteria: Send + Sync {
    /// Extends the selection in place.
    fn apply(&self, selection: &mut LogSelection);
}

/// Validated grid configuration.
///
/// Replaces free-form option maps: the mode is an enumerated value checked
/// once at the parse boundary, so an unknown mode never reaches query
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGridConfig {
    mode: LogDisplayMode,
    targets: Vec<TargetRef>,
}

impl LogGridConfig {
    /// Creates a configuration from already validated parts.
    #[must_use]
    pub fn new(mode: LogDisplayMode, targets: Vec<TargetRef>) -> Self {
        Self { mode, targets }
    }

    /// Parses a transport mode value, failing fast on unknown modes.
    pub fn parse(mode: &str, targets: Vec<TargetRef>) -> AppResult<Self> {
        Ok(Self::new(LogDisplayMode::from_str(mode)?, targets))
    }

    /// Returns the configured display mode.
    #[must_use]
    pub fn mode(&self) -> LogDisplayMode {
        self.mode
    }

    /// Returns the configured target filter.
    #[must_use]
    pub fn targets(&self) -> &[TargetRef] {
        self.targets.as_slice()
    }

    /// Builds the selection for this configuration.
    ///
    /// The recent-activity mode restricts rows to element change kinds,
    /// drops user and group administration noise and marks the total count
    /// as not meaningful. A non-empty target filter becomes an exact-match
    /// disjunction. An optional external filter is applied last and extends
    /// the criteria without replacing any of the above.
    #[must_use]
    pub fn build_selection(&self, filter: Option<&dyn LogSelectionCriteria>) -> LogSelection {
        let mut selection = LogSelection::default();

        if self.mode == LogDisplayMode::LastActivity {
            selection.kinds = Some(BTreeSet::from([
                LogEntryKind::ElementCreated,
                LogEntryKind::ElementEdited,
                LogEntryKind::ElementDeleted,
                LogEntryKind::CollectionElementDeleted,
            ]));
            selection.excluded_target_types = BTreeSet::from([TargetType::User, TargetType::Group]);
            selection.include_total = false;
        }

        selection.targets = self.targets.clone();

        if let Some(filter) = filter {
            filter.apply(&mut selection);
        }

        selection
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use partledger_core::AppError;
    use partledger_domain::{LogEntryKind, LogLevel, TargetRef, TargetType};
    use uuid::Uuid;

    use super::{
        LogCriterion, LogDisplayMode, LogGridConfig, LogSelection, LogSelectionCriteria,
        LogSortField, SortDirection,
    };

    struct LevelFilter(LogLevel);

    impl LogSelectionCriteria for LevelFilter {
        fn apply(&self, selection: &mut LogSelection) {
            selection.push_criterion(LogCriterion::LevelIn(BTreeSet::from([self.0])));
        }
    }

    #[test]
    fn unknown_mode_is_a_configuration_error() {
        let parsed = LogGridConfig::parse("recent", Vec::new());
        assert!(matches!(parsed, Err(AppError::Configuration(_))));
    }

    #[test]
    fn system_log_selects_everything_by_default() {
        let config = LogGridConfig::new(LogDisplayMode::SystemLog, Vec::new());
        let selection = config.build_selection(None);

        assert_eq!(selection.kinds, None);
        assert!(selection.excluded_target_types.is_empty());
        assert!(selection.targets.is_empty());
        assert!(selection.criteria.is_empty());
        assert!(selection.include_total);
    }

    #[test]
    fn last_activity_restricts_kinds_and_excludes_admin_targets() {
        let config = LogGridConfig::new(LogDisplayMode::LastActivity, Vec::new());
        let selection = config.build_selection(None);

        let kinds = selection.kinds.unwrap_or_default();
        assert_eq!(
            kinds,
            BTreeSet::from([
                LogEntryKind::ElementCreated,
                LogEntryKind::ElementEdited,
                LogEntryKind::ElementDeleted,
                LogEntryKind::CollectionElementDeleted,
            ])
        );
        assert!(selection.excluded_target_types.contains(&TargetType::User));
        assert!(selection.excluded_target_types.contains(&TargetType::Group));
        assert!(!selection.include_total);
    }

    #[test]
    fn target_filter_becomes_a_disjunction() {
        let part_a = TargetRef::new(TargetType::Part, Uuid::new_v4());
        let part_b = TargetRef::new(TargetType::Part, Uuid::new_v4());
        let config =
            LogGridConfig::new(LogDisplayMode::ElementHistory, vec![part_a, part_b]);

        let selection = config.build_selection(None);

        assert_eq!(selection.targets, vec![part_a, part_b]);
    }

    #[test]
    fn external_filter_extends_instead_of_replacing() {
        let part = TargetRef::new(TargetType::Part, Uuid::new_v4());
        let config = LogGridConfig::new(LogDisplayMode::LastActivity, vec![part]);

        let selection = config.build_selection(Some(&LevelFilter(LogLevel::Warning)));

        assert!(selection.kinds.is_some());
        assert_eq!(selection.targets, vec![part]);
        assert_eq!(
            selection.criteria,
            vec![LogCriterion::LevelIn(BTreeSet::from([LogLevel::Warning]))]
        );
    }

    #[test]
    fn default_ordering_is_timestamp_descending() {
        let config = LogGridConfig::new(LogDisplayMode::SystemLog, Vec::new());
        let mut selection = config.build_selection(None);

        assert_eq!(selection.ordering.field, LogSortField::Timestamp);
        assert_eq!(selection.ordering.direction, SortDirection::Desc);

        selection.order_by(LogSortField::Level, SortDirection::Asc);
        assert_eq!(selection.ordering.direction, SortDirection::Asc);
    }

    #[test]
    fn mode_transport_values_roundtrip() {
        for mode in [
            LogDisplayMode::SystemLog,
            LogDisplayMode::ElementHistory,
            LogDisplayMode::LastActivity,
        ] {
            let parsed = LogDisplayMode::from_str(mode.as_str());
            assert!(matches!(parsed, Ok(value) if value == mode));
        }
    }

    #[test]
    fn sort_transport_values_roundtrip() {
        for field in [LogSortField::Timestamp, LogSortField::Level] {
            let parsed = LogSortField::parse_transport(field.as_str());
            assert!(matches!(parsed, Ok(value) if value == field));
        }
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let parsed = SortDirection::parse_transport(direction.as_str());
            assert!(matches!(parsed, Ok(value) if value == direction));
        }
        assert!(LogSortField::parse_transport("severity").is_err());
        assert!(SortDirection::parse_transport("down").is_err());
    }
}
