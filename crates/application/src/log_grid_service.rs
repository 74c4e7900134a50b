use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use partledger_core::{AppError, AppResult, UserIdentity};
use partledger_domain::{
    Capability, LogEntry, RowStyle, TargetRef, TargetType, UserDisplay, row_style, severity_icon,
    user_display,
};

use crate::authorization_service::AuthorizationService;
use crate::log_filters::LogEntryFilter;
use crate::log_ports::{ElementSummary, LogEntryRepository, PageRequest, TargetElementRepository};
use crate::log_selection::{LogDisplayMode, LogGridConfig, LogOrdering, LogSelection};

/// Anchor for reconstructing the historical state of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeTravelTarget {
    /// Live element the reconstruction starts from.
    pub element: ElementSummary,
    /// Moment to reconstruct the element at.
    pub at: DateTime<Utc>,
}

/// One decorated grid row.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    /// The underlying entry.
    pub entry: LogEntry,
    /// Row emphasis derived from the severity.
    pub style: RowStyle,
    /// Severity icon token.
    pub icon: &'static str,
    /// User column content.
    pub user: UserDisplay,
    /// Historical reconstruction anchor, when the row supports one.
    pub time_travel: Option<TimeTravelTarget>,
    /// Whether the actor may open the target's history.
    pub can_show_history: bool,
    /// Whether the actor may revert the target to this row's state.
    pub can_revert: bool,
}

/// Column visibility derived from the display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogColumnLayout {
    /// The severity column is only interesting on the full system log.
    pub show_level: bool,
    /// Element history pages already know their element, so the target
    /// column is hidden there.
    pub show_target: bool,
}

impl LogColumnLayout {
    /// Returns the layout for a display mode.
    #[must_use]
    pub fn for_mode(mode: LogDisplayMode) -> Self {
        Self {
            show_level: mode == LogDisplayMode::SystemLog,
            show_target: mode != LogDisplayMode::ElementHistory,
        }
    }
}

/// One page of the log grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LogGrid {
    /// Decorated rows in selection order.
    pub rows: Vec<LogRow>,
    /// Total matching rows, absent when not meaningful for the mode.
    pub total: Option<u64>,
    /// Column visibility for the mode.
    pub layout: LogColumnLayout,
}

/// Application service assembling the audit log grid.
#[derive(Clone)]
pub struct LogGridService {
    authorization_service: AuthorizationService,
    log_entries: Arc<dyn LogEntryRepository>,
    target_elements: Arc<dyn TargetElementRepository>,
}

impl LogGridService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        log_entries: Arc<dyn LogEntryRepository>,
        target_elements: Arc<dyn TargetElementRepository>,
    ) -> Self {
        Self {
            authorization_service,
            log_entries,
            target_elements,
        }
    }

    /// Returns a page of the full system log, sorted as requested.
    pub async fn list_system_log(
        &self,
        actor: &UserIdentity,
        filter: &LogEntryFilter,
        ordering: LogOrdering,
        page: PageRequest,
    ) -> AppResult<LogGrid> {
        self.authorization_service
            .require(actor.subject(), Capability::LogShow, None)
            .await?;

        let config = LogGridConfig::new(LogDisplayMode::SystemLog, Vec::new());
        let mut selection = config.build_selection(Some(filter));
        selection.order_by(ordering.field, ordering.direction);
        self.fetch_grid(actor, config.mode(), selection, page).await
    }

    /// Returns a page of the change history of one or more elements.
    ///
    /// The actor needs the history capability for every distinct target type
    /// in the request before any row is read.
    pub async fn list_element_history(
        &self,
        actor: &UserIdentity,
        targets: Vec<TargetRef>,
        filter: &LogEntryFilter,
        ordering: LogOrdering,
        page: PageRequest,
    ) -> AppResult<LogGrid> {
        let distinct_types: BTreeSet<TargetType> = targets
            .iter()
            .map(|target| target.target_type)
            .collect();
        for target_type in distinct_types {
            self.authorization_service
                .require(actor.subject(), Capability::LogShowHistory, Some(target_type))
                .await?;
        }

        let config = LogGridConfig::new(LogDisplayMode::ElementHistory, targets);
        let mut selection = config.build_selection(Some(filter));
        selection.order_by(ordering.field, ordering.direction);
        self.fetch_grid(actor, config.mode(), selection, page).await
    }

    /// Returns the bounded recent-activity feed.
    ///
    /// The returned grid never carries a total count.
    pub async fn list_last_activity(
        &self,
        actor: &UserIdentity,
        page: PageRequest,
    ) -> AppResult<LogGrid> {
        self.authorization_service
            .require(actor.subject(), Capability::LogShow, None)
            .await?;

        let config = LogGridConfig::new(LogDisplayMode::LastActivity, Vec::new());
        let selection = config.build_selection(None);
        self.fetch_grid(actor, config.mode(), selection, page).await
    }

    async fn fetch_grid(
        &self,
        actor: &UserIdentity,
        mode: LogDisplayMode,
        selection: LogSelection,
        page: PageRequest,
    ) -> AppResult<LogGrid> {
        let entries = self.log_entries.select_entries(&selection, page).await?;
        let total = if selection.include_total {
            Some(self.log_entries.count_entries(&selection).await?)
        } else {
            None
        };

        // Per-type flags repeat across a page, resolve each type once.
        let mut flags: HashMap<TargetType, (bool, bool)> = HashMap::new();
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let (can_show_history, can_revert) = match flags.entry(entry.target.target_type) {
                std::collections::hash_map::Entry::Occupied(known) => *known.get(),
                std::collections::hash_map::Entry::Vacant(slot) => {
                    let resolved = self
                        .target_flags(actor.subject(), entry.target.target_type)
                        .await?;
                    *slot.insert(resolved)
                }
            };

            let time_travel = self.time_travel_for(&entry).await?;
            rows.push(LogRow {
                style: row_style(entry.level),
                icon: severity_icon(entry.level),
                user: user_display(&entry),
                time_travel,
                can_show_history,
                can_revert,
                entry,
            });
        }

        Ok(LogGrid {
            rows,
            total,
            layout: LogColumnLayout::for_mode(mode),
        })
    }

    async fn target_flags(
        &self,
        subject: &str,
        target_type: TargetType,
    ) -> AppResult<(bool, bool)> {
        let can_show_history = self
            .authorization_service
            .is_granted(subject, Capability::LogShowHistory, Some(target_type))
            .await?;
        let can_revert = self
            .authorization_service
            .is_granted(subject, Capability::LogRevertElement, Some(target_type))
            .await?;
        Ok((can_show_history, can_revert))
    }

    /// Computes the reconstruction anchor for one row.
    ///
    /// Target types without a live-element lookup and targets that no longer
    /// resolve both yield `None`; the capability is simply unavailable for
    /// that row. Store failures still propagate.
    async fn time_travel_for(&self, entry: &LogEntry) -> AppResult<Option<TimeTravelTarget>> {
        if !entry.supports_time_travel() {
            return Ok(None);
        }

        match self.target_elements.find_element(entry.target).await {
            Ok(found) => Ok(found.map(|element| TimeTravelTarget {
                element,
                at: entry.timestamp,
            })),
            Err(AppError::Unsupported(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }
}
