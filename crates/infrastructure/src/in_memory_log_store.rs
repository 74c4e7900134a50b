use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use partledger_application::{
    CapabilityGrant, CapabilityRepository, ElementSummary, LogCriterion, LogEntryRepository,
    LogSelection, LogSortField, PageRequest, SortDirection, TargetElementRepository,
};
use partledger_core::{AppError, AppResult};
use partledger_domain::{LogEntry, TargetRef, TargetType};

/// In-memory log store implementation.
///
/// Backs all three read ports at once so demo setups and tests run without a
/// database. Selection semantics mirror the PostgreSQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    entries: RwLock<Vec<LogEntry>>,
    elements: RwLock<HashMap<TargetRef, String>>,
    grants: RwLock<HashMap<String, Vec<CapabilityGrant>>>,
}

impl InMemoryLogStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a log entry.
    pub async fn append_entry(&self, entry: LogEntry) {
        self.entries.write().await.push(entry);
    }

    /// Registers or renames a live element.
    pub async fn upsert_element(&self, target: TargetRef, name: impl Into<String>) {
        self.elements.write().await.insert(target, name.into());
    }

    /// Removes a live element, simulating its deletion.
    pub async fn remove_element(&self, target: TargetRef) {
        self.elements.write().await.remove(&target);
    }

    /// Grants a capability to a subject.
    pub async fn grant(&self, subject: impl Into<String>, grant: CapabilityGrant) {
        self.grants
            .write()
            .await
            .entry(subject.into())
            .or_default()
            .push(grant);
    }
}

fn matches_criterion(entry: &LogEntry, criterion: &LogCriterion) -> bool {
    match criterion {
        LogCriterion::LevelIn(levels) => entry.level.is_some_and(|level| levels.contains(&level)),
        LogCriterion::KindIn(kinds) => kinds.contains(&entry.kind()),
        LogCriterion::ActorIs(user_id) => {
            entry.actor.as_ref().is_some_and(|actor| actor.id == *user_id)
        }
        LogCriterion::ActorDeleted(deleted) => entry.actor.is_none() == *deleted,
        LogCriterion::TargetTypeIn(target_types) => {
            target_types.contains(&entry.target.target_type)
        }
        LogCriterion::TargetIdIs(target_id) => entry.target.target_id == *target_id,
        LogCriterion::TimestampAfter(instant) => entry.timestamp >= *instant,
        LogCriterion::TimestampBefore(instant) => entry.timestamp <= *instant,
    }
}

fn matches_selection(entry: &LogEntry, selection: &LogSelection) -> bool {
    let kind_admitted = selection
        .kinds
        .as_ref()
        .is_none_or(|kinds| kinds.contains(&entry.kind()));
    if !kind_admitted {
        return false;
    }

    if selection
        .excluded_target_types
        .contains(&entry.target.target_type)
    {
        return false;
    }

    if !selection.targets.is_empty() && !selection.targets.contains(&entry.target) {
        return false;
    }

    selection
        .criteria
        .iter()
        .all(|criterion| matches_criterion(entry, criterion))
}

fn sort_entries(entries: &mut [LogEntry], selection: &LogSelection) {
    let direction = selection.ordering.direction;
    match selection.ordering.field {
        LogSortField::Timestamp => entries.sort_by(|left, right| {
            let ordering = left.timestamp.cmp(&right.timestamp);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }),
        LogSortField::Level => entries.sort_by(|left, right| {
            // Rows with an unrecognized severity code sort last in both
            // directions.
            let ordering = match (left.level, right.level) {
                (Some(left_level), Some(right_level)) => {
                    let by_code = left_level.code().cmp(&right_level.code());
                    match direction {
                        SortDirection::Asc => by_code,
                        SortDirection::Desc => by_code.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            ordering.then_with(|| right.timestamp.cmp(&left.timestamp))
        }),
    }
}

#[async_trait]
impl LogEntryRepository for InMemoryLogStore {
    async fn select_entries(
        &self,
        selection: &LogSelection,
        page: PageRequest,
    ) -> AppResult<Vec<LogEntry>> {
        let page = page.clamped();
        let entries = self.entries.read().await;

        let mut matched: Vec<LogEntry> = entries
            .iter()
            .filter(|entry| matches_selection(entry, selection))
            .cloned()
            .collect();
        sort_entries(&mut matched, selection);

        Ok(matched
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    async fn count_entries(&self, selection: &LogSelection) -> AppResult<u64> {
        let entries = self.entries.read().await;
        let matched = entries
            .iter()
            .filter(|entry| matches_selection(entry, selection))
            .count();
        Ok(matched as u64)
    }
}

#[async_trait]
impl TargetElementRepository for InMemoryLogStore {
    async fn find_element(&self, target: TargetRef) -> AppResult<Option<ElementSummary>> {
        if target.target_type == TargetType::None {
            return Err(AppError::Unsupported(format!(
                "target type '{}' has no live element lookup",
                target.target_type.as_str()
            )));
        }

        Ok(self
            .elements
            .read()
            .await
            .get(&target)
            .map(|name| ElementSummary {
                target,
                name: name.clone(),
            }))
    }
}

#[async_trait]
impl CapabilityRepository for InMemoryLogStore {
    async fn list_grants_for_subject(&self, subject: &str) -> AppResult<Vec<CapabilityGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .get(subject)
            .cloned()
            .unwrap_or_default())
    }
}
