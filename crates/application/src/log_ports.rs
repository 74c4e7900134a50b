use async_trait::async_trait;
use partledger_core::AppResult;
use partledger_domain::{LogEntry, TargetRef};

use crate::log_selection::LogSelection;

/// Largest page a single listing call may return.
pub const MAX_PAGE_LIMIT: usize = 200;

/// Largest offset accepted for offset pagination.
pub const MAX_PAGE_OFFSET: usize = 5000;

/// Pagination window for log listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped.
    pub offset: usize,
}

impl PageRequest {
    /// Returns the window clamped to protective bounds.
    ///
    /// Adapters apply this before touching the store, so oversized requests
    /// degrade instead of scanning unbounded ranges.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
            offset: self.offset.min(MAX_PAGE_OFFSET),
        }
    }
}

/// Projection of a live inventory element resolved from a target reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSummary {
    /// Reference that resolved.
    pub target: TargetRef,
    /// Current display name of the element.
    pub name: String,
}

/// Repository port for reading log entries.
#[async_trait]
pub trait LogEntryRepository: Send + Sync {
    /// Returns the page of entries matched by a selection.
    async fn select_entries(
        &self,
        selection: &LogSelection,
        page: PageRequest,
    ) -> AppResult<Vec<LogEntry>>;

    /// Counts all entries matched by a selection.
    async fn count_entries(&self, selection: &LogSelection) -> AppResult<u64>;
}

/// Repository port resolving target references to live elements.
#[async_trait]
pub trait TargetElementRepository: Send + Sync {
    /// Finds the live element a reference points at.
    ///
    /// Returns `Ok(None)` when the element was deleted since the entry was
    /// written and `Err(AppError::Unsupported)` when the target type has no
    /// live-element lookup at all.
    async fn find_element(&self, target: TargetRef) -> AppResult<Option<ElementSummary>>;
}
