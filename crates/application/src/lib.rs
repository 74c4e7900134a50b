//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod log_filters;
mod log_grid_service;
mod log_ports;
mod log_selection;

pub use authorization_service::{AuthorizationService, CapabilityGrant, CapabilityRepository};
pub use log_filters::{
    BooleanConstraint, ChoiceConstraint, InstantRangeConstraint, LogEntryFilter, TriState,
};
pub use log_grid_service::{LogColumnLayout, LogGrid, LogGridService, LogRow, TimeTravelTarget};
pub use log_ports::{
    ElementSummary, LogEntryRepository, MAX_PAGE_LIMIT, MAX_PAGE_OFFSET, PageRequest,
    TargetElementRepository,
};
pub use log_selection::{
    LogCriterion, LogDisplayMode, LogGridConfig, LogOrdering, LogSelection, LogSelectionCriteria,
    LogSortField, SortDirection,
};
