//! Filter constraints offered by the log grid's filter form.
//!
//! Each constraint knows whether it is active; inactive constraints
//! contribute nothing to the selection. The whole filter implements
//! [`LogSelectionCriteria`], so the grid treats it as one opaque extension
//! of its query.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use partledger_core::{AppError, AppResult};
use partledger_domain::{LogEntryKind, LogLevel, TargetType, UserId};
use uuid::Uuid;

use crate::log_selection::{LogCriterion, LogSelection, LogSelectionCriteria};

/// Value of a tri-state checkbox widget.
///
/// The indeterminate state means "do not filter on this at all", which is
/// distinct from both checked states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    /// Indeterminate, the constraint is inactive.
    #[default]
    Any,
    /// Checked, only matching rows pass.
    Yes,
    /// Unchecked, only non-matching rows pass.
    No,
}

impl TriState {
    /// Parses a form parameter into a tri-state value.
    ///
    /// A missing or empty parameter is the indeterminate state.
    pub fn from_param(value: Option<&str>) -> AppResult<Self> {
        match value {
            None | Some("") => Ok(Self::Any),
            Some("1" | "true") => Ok(Self::Yes),
            Some("0" | "false") => Ok(Self::No),
            Some(other) => Err(AppError::Validation(format!(
                "unknown tri-state value '{other}'"
            ))),
        }
    }

    /// Returns the constrained boolean, `None` when indeterminate.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Any => None,
            Self::Yes => Some(true),
            Self::No => Some(false),
        }
    }
}

/// Boolean filter constraint driven by a tri-state checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanConstraint {
    /// Current widget value.
    pub value: TriState,
}

impl BooleanConstraint {
    /// Whether this constraint narrows the selection.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.value != TriState::Any
    }
}

/// Any-of filter constraint over an enumerated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceConstraint<T> {
    /// Selected values, empty means inactive.
    pub selected: BTreeSet<T>,
}

impl<T> ChoiceConstraint<T> {
    /// Whether this constraint narrows the selection.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.selected.is_empty()
    }
}

impl<T: Ord> Default for ChoiceConstraint<T> {
    fn default() -> Self {
        Self {
            selected: BTreeSet::new(),
        }
    }
}

impl<T: Ord> FromIterator<T> for ChoiceConstraint<T> {
    fn from_iter<I: IntoIterator<Item = T>>(values: I) -> Self {
        Self {
            selected: values.into_iter().collect(),
        }
    }
}

/// Inclusive timestamp window constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstantRangeConstraint {
    /// Lower bound, inclusive.
    pub after: Option<DateTime<Utc>>,
    /// Upper bound, inclusive.
    pub before: Option<DateTime<Utc>>,
}

impl InstantRangeConstraint {
    /// Whether this constraint narrows the selection.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }
}

/// Complete filter form state for log listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogEntryFilter {
    /// Timestamp window.
    pub timestamp: InstantRangeConstraint,
    /// Severity allowlist.
    pub level: ChoiceConstraint<LogLevel>,
    /// Subtype allowlist.
    pub kind: ChoiceConstraint<LogEntryKind>,
    /// Acting user equality.
    pub actor: Option<UserId>,
    /// Whether the acting user reference must be deleted or present.
    pub actor_deleted: BooleanConstraint,
    /// Target type allowlist.
    pub target_type: ChoiceConstraint<TargetType>,
    /// Target id equality.
    pub target_id: Option<Uuid>,
}

impl LogSelectionCriteria for LogEntryFilter {
    fn apply(&self, selection: &mut LogSelection) {
        if let Some(after) = self.timestamp.after {
            selection.push_criterion(LogCriterion::TimestampAfter(after));
        }
        if let Some(before) = self.timestamp.before {
            selection.push_criterion(LogCriterion::TimestampBefore(before));
        }
        if self.level.is_active() {
            selection.push_criterion(LogCriterion::LevelIn(self.level.selected.clone()));
        }
        if self.kind.is_active() {
            selection.push_criterion(LogCriterion::KindIn(self.kind.selected.clone()));
        }
        if let Some(actor) = self.actor {
            selection.push_criterion(LogCriterion::ActorIs(actor));
        }
        if let Some(deleted) = self.actor_deleted.value.as_bool() {
            selection.push_criterion(LogCriterion::ActorDeleted(deleted));
        }
        if self.target_type.is_active() {
            selection.push_criterion(LogCriterion::TargetTypeIn(
                self.target_type.selected.clone(),
            ));
        }
        if let Some(target_id) = self.target_id {
            selection.push_criterion(LogCriterion::TargetIdIs(target_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use partledger_domain::{LogLevel, TargetRef, TargetType};
    use uuid::Uuid;

    use super::{BooleanConstraint, LogEntryFilter, TriState};
    use crate::log_selection::{
        LogCriterion, LogDisplayMode, LogGridConfig, LogSelectionCriteria,
    };

    #[test]
    fn tri_state_parses_widget_values() {
        assert_eq!(TriState::from_param(None).ok(), Some(TriState::Any));
        assert_eq!(TriState::from_param(Some("")).ok(), Some(TriState::Any));
        assert_eq!(TriState::from_param(Some("1")).ok(), Some(TriState::Yes));
        assert_eq!(TriState::from_param(Some("true")).ok(), Some(TriState::Yes));
        assert_eq!(TriState::from_param(Some("0")).ok(), Some(TriState::No));
        assert_eq!(TriState::from_param(Some("false")).ok(), Some(TriState::No));
        assert!(TriState::from_param(Some("maybe")).is_err());
    }

    #[test]
    fn indeterminate_constraint_is_inactive() {
        let constraint = BooleanConstraint::default();
        assert!(!constraint.is_active());
        assert_eq!(constraint.value.as_bool(), None);
    }

    #[test]
    fn default_filter_pushes_nothing() {
        let filter = LogEntryFilter::default();
        let mut selection = LogGridConfig::new(LogDisplayMode::SystemLog, Vec::new())
            .build_selection(None);

        filter.apply(&mut selection);

        assert!(selection.criteria.is_empty());
    }

    #[test]
    fn active_constraints_become_criteria() {
        let filter = LogEntryFilter {
            level: [LogLevel::Error, LogLevel::Warning].into_iter().collect(),
            actor_deleted: BooleanConstraint {
                value: TriState::Yes,
            },
            target_id: Some(Uuid::nil()),
            ..LogEntryFilter::default()
        };
        let mut selection = LogGridConfig::new(LogDisplayMode::SystemLog, Vec::new())
            .build_selection(None);

        filter.apply(&mut selection);

        assert_eq!(
            selection.criteria,
            vec![
                LogCriterion::LevelIn(BTreeSet::from([LogLevel::Error, LogLevel::Warning])),
                LogCriterion::ActorDeleted(true),
                LogCriterion::TargetIdIs(Uuid::nil()),
            ]
        );
    }

    #[test]
    fn filter_composes_with_target_disjunction() {
        let part = TargetRef::new(TargetType::Part, Uuid::new_v4());
        let filter = LogEntryFilter {
            actor_deleted: BooleanConstraint {
                value: TriState::No,
            },
            ..LogEntryFilter::default()
        };

        let selection = LogGridConfig::new(LogDisplayMode::ElementHistory, vec![part])
            .build_selection(Some(&filter));

        assert_eq!(selection.targets, vec![part]);
        assert_eq!(selection.criteria, vec![LogCriterion::ActorDeleted(false)]);
    }
}
