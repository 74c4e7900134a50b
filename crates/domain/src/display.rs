//! Pure per-row display derivations for the log grid.
//!
//! These are total functions of a log entry. Keeping them free of any
//! rendering machinery makes every mapping testable on its own.

use crate::log::{LogEntry, LogLevel};
use crate::user::UserId;

/// Visual emphasis of a grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    /// Row for a severe failure.
    Danger,
    /// Row for a warning.
    Warning,
    /// Row for a notable but harmless event.
    Info,
    /// Row without special emphasis.
    Default,
}

impl RowStyle {
    /// Returns the table row class used by the grid stylesheet.
    #[must_use]
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Danger => "table-danger",
            Self::Warning => "table-warning",
            Self::Info => "table-info",
            Self::Default => "",
        }
    }
}

/// Maps a severity to the row emphasis, unknown severities stay plain.
#[must_use]
pub fn row_style(level: Option<LogLevel>) -> RowStyle {
    match level {
        Some(LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error) => {
            RowStyle::Danger
        }
        Some(LogLevel::Warning) => RowStyle::Warning,
        Some(LogLevel::Notice) => RowStyle::Info,
        Some(LogLevel::Info | LogLevel::Debug) | None => RowStyle::Default,
    }
}

/// Maps a severity to its icon token, unknown severities get a fallback.
#[must_use]
pub fn severity_icon(level: Option<LogLevel>) -> &'static str {
    match level {
        Some(LogLevel::Debug) => "fa-bug",
        Some(LogLevel::Info) => "fa-info",
        Some(LogLevel::Notice) => "fa-flag",
        Some(LogLevel::Warning) => "fa-exclamation-circle",
        Some(LogLevel::Error) => "fa-exclamation-triangle",
        Some(LogLevel::Critical) => "fa-bolt",
        Some(LogLevel::Alert) => "fa-radiation",
        Some(LogLevel::Emergency) => "fa-skull-crossbones",
        None => "fa-question-circle",
    }
}

/// How the acting user of a row is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserDisplay {
    /// The user row still exists and can be linked.
    Active {
        /// Identifier for building the profile link.
        user_id: UserId,
        /// Name to show.
        display_name: String,
        /// Avatar location, when the user has one.
        avatar_url: Option<String>,
    },
    /// The user row was deleted, only the captured name remains.
    Deleted {
        /// Username captured when the entry was written.
        username: String,
    },
}

impl UserDisplay {
    /// Returns the textual form of this display value.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Active { display_name, .. } => display_name.clone(),
            Self::Deleted { username } => format!("@{username} [deleted]"),
        }
    }
}

/// Derives the user column content, degrading to the captured username when
/// the acting user no longer resolves.
#[must_use]
pub fn user_display(entry: &LogEntry) -> UserDisplay {
    match entry.actor.as_ref() {
        Some(actor) => UserDisplay::Active {
            user_id: actor.id,
            display_name: actor.display_name().to_owned(),
            avatar_url: actor.avatar_url.clone(),
        },
        None => UserDisplay::Deleted {
            username: entry.username.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{RowStyle, UserDisplay, row_style, severity_icon, user_display};
    use crate::log::{LogEntry, LogEntryId, LogLevel, LogPayload};
    use crate::target::TargetRef;
    use crate::user::{UserId, UserSummary};

    fn login_entry(actor: Option<UserSummary>, username: &str) -> LogEntry {
        LogEntry {
            id: LogEntryId::new(),
            timestamp: chrono::Utc::now(),
            level: Some(LogLevel::Info),
            username: username.to_owned(),
            actor,
            target: TargetRef::NONE,
            payload: LogPayload::UserLogin {
                ip_address: "198.51.100.0".to_owned(),
            },
        }
    }

    #[test]
    fn severe_levels_use_danger_row() {
        for level in [
            LogLevel::Emergency,
            LogLevel::Alert,
            LogLevel::Critical,
            LogLevel::Error,
        ] {
            assert_eq!(row_style(Some(level)), RowStyle::Danger);
        }
    }

    #[test]
    fn informational_levels_stay_plain() {
        assert_eq!(row_style(Some(LogLevel::Warning)), RowStyle::Warning);
        assert_eq!(row_style(Some(LogLevel::Notice)), RowStyle::Info);
        assert_eq!(row_style(Some(LogLevel::Info)), RowStyle::Default);
        assert_eq!(row_style(Some(LogLevel::Debug)), RowStyle::Default);
        assert_eq!(row_style(None), RowStyle::Default);
    }

    #[test]
    fn every_level_has_a_distinct_icon() {
        let mut seen = std::collections::BTreeSet::new();
        for level in LogLevel::all() {
            seen.insert(severity_icon(Some(*level)));
        }
        assert_eq!(seen.len(), LogLevel::all().len());
        assert_eq!(severity_icon(None), "fa-question-circle");
    }

    #[test]
    fn resolved_actor_is_linked() {
        let actor = UserSummary {
            id: UserId::new(),
            username: "jdoe".to_owned(),
            full_name: Some("J. Doe".to_owned()),
            avatar_url: None,
        };
        let entry = login_entry(Some(actor), "jdoe");
        let display = user_display(&entry);
        assert!(matches!(display, UserDisplay::Active { .. }));
        assert_eq!(display.label(), "J. Doe");
    }

    #[test]
    fn deleted_actor_degrades_to_marked_username() {
        let entry = login_entry(None, "ghost");
        let display = user_display(&entry);
        let label = display.label();
        assert!(label.contains("ghost"));
        assert!(label.contains("deleted"));
    }

    proptest! {
        #[test]
        fn any_stored_code_renders(code in any::<i16>()) {
            let level = LogLevel::from_code(code);
            prop_assert!(!severity_icon(level).is_empty());
            let style = row_style(level);
            prop_assert!(matches!(
                style,
                RowStyle::Danger | RowStyle::Warning | RowStyle::Info | RowStyle::Default
            ));
        }
    }
}
