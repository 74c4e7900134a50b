use partledger_application::{LogColumnLayout, LogGrid, LogRow, TimeTravelTarget};
use partledger_domain::UserDisplay;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of a time travel destination.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/time-travel-response.ts"
)]
pub struct TimeTravelResponse {
    pub target_type: String,
    pub target_id: String,
    pub name: String,
    pub at: String,
}

/// API representation of one decorated log row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/log-row-response.ts"
)]
pub struct LogRowResponse {
    pub id: String,
    pub timestamp: String,
    pub level: Option<String>,
    pub kind: String,
    pub username: String,
    pub user_label: String,
    pub user_id: Option<String>,
    pub user_deleted: bool,
    pub avatar_url: Option<String>,
    pub row_class: String,
    pub severity_icon: String,
    pub target_type: String,
    pub target_id: String,
    #[ts(type = "unknown")]
    pub payload: serde_json::Value,
    pub time_travel: Option<TimeTravelResponse>,
    pub can_show_history: bool,
    pub can_revert: bool,
}

/// Column visibility for the requested display mode.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/log-column-layout-response.ts"
)]
pub struct LogColumnLayoutResponse {
    pub show_level: bool,
    pub show_target: bool,
}

/// One page of the audit log grid.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/log-grid-response.ts"
)]
pub struct LogGridResponse {
    pub rows: Vec<LogRowResponse>,
    pub total: Option<u64>,
    pub layout: LogColumnLayoutResponse,
}

impl From<TimeTravelTarget> for TimeTravelResponse {
    fn from(value: TimeTravelTarget) -> Self {
        Self {
            target_type: value.element.target.target_type.as_str().to_owned(),
            target_id: value.element.target.target_id.to_string(),
            name: value.element.name,
            at: value.at.to_rfc3339(),
        }
    }
}

impl From<LogRow> for LogRowResponse {
    fn from(value: LogRow) -> Self {
        let (user_id, avatar_url) = match &value.user {
            UserDisplay::Active {
                user_id,
                avatar_url,
                ..
            } => (Some(user_id.as_uuid().to_string()), avatar_url.clone()),
            UserDisplay::Deleted { .. } => (None, None),
        };

        Self {
            id: value.entry.id.to_string(),
            timestamp: value.entry.timestamp.to_rfc3339(),
            level: value.entry.level.map(|level| level.as_str().to_owned()),
            kind: value.entry.kind().as_str().to_owned(),
            username: value.entry.username.clone(),
            user_label: value.user.label(),
            user_id,
            user_deleted: matches!(value.user, UserDisplay::Deleted { .. }),
            avatar_url,
            row_class: value.style.css_class().to_owned(),
            severity_icon: value.icon.to_owned(),
            target_type: value.entry.target.target_type.as_str().to_owned(),
            target_id: value.entry.target.target_id.to_string(),
            payload: serde_json::to_value(&value.entry.payload).unwrap_or(serde_json::Value::Null),
            time_travel: value.time_travel.map(TimeTravelResponse::from),
            can_show_history: value.can_show_history,
            can_revert: value.can_revert,
        }
    }
}

impl From<LogColumnLayout> for LogColumnLayoutResponse {
    fn from(value: LogColumnLayout) -> Self {
        Self {
            show_level: value.show_level,
            show_target: value.show_target,
        }
    }
}

impl From<LogGrid> for LogGridResponse {
    fn from(value: LogGrid) -> Self {
        Self {
            rows: value.rows.into_iter().map(LogRowResponse::from).collect(),
            total: value.total,
            layout: LogColumnLayoutResponse::from(value.layout),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use partledger_application::{ElementSummary, LogRow, TimeTravelTarget};
    use partledger_domain::{
        LogEntry, LogEntryId, LogLevel, LogPayload, RowStyle, TargetRef, TargetType, UserId,
        UserSummary, row_style, severity_icon, user_display,
    };
    use ts_rs::Config;
    use ts_rs::TS;
    use uuid::Uuid;

    use super::{
        HealthResponse, LogColumnLayoutResponse, LogGridResponse, LogRowResponse,
        TimeTravelResponse,
    };
    use crate::error::ErrorResponse;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        ErrorResponse::export(&config)?;
        HealthResponse::export(&config)?;
        TimeTravelResponse::export(&config)?;
        LogRowResponse::export(&config)?;
        LogColumnLayoutResponse::export(&config)?;
        LogGridResponse::export(&config)?;

        Ok(())
    }

    #[test]
    fn deleted_actor_rows_map_to_the_placeholder_label() {
        let entry = LogEntry {
            id: LogEntryId::new(),
            timestamp: Utc::now(),
            level: Some(LogLevel::Warning),
            username: "bob".to_owned(),
            actor: None,
            target: TargetRef::new(TargetType::Part, Uuid::new_v4()),
            payload: LogPayload::SecurityEvent {
                event: "password_changed".to_owned(),
            },
        };

        let row = LogRow {
            style: row_style(entry.level),
            icon: severity_icon(entry.level),
            user: user_display(&entry),
            time_travel: None,
            can_show_history: true,
            can_revert: false,
            entry,
        };

        let response = LogRowResponse::from(row);

        assert_eq!(response.user_label, "@bob [deleted]");
        assert!(response.user_deleted);
        assert_eq!(response.user_id, None);
        assert_eq!(response.row_class, "table-warning");
        assert_eq!(response.severity_icon, "fa-exclamation-circle");
        assert_eq!(response.level.as_deref(), Some("warning"));
        assert_eq!(response.kind, "security_event");
        assert_eq!(response.target_type, "part");
        assert!(response.time_travel.is_none());
    }

    #[test]
    fn time_travel_target_maps_to_transport_fields() {
        let target = TargetRef::new(TargetType::Category, Uuid::new_v4());
        let at = Utc::now();
        let time_travel = TimeTravelTarget {
            element: ElementSummary {
                target,
                name: "Resistors".to_owned(),
            },
            at,
        };

        let response = TimeTravelResponse::from(time_travel);

        assert_eq!(response.target_type, "category");
        assert_eq!(response.target_id, target.target_id.to_string());
        assert_eq!(response.name, "Resistors");
        assert_eq!(response.at, at.to_rfc3339());
    }

    #[test]
    fn active_actor_rows_keep_the_user_reference() {
        let user_id = UserId::new();
        let entry = LogEntry {
            id: LogEntryId::new(),
            timestamp: Utc::now(),
            level: None,
            username: "alice".to_owned(),
            actor: Some(UserSummary {
                id: user_id,
                username: "alice".to_owned(),
                full_name: Some("Alice Example".to_owned()),
                avatar_url: None,
            }),
            target: TargetRef::NONE,
            payload: LogPayload::UserLogin {
                ip_address: "10.0.0.1".to_owned(),
            },
        };

        let row = LogRow {
            style: RowStyle::Default,
            icon: severity_icon(entry.level),
            user: user_display(&entry),
            time_travel: None,
            can_show_history: false,
            can_revert: false,
            entry,
        };

        let response = LogRowResponse::from(row);

        assert_eq!(response.user_label, "Alice Example");
        assert!(!response.user_deleted);
        assert_eq!(response.user_id, Some(user_id.as_uuid().to_string()));
        assert_eq!(response.level, None);
        assert_eq!(response.severity_icon, "fa-question-circle");
        assert_eq!(response.row_class, "");
    }
}
