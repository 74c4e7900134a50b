//! Audit log entries and their subtype payloads.
//!
//! Every change to inventory data is recorded as a [`LogEntry`]. The subtype
//! payload is a tagged union so readers dispatch with a `match` instead of
//! downcasting, and the stored form keeps the tag queryable.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use partledger_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::target::{TargetRef, TargetType};
use crate::user::UserSummary;

/// Unique identifier for a log entry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntryId(Uuid);

impl LogEntryId {
    /// Creates a new random log entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a log entry identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LogEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogEntryId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Severity of a log entry, most severe first.
///
/// Codes follow the PSR-3 layout already present in stored rows: lower code
/// means more severe. The derived order follows declaration order, so
/// `Emergency` sorts before `Debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// System is unusable.
    Emergency,
    /// Action must be taken immediately.
    Alert,
    /// Critical condition.
    Critical,
    /// Runtime error.
    Error,
    /// Exceptional occurrence that is not an error.
    Warning,
    /// Normal but significant event.
    Notice,
    /// Informational event.
    Info,
    /// Detailed debug event.
    Debug,
}

impl LogLevel {
    /// Returns the stable storage code for this level.
    #[must_use]
    pub fn code(&self) -> i16 {
        match self {
            Self::Emergency => 0,
            Self::Alert => 1,
            Self::Critical => 2,
            Self::Error => 3,
            Self::Warning => 4,
            Self::Notice => 5,
            Self::Info => 6,
            Self::Debug => 7,
        }
    }

    /// Resolves a storage code, if it names a known level.
    #[must_use]
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Emergency),
            1 => Some(Self::Alert),
            2 => Some(Self::Critical),
            3 => Some(Self::Error),
            4 => Some(Self::Warning),
            5 => Some(Self::Notice),
            6 => Some(Self::Info),
            7 => Some(Self::Debug),
            _ => None,
        }
    }

    /// Returns a stable transport value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Returns all known levels, most severe first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[LogLevel] = &[
            LogLevel::Emergency,
            LogLevel::Alert,
            LogLevel::Critical,
            LogLevel::Error,
            LogLevel::Warning,
            LogLevel::Notice,
            LogLevel::Info,
            LogLevel::Debug,
        ];

        ALL
    }
}

impl FromStr for LogLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "emergency" => Ok(Self::Emergency),
            "alert" => Ok(Self::Alert),
            "critical" => Ok(Self::Critical),
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "notice" => Ok(Self::Notice),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(AppError::Validation(format!(
                "unknown log level value '{value}'"
            ))),
        }
    }
}

/// Discriminant naming the subtype of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryKind {
    /// An inventory element was created.
    ElementCreated,
    /// An inventory element was edited.
    ElementEdited,
    /// An inventory element was deleted.
    ElementDeleted,
    /// A child element was removed from a collection on its parent.
    CollectionElementDeleted,
    /// The stock amount of a part lot changed.
    PartStockChanged,
    /// A user logged in.
    UserLogin,
    /// A user logged out.
    UserLogout,
    /// A security relevant account event occurred.
    SecurityEvent,
    /// The database schema was migrated.
    DatabaseUpdated,
}

impl LogEntryKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElementCreated => "element_created",
            Self::ElementEdited => "element_edited",
            Self::ElementDeleted => "element_deleted",
            Self::CollectionElementDeleted => "collection_element_deleted",
            Self::PartStockChanged => "part_stock_changed",
            Self::UserLogin => "user_login",
            Self::UserLogout => "user_logout",
            Self::SecurityEvent => "security_event",
            Self::DatabaseUpdated => "database_updated",
        }
    }

    /// Returns all known kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[LogEntryKind] = &[
            LogEntryKind::ElementCreated,
            LogEntryKind::ElementEdited,
            LogEntryKind::ElementDeleted,
            LogEntryKind::CollectionElementDeleted,
            LogEntryKind::PartStockChanged,
            LogEntryKind::UserLogin,
            LogEntryKind::UserLogout,
            LogEntryKind::SecurityEvent,
            LogEntryKind::DatabaseUpdated,
        ];

        ALL
    }
}

impl FromStr for LogEntryKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "element_created" => Ok(Self::ElementCreated),
            "element_edited" => Ok(Self::ElementEdited),
            "element_deleted" => Ok(Self::ElementDeleted),
            "collection_element_deleted" => Ok(Self::CollectionElementDeleted),
            "part_stock_changed" => Ok(Self::PartStockChanged),
            "user_login" => Ok(Self::UserLogin),
            "user_logout" => Ok(Self::UserLogout),
            "security_event" => Ok(Self::SecurityEvent),
            "database_updated" => Ok(Self::DatabaseUpdated),
            _ => Err(AppError::Validation(format!(
                "unknown log entry kind '{value}'"
            ))),
        }
    }
}

/// Direction of a stock amount change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockChangeType {
    /// Stock was added to a lot.
    Add,
    /// Stock was withdrawn from a lot.
    Withdraw,
    /// Stock was moved between lots.
    Move,
}

impl StockChangeType {
    /// Returns a stable storage value for this change type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Withdraw => "withdraw",
            Self::Move => "move",
        }
    }
}

impl FromStr for StockChangeType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "add" => Ok(Self::Add),
            "withdraw" => Ok(Self::Withdraw),
            "move" => Ok(Self::Move),
            _ => Err(AppError::Validation(format!(
                "unknown stock change type '{value}'"
            ))),
        }
    }
}

/// Subtype payload of a log entry.
///
/// The serialized form carries the discriminant under `kind` with the values
/// of [`LogEntryKind::as_str`], so payloads stored as JSON stay in sync with
/// the queryable kind column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogPayload {
    /// An inventory element was created.
    ElementCreated {
        /// Instance data recorded at creation time, when available.
        creation_data: Option<Value>,
    },
    /// An inventory element was edited.
    ElementEdited {
        /// Field values before the edit, enabling historical reconstruction.
        old_data: Option<Value>,
        /// Names of the fields touched by the edit.
        changed_fields: Vec<String>,
    },
    /// An inventory element was deleted.
    ElementDeleted {
        /// Display name of the element at deletion time.
        old_name: Option<String>,
        /// Field values before the deletion, enabling historical reconstruction.
        old_data: Option<Value>,
    },
    /// A child element was removed from a collection on its parent.
    CollectionElementDeleted {
        /// Name of the collection on the parent the child was removed from.
        collection_name: String,
        /// Type of the removed child element.
        element_type: TargetType,
        /// Identifier of the removed child element.
        element_id: Uuid,
        /// Display name of the removed child at deletion time.
        old_name: Option<String>,
        /// Field values of the removed child, when recorded.
        old_data: Option<Value>,
    },
    /// The stock amount of a part lot changed.
    PartStockChanged {
        /// Direction of the change.
        change_type: StockChangeType,
        /// Stock amount before the change.
        old_stock: f64,
        /// Stock amount after the change.
        new_stock: f64,
        /// Free-form comment entered with the change.
        comment: Option<String>,
        /// Receiving lot for move operations.
        move_to: Option<TargetRef>,
    },
    /// A user logged in.
    UserLogin {
        /// Client address the login originated from, possibly anonymized.
        ip_address: String,
    },
    /// A user logged out.
    UserLogout {
        /// Client address the logout originated from, possibly anonymized.
        ip_address: String,
    },
    /// A security relevant account event occurred.
    SecurityEvent {
        /// Stable name of the event, for example `password_changed`.
        event: String,
    },
    /// The database schema was migrated.
    DatabaseUpdated {
        /// Schema version before the migration.
        old_version: String,
        /// Schema version after the migration.
        new_version: String,
        /// Whether the migration completed successfully.
        success: bool,
    },
}

impl LogPayload {
    /// Returns the discriminant of this payload.
    #[must_use]
    pub fn kind(&self) -> LogEntryKind {
        match self {
            Self::ElementCreated { .. } => LogEntryKind::ElementCreated,
            Self::ElementEdited { .. } => LogEntryKind::ElementEdited,
            Self::ElementDeleted { .. } => LogEntryKind::ElementDeleted,
            Self::CollectionElementDeleted { .. } => LogEntryKind::CollectionElementDeleted,
            Self::PartStockChanged { .. } => LogEntryKind::PartStockChanged,
            Self::UserLogin { .. } => LogEntryKind::UserLogin,
            Self::UserLogout { .. } => LogEntryKind::UserLogout,
            Self::SecurityEvent { .. } => LogEntryKind::SecurityEvent,
            Self::DatabaseUpdated { .. } => LogEntryKind::DatabaseUpdated,
        }
    }

    /// Returns the recorded pre-change state, when this payload carries one.
    #[must_use]
    pub fn old_data(&self) -> Option<&Value> {
        match self {
            Self::ElementEdited { old_data, .. }
            | Self::ElementDeleted { old_data, .. }
            | Self::CollectionElementDeleted { old_data, .. } => old_data.as_ref(),
            _ => None,
        }
    }
}

/// A single audit log row, read-only from the grid's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Row identifier.
    pub id: LogEntryId,
    /// Moment the logged event happened.
    pub timestamp: DateTime<Utc>,
    /// Severity, absent when the stored code is not a known level.
    pub level: Option<LogLevel>,
    /// Username captured at write time; survives deletion of the user row.
    pub username: String,
    /// Acting user, when the user row still resolves.
    pub actor: Option<UserSummary>,
    /// Domain entity the entry refers to.
    pub target: TargetRef,
    /// Subtype payload.
    pub payload: LogPayload,
}

impl LogEntry {
    /// Returns the subtype discriminant of this entry.
    #[must_use]
    pub fn kind(&self) -> LogEntryKind {
        self.payload.kind()
    }

    /// Returns the recorded pre-change state, when the payload carries one.
    #[must_use]
    pub fn old_data(&self) -> Option<&Value> {
        self.payload.old_data()
    }

    /// Whether this entry can anchor a historical reconstruction.
    ///
    /// Collection removals always qualify even without a recorded snapshot,
    /// since the removal itself is the reconstructable event.
    #[must_use]
    pub fn supports_time_travel(&self) -> bool {
        matches!(self.payload, LogPayload::CollectionElementDeleted { .. })
            || self.old_data().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::{LogEntry, LogEntryId, LogEntryKind, LogLevel, LogPayload};
    use crate::target::{TargetRef, TargetType};

    fn entry_with(payload: LogPayload) -> LogEntry {
        LogEntry {
            id: LogEntryId::new(),
            timestamp: chrono::Utc::now(),
            level: Some(LogLevel::Info),
            username: "admin".to_owned(),
            actor: None,
            target: TargetRef::new(TargetType::Part, uuid::Uuid::new_v4()),
            payload,
        }
    }

    #[test]
    fn level_codes_roundtrip() {
        for level in LogLevel::all() {
            assert_eq!(LogLevel::from_code(level.code()), Some(*level));
        }
        assert_eq!(LogLevel::from_code(42), None);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let parsed = LogEntryKind::from_str("element_renamed");
        assert!(parsed.is_err());
    }

    #[test]
    fn payload_tag_matches_kind_value() {
        let payload = LogPayload::CollectionElementDeleted {
            collection_name: "parameters".to_owned(),
            element_type: TargetType::Parameter,
            element_id: uuid::Uuid::new_v4(),
            old_name: Some("Tolerance".to_owned()),
            old_data: None,
        };
        let encoded = serde_json::to_value(&payload).unwrap_or_default();
        assert_eq!(
            encoded.get("kind").and_then(|kind| kind.as_str()),
            Some(payload.kind().as_str())
        );
    }

    #[test]
    fn edit_with_old_data_supports_time_travel() {
        let entry = entry_with(LogPayload::ElementEdited {
            old_data: Some(json!({"name": "R1"})),
            changed_fields: vec!["name".to_owned()],
        });
        assert!(entry.supports_time_travel());
    }

    #[test]
    fn edit_without_old_data_does_not_support_time_travel() {
        let entry = entry_with(LogPayload::ElementEdited {
            old_data: None,
            changed_fields: vec!["name".to_owned()],
        });
        assert!(!entry.supports_time_travel());
    }

    #[test]
    fn collection_removal_always_supports_time_travel() {
        let entry = entry_with(LogPayload::CollectionElementDeleted {
            collection_name: "attachments".to_owned(),
            element_type: TargetType::Attachment,
            element_id: uuid::Uuid::new_v4(),
            old_name: None,
            old_data: None,
        });
        assert!(entry.supports_time_travel());
    }

    #[test]
    fn stock_change_does_not_support_time_travel() {
        let entry = entry_with(LogPayload::PartStockChanged {
            change_type: super::StockChangeType::Withdraw,
            old_stock: 10.0,
            new_stock: 4.0,
            comment: None,
            move_to: None,
        });
        assert!(!entry.supports_time_travel());
    }
}
