//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod attachment;
mod display;
mod log;
mod security;
mod target;
mod user;

pub use attachment::{BUILTIN_PLACEHOLDERS, validate_url_or_builtin};
pub use display::{RowStyle, UserDisplay, row_style, severity_icon, user_display};
pub use log::{LogEntry, LogEntryId, LogEntryKind, LogLevel, LogPayload, StockChangeType};
pub use security::Capability;
pub use target::{TargetRef, TargetType};
pub use user::{UserId, UserSummary};
