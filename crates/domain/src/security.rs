use std::str::FromStr;

use partledger_core::AppError;
use serde::{Deserialize, Serialize};

/// Capabilities enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Allows reading the system wide log grid.
    LogShow,
    /// Allows reading the change history of an element.
    LogShowHistory,
    /// Allows reverting an element to a logged state.
    LogRevertElement,
}

impl Capability {
    /// Returns a stable storage value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogShow => "log.show",
            Self::LogShowHistory => "log.show_history",
            Self::LogRevertElement => "log.revert_element",
        }
    }

    /// Returns all known capabilities.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Capability] = &[
            Capability::LogShow,
            Capability::LogShowHistory,
            Capability::LogRevertElement,
        ];

        ALL
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "log.show" => Ok(Self::LogShow),
            "log.show_history" => Ok(Self::LogShowHistory),
            "log.revert_element" => Ok(Self::LogRevertElement),
            _ => Err(AppError::Validation(format!(
                "unknown capability value '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Capability;

    #[test]
    fn capability_roundtrip_storage_value() {
        for capability in Capability::all() {
            let restored = Capability::from_str(capability.as_str());
            assert!(matches!(restored, Ok(value) if value == *capability));
        }
    }

    #[test]
    fn unknown_capability_is_rejected() {
        let parsed = Capability::from_str("log.purge");
        assert!(parsed.is_err());
    }
}
