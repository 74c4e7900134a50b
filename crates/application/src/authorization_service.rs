use std::sync::Arc;

use async_trait::async_trait;
use partledger_core::{AppError, AppResult};
use partledger_domain::{Capability, TargetType};

/// Capability grant row resolved for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityGrant {
    /// Granted capability.
    pub capability: Capability,
    /// Target type scope, `None` covers every target type.
    pub target_type: Option<TargetType>,
}

/// Repository port for capability lookups.
#[async_trait]
pub trait CapabilityRepository: Send + Sync {
    /// Lists effective capability grants for a subject.
    async fn list_grants_for_subject(&self, subject: &str) -> AppResult<Vec<CapabilityGrant>>;
}

/// Application service for authorization checks.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn CapabilityRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn CapabilityRepository>) -> Self {
        Self { repository }
    }

    /// Returns whether the subject currently holds the capability.
    ///
    /// A grant without a target type scope covers any requested scope. A
    /// scoped check is also satisfied by a grant scoped to the same type; an
    /// unscoped check is only satisfied by an unscoped grant.
    pub async fn is_granted(
        &self,
        subject: &str,
        capability: Capability,
        target_type: Option<TargetType>,
    ) -> AppResult<bool> {
        let grants = self.repository.list_grants_for_subject(subject).await?;

        Ok(grants.iter().any(|grant| {
            grant.capability == capability
                && match grant.target_type {
                    None => true,
                    Some(scope) => target_type == Some(scope),
                }
        }))
    }

    /// Ensures a subject holds the required capability.
    pub async fn require(
        &self,
        subject: &str,
        capability: Capability,
        target_type: Option<TargetType>,
    ) -> AppResult<()> {
        if self.is_granted(subject, capability, target_type).await? {
            return Ok(());
        }

        let scope = target_type
            .map(|value| format!(" for target type '{}'", value.as_str()))
            .unwrap_or_default();
        Err(AppError::Forbidden(format!(
            "subject '{subject}' is missing capability '{}'{scope}",
            capability.as_str()
        )))
    }
}
