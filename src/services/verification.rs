// src/services/verification.rs
//! Provider verification state machine: `pending -> approved | rejected`

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::notifications::NotificationService;
use crate::common::helpers::now_rfc3339;
use crate::common::ApiError;
use crate::notifications::models::NotificationKind;
use crate::users::models::{User, VerificationStatus};

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User {0} is not a provider")]
    NotProvider(String),

    #[error("Cannot change verification status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("A rejection reason is required")]
    MissingReason,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<VerificationError> for ApiError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::NotFound(_) => ApiError::NotFound(e.to_string()),
            VerificationError::NotProvider(_)
            | VerificationError::InvalidTransition { .. }
            | VerificationError::MissingReason => ApiError::BadRequest(e.to_string()),
            VerificationError::DatabaseError(db) => ApiError::DatabaseError(db),
        }
    }
}

/// Admin decision on a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationDecision {
    Approve,
    Reject { reason: String },
}

impl VerificationDecision {
    pub fn target_status(&self) -> VerificationStatus {
        match self {
            VerificationDecision::Approve => VerificationStatus::Approved,
            VerificationDecision::Reject { .. } => VerificationStatus::Rejected,
        }
    }
}

/// Checks that `current -> next` is legal, returning `next`
pub fn plan_transition(
    current: VerificationStatus,
    next: VerificationStatus,
) -> Result<VerificationStatus, VerificationError> {
    if current.can_transition_to(next) {
        Ok(next)
    } else {
        Err(VerificationError::InvalidTransition {
            from: current.as_str().to_string(),
            to: next.as_str().to_string(),
        })
    }
}

#[derive(Debug)]
pub struct VerificationService {
    db_pool: SqlitePool,
    notifications: Arc<NotificationService>,
}

impl VerificationService {
    pub fn new(db_pool: SqlitePool, notifications: Arc<NotificationService>) -> Self {
        Self {
            db_pool,
            notifications,
        }
    }

    async fn load_provider(
        &self,
        provider_id: &str,
    ) -> Result<(User, VerificationStatus), VerificationError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(provider_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| VerificationError::NotFound(provider_id.to_string()))?;

        if !user.is_provider() {
            return Err(VerificationError::NotProvider(provider_id.to_string()));
        }

        let current = user
            .verification_status
            .unwrap_or(VerificationStatus::Pending);
        Ok((user, current))
    }

    /// Apply an admin decision to a provider and notify them
    pub async fn decide(
        &self,
        provider_id: &str,
        decision: VerificationDecision,
        admin_id: &str,
    ) -> Result<User, VerificationError> {
        if let VerificationDecision::Reject { reason } = &decision {
            if reason.trim().is_empty() {
                return Err(VerificationError::MissingReason);
            }
        }

        let (_, current) = self.load_provider(provider_id).await?;
        let next = plan_transition(current, decision.target_status())?;

        let (is_verified, verified_at, rejection_reason) = match &decision {
            VerificationDecision::Approve => (true, Some(now_rfc3339()), None),
            VerificationDecision::Reject { reason } => {
                (false, None, Some(reason.trim().to_string()))
            }
        };

        // Conditional on the status read above
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verification_status = ?,
                is_verified = ?,
                verified_at = ?,
                rejection_reason = ?,
                updated_at = datetime('now')
            WHERE id = ? AND user_type = 'provider'
              AND COALESCE(verification_status, 'pending') = ?
            "#,
        )
        .bind(next)
        .bind(is_verified)
        .bind(verified_at)
        .bind(rejection_reason.as_deref())
        .bind(provider_id)
        .bind(current)
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(
                provider_id = %provider_id,
                "Verification status changed concurrently, decision not applied"
            );
            return Err(VerificationError::InvalidTransition {
                from: current.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        info!(
            provider_id = %provider_id,
            admin_id = %admin_id,
            from = current.as_str(),
            to = next.as_str(),
            "Provider verification decided"
        );

        match &decision {
            VerificationDecision::Approve => {
                self.notifications
                    .notify(
                        provider_id,
                        NotificationKind::VerificationApproved,
                        "Account verified",
                        "Your provider account has been approved. Your services are now visible to customers.",
                    )
                    .await
            }
            VerificationDecision::Reject { reason } => {
                self.notifications
                    .notify(
                        provider_id,
                        NotificationKind::VerificationRejected,
                        "Verification rejected",
                        &format!("Your verification was rejected: {}", reason.trim()),
                    )
                    .await
            }
        }

        self.reload(provider_id).await
    }

    /// Provider resubmits after a rejection: `rejected -> pending`
    pub async fn resubmit(&self, provider_id: &str) -> Result<User, VerificationError> {
        let (_, current) = self.load_provider(provider_id).await?;
        let next = plan_transition(current, VerificationStatus::Pending)?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET verification_status = ?,
                is_verified = 0,
                verified_at = NULL,
                rejection_reason = NULL,
                updated_at = datetime('now')
            WHERE id = ? AND verification_status = ?
            "#,
        )
        .bind(next)
        .bind(provider_id)
        .bind(current)
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(VerificationError::InvalidTransition {
                from: current.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        info!(provider_id = %provider_id, "Provider resubmitted verification");

        self.notifications
            .notify(
                provider_id,
                NotificationKind::VerificationResubmitted,
                "Verification resubmitted",
                "Your account is back in the review queue.",
            )
            .await;

        self.reload(provider_id).await
    }

    async fn reload(&self, provider_id: &str) -> Result<User, VerificationError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(provider_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| VerificationError::NotFound(provider_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::models::VerificationStatus::*;

    #[test]
    fn test_pending_can_be_decided_either_way() {
        assert_eq!(plan_transition(Pending, Approved).unwrap(), Approved);
        assert_eq!(plan_transition(Pending, Rejected).unwrap(), Rejected);
    }

    #[test]
    fn test_same_state_decision_is_rejected() {
        assert!(matches!(
            plan_transition(Approved, Approved),
            Err(VerificationError::InvalidTransition { .. })
        ));
        assert!(plan_transition(Rejected, Rejected).is_err());
    }

    #[test]
    fn test_resubmission_only_after_rejection() {
        assert_eq!(plan_transition(Rejected, Pending).unwrap(), Pending);
        assert!(plan_transition(Approved, Pending).is_err());
        assert!(plan_transition(Pending, Pending).is_err());
    }

    #[test]
    fn test_revocation_and_reconsideration() {
        assert!(plan_transition(Approved, Rejected).is_ok());
        assert!(plan_transition(Rejected, Approved).is_ok());
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(VerificationDecision::Approve.target_status(), Approved);
        assert_eq!(
            VerificationDecision::Reject {
                reason: "blurry id".into()
            }
            .target_status(),
            Rejected
        );
    }

    #[test]
    fn test_error_mapping() {
        let err: ApiError = VerificationError::MissingReason.into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = VerificationError::NotFound("U_1".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
