// src/providers/handlers.rs

use axum::extract::{Extension, Json, Path, Query};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::{
    AdminProviderQuery, ProviderListQuery, ProviderProfile, ProviderSummary,
    VerificationDecisionRequest, VerificationInfo,
};
use crate::auth::AuthedUser;
use crate::catalog::handlers::fetch_public_services;
use crate::common::{ApiError, AppState, JsonBody};
use crate::services::verification::VerificationDecision;
use crate::users::fetch_user;
use crate::users::models::{User, UserType, VerificationStatus};

const PROVIDER_SUMMARY_SELECT: &str = r#"
    SELECT u.id, u.name, u.business_name, u.bio, u.is_verified,
           u.verification_status, u.verified_at,
           COALESCE(AVG(r.rating), 0.0) AS average_rating,
           COUNT(r.id) AS review_count
    FROM users u
    LEFT JOIN reviews r ON r.provider_id = u.id
    WHERE u.user_type = 'provider' AND u.verification_status = 'approved'
"#;

/// GET /api/providers - Approved providers, optionally offering a category
pub async fn list_providers(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<ProviderListQuery>,
) -> Result<Json<Vec<ProviderSummary>>, ApiError> {
    let state = state_lock.read().await.clone();

    let category = query.category.as_deref().map(|c| c.trim().to_lowercase());

    let sql = format!(
        r#"{}
          AND (? IS NULL OR EXISTS (
                SELECT 1 FROM services s
                WHERE s.provider_id = u.id AND s.is_active = 1 AND s.category = ?))
        GROUP BY u.id
        ORDER BY average_rating DESC, u.name ASC
        "#,
        PROVIDER_SUMMARY_SELECT
    );

    let providers = sqlx::query_as::<_, ProviderSummary>(&sql)
        .bind(category.as_deref())
        .bind(category.as_deref())
        .fetch_all(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error listing providers");
            ApiError::DatabaseError(e)
        })?;

    debug!(provider_count = providers.len(), "Approved providers listed");

    Ok(Json(providers))
}

/// GET /api/providers/:id - Public profile of an approved provider
pub async fn get_provider(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(provider_id): Path<String>,
) -> Result<Json<ProviderProfile>, ApiError> {
    let state = state_lock.read().await.clone();

    let sql = format!("{} AND u.id = ? GROUP BY u.id", PROVIDER_SUMMARY_SELECT);
    let provider = sqlx::query_as::<_, ProviderSummary>(&sql)
        .bind(&provider_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, provider_id = %provider_id, "Database error fetching provider");
            ApiError::DatabaseError(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Provider not found".to_string()))?;

    let services = fetch_public_services(&state.db, None, Some(&provider_id)).await?;

    Ok(Json(ProviderProfile { provider, services }))
}

/// GET /api/providers/me/verification
pub async fn get_my_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<VerificationInfo>, ApiError> {
    authed.require_role(UserType::Provider)?;
    let state = state_lock.read().await.clone();

    let user = fetch_user(&state.db, &authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(VerificationInfo::from(&user)))
}

/// POST /api/providers/me/verification - Resubmit after a rejection
pub async fn resubmit_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<VerificationInfo>, ApiError> {
    authed.require_role(UserType::Provider)?;
    let state = state_lock.read().await.clone();

    let user = state.verification_service.resubmit(&authed.id).await?;

    Ok(Json(VerificationInfo::from(&user)))
}

/// GET /api/admin/providers - Providers filtered by verification status
pub async fn list_providers_for_review(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<AdminProviderQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let status = match query.status.as_deref() {
        Some(raw) => Some(VerificationStatus::parse(raw).ok_or_else(|| {
            ApiError::BadRequest("status must be pending, approved or rejected".to_string())
        })?),
        None => None,
    };

    let providers = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE user_type = 'provider' AND (? IS NULL OR verification_status = ?)
        ORDER BY created_at ASC
        "#,
    )
    .bind(status)
    .bind(status)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, "Database error listing providers for review");
        ApiError::DatabaseError(e)
    })?;

    Ok(Json(providers))
}

/// POST /api/admin/providers/:id/verification - Approve or reject a provider
///
/// # Request Body
/// ```json
/// { "status": "rejected", "rejectionReason": "ID document unreadable" }
/// ```
pub async fn decide_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(provider_id): Path<String>,
    JsonBody(request): JsonBody<VerificationDecisionRequest>,
) -> Result<Json<User>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    if request.status.trim().is_empty() {
        return Err(ApiError::BadRequest("status is required".to_string()));
    }

    let decision = match VerificationStatus::parse(&request.status) {
        Some(VerificationStatus::Approved) => VerificationDecision::Approve,
        Some(VerificationStatus::Rejected) => {
            let reason = request
                .rejection_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    warn!(provider_id = %provider_id, "Rejection without a reason refused");
                    ApiError::BadRequest("rejectionReason is required when rejecting".to_string())
                })?;
            VerificationDecision::Reject {
                reason: reason.to_string(),
            }
        }
        _ => {
            return Err(ApiError::BadRequest(
                "status must be approved or rejected".to_string(),
            ))
        }
    };

    info!(
        admin_user_id = %authed.id,
        provider_id = %provider_id,
        decision = ?decision,
        "Deciding provider verification"
    );

    let user = state
        .verification_service
        .decide(&provider_id, decision, &authed.id)
        .await?;

    Ok(Json(user))
}
