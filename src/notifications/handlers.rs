// src/notifications/handlers.rs

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::{Notification, NotificationListQuery};
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

async fn fetch_owned_notification(
    db: &SqlitePool,
    authed: &AuthedUser,
    notification_id: &str,
) -> Result<Notification, ApiError> {
    let notification =
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
            .bind(notification_id)
            .fetch_optional(db)
            .await
            .map_err(|e| {
                error!(error = %e, notification_id = %notification_id, "Database error fetching notification");
                ApiError::DatabaseError(e)
            })?
            .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    if notification.user_id != authed.id {
        warn!(
            user_id = %authed.id,
            notification_id = %notification_id,
            "Notification access denied: not the recipient"
        );
        return Err(ApiError::Forbidden(
            "You do not have access to this notification".to_string(),
        ));
    }

    Ok(notification)
}

/// GET /api/notifications - Newest first, optionally unread only
pub async fn list_notifications(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let state = state_lock.read().await.clone();

    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE user_id = ? AND (? = 0 OR is_read = 0)
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(&authed.id)
    .bind(query.unread_only)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error listing notifications");
        ApiError::DatabaseError(e)
    })?;

    debug!(
        user_id = %authed.id,
        notification_count = notifications.len(),
        unread_only = query.unread_only,
        "Notifications listed"
    );

    Ok(Json(notifications))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
    )
    .bind(&authed.id)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(json!({ "count": count })))
}

/// PUT /api/notifications/:id/read
pub async fn mark_read(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let state = state_lock.read().await.clone();

    let mut notification = fetch_owned_notification(&state.db, &authed, &notification_id).await?;

    if !notification.is_read {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(&notification_id)
            .bind(&authed.id)
            .execute(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;
        notification.is_read = true;
    }

    Ok(Json(notification))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let result =
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
            .bind(&authed.id)
            .execute(&state.db)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %authed.id, "Database error marking notifications read");
                ApiError::DatabaseError(e)
            })?;

    info!(
        user_id = %authed.id,
        updated = result.rows_affected(),
        "Notifications marked read"
    );

    Ok(Json(json!({ "updated": result.rows_affected() })))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(notification_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    fetch_owned_notification(&state.db, &authed, &notification_id).await?;

    sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(&notification_id)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    debug!(user_id = %authed.id, notification_id = %notification_id, "Notification deleted");

    Ok(StatusCode::NO_CONTENT)
}
