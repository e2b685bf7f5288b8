// src/users/handlers.rs

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{UpdateProfileRequest, User, UserListQuery, UserType};
use super::validators::ProfileValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, JsonBody, Validator};

/// Loads a user row by id
pub async fn fetch_user(db: &SqlitePool, user_id: &str) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Database error fetching user");
            ApiError::DatabaseError(e)
        })
}

/// PUT /api/users/me - Update the caller's profile
pub async fn update_me(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = ProfileValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Profile update validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    if !authed.is_provider() && (request.business_name.is_some() || request.bio.is_some()) {
        warn!(user_id = %authed.id, "Non-provider attempted to set provider profile fields");
        return Err(ApiError::BadRequest(
            "businessName and bio are only available to providers".to_string(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            phone = COALESCE(?, phone),
            business_name = COALESCE(?, business_name),
            bio = COALESCE(?, bio),
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(request.name.as_deref().map(str::trim))
    .bind(request.phone.as_deref().map(str::trim))
    .bind(request.business_name.as_deref().map(str::trim))
    .bind(request.bio.as_deref())
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error updating profile");
        ApiError::DatabaseError(e)
    })?;

    let user = fetch_user(&state.db, &authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %authed.id, "Profile updated successfully");

    Ok(Json(user))
}

/// GET /api/admin/users - List users, optionally filtered by role
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let users = match query.user_type.as_deref() {
        Some(raw) => {
            let user_type = UserType::parse(raw).ok_or_else(|| {
                ApiError::BadRequest("userType must be customer, provider or admin".to_string())
            })?;
            sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE user_type = ? ORDER BY created_at DESC",
            )
            .bind(user_type)
            .fetch_all(&state.db)
            .await
        }
        None => {
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
                .fetch_all(&state.db)
                .await
        }
    }
    .map_err(|e| {
        error!(error = %e, "Database error listing users");
        ApiError::DatabaseError(e)
    })?;

    info!(
        admin_user_id = %authed.id,
        user_count = users.len(),
        "User list fetched successfully"
    );

    Ok(Json(users))
}

/// GET /api/admin/users/:id
pub async fn get_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let user = fetch_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    if user_id == authed.id {
        return Err(ApiError::BadRequest("Admins cannot delete themselves".to_string()));
    }

    if fetch_user(&state.db, &user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let booking_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM bookings WHERE customer_id = ? OR provider_id = ?",
    )
    .bind(&user_id)
    .bind(&user_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, target_user_id = %user_id, "Database error counting bookings");
        ApiError::DatabaseError(e)
    })?;

    if booking_count > 0 {
        warn!(
            target_user_id = %user_id,
            booking_count = booking_count,
            "User deletion refused: user has bookings"
        );
        return Err(ApiError::BadRequest(
            "User has bookings and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&user_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, target_user_id = %user_id, "Database error deleting user");
            ApiError::DatabaseError(e)
        })?;

    info!(
        admin_user_id = %authed.id,
        target_user_id = %user_id,
        "User deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
