// src/catalog/handlers.rs

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::{CreateServiceRequest, Service, ServiceListQuery, UpdateServiceRequest};
use super::validators::ServiceValidator;
use crate::auth::AuthedUser;
use crate::common::{generate_service_id, ApiError, AppState, JsonBody, Validator};
use crate::users::models::UserType;

/// Loads a service row by id regardless of visibility
pub async fn fetch_service(db: &SqlitePool, service_id: &str) -> Result<Option<Service>, ApiError> {
    sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
        .bind(service_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, service_id = %service_id, "Database error fetching service");
            ApiError::DatabaseError(e)
        })
}

/// Active services of approved providers, optionally for one provider
pub async fn fetch_public_services(
    db: &SqlitePool,
    category: Option<&str>,
    provider_id: Option<&str>,
) -> Result<Vec<Service>, ApiError> {
    sqlx::query_as::<_, Service>(
        r#"
        SELECT s.* FROM services s
        JOIN users u ON u.id = s.provider_id
        WHERE s.is_active = 1
          AND u.user_type = 'provider'
          AND u.verification_status = 'approved'
          AND (? IS NULL OR s.category = ?)
          AND (? IS NULL OR s.provider_id = ?)
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(category)
    .bind(category)
    .bind(provider_id)
    .bind(provider_id)
    .fetch_all(db)
    .await
    .map_err(|e| {
        error!(error = %e, "Database error listing public services");
        ApiError::DatabaseError(e)
    })
}

/// Loads a service and checks the caller owns it
async fn fetch_owned_service(
    db: &SqlitePool,
    authed: &AuthedUser,
    service_id: &str,
) -> Result<Service, ApiError> {
    let service = fetch_service(db, service_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".to_string()))?;

    if service.provider_id != authed.id {
        warn!(
            user_id = %authed.id,
            service_id = %service_id,
            "Service access denied: not the owner"
        );
        return Err(ApiError::Forbidden("You do not own this service".to_string()));
    }

    Ok(service)
}

/// GET /api/services - Public catalog
pub async fn list_services(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let state = state_lock.read().await.clone();

    let category = query.category.as_deref().map(|c| c.trim().to_lowercase());
    let services = fetch_public_services(
        &state.db,
        category.as_deref(),
        query.provider_id.as_deref(),
    )
    .await?;

    debug!(service_count = services.len(), "Public services listed");

    Ok(Json(services))
}

/// GET /api/services/:id - Public service detail
pub async fn get_service(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(service_id): Path<String>,
) -> Result<Json<Service>, ApiError> {
    let state = state_lock.read().await.clone();

    let service = sqlx::query_as::<_, Service>(
        r#"
        SELECT s.* FROM services s
        JOIN users u ON u.id = s.provider_id
        WHERE s.id = ? AND s.is_active = 1 AND u.verification_status = 'approved'
        "#,
    )
    .bind(&service_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, service_id = %service_id, "Database error fetching service");
        ApiError::DatabaseError(e)
    })?
    .ok_or_else(|| ApiError::NotFound("Service not found".to_string()))?;

    Ok(Json(service))
}

/// GET /api/services/mine - The calling provider's services, inactive included
pub async fn list_my_services(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Service>>, ApiError> {
    authed.require_role(UserType::Provider)?;
    let state = state_lock.read().await.clone();

    let services = sqlx::query_as::<_, Service>(
        "SELECT * FROM services WHERE provider_id = ? ORDER BY created_at DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error listing provider services");
        ApiError::DatabaseError(e)
    })?;

    Ok(Json(services))
}

/// POST /api/services - Create a service (providers only)
pub async fn create_service(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    authed.require_role(UserType::Provider)?;
    let state = state_lock.read().await.clone();

    let validation_result = ServiceValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Service creation validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let service_id = generate_service_id();

    sqlx::query(
        r#"
        INSERT INTO services (id, provider_id, title, description, category, price,
                              duration_minutes, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&service_id)
    .bind(&authed.id)
    .bind(request.title.trim())
    .bind(request.description.as_deref())
    .bind(request.category.trim().to_lowercase())
    .bind(request.price.unwrap_or_default())
    .bind(request.duration_minutes)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            user_id = %authed.id,
            service_id = %service_id,
            "Database error creating service"
        );
        ApiError::DatabaseError(e)
    })?;

    let service = fetch_service(&state.db, &service_id)
        .await?
        .ok_or_else(|| ApiError::InternalServer("created service not found".to_string()))?;

    info!(
        user_id = %authed.id,
        service_id = %service_id,
        category = %service.category,
        "Service created successfully"
    );

    Ok((StatusCode::CREATED, Json(service)))
}

/// PUT /api/services/:id - Update an owned service
pub async fn update_service(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(service_id): Path<String>,
    JsonBody(request): JsonBody<UpdateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = ServiceValidator.validate(&request);
    if !validation_result.is_valid {
        return Err(ApiError::from(validation_result));
    }

    fetch_owned_service(&state.db, &authed, &service_id).await?;

    sqlx::query(
        r#"
        UPDATE services
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            category = COALESCE(?, category),
            price = COALESCE(?, price),
            duration_minutes = COALESCE(?, duration_minutes),
            is_active = COALESCE(?, is_active),
            updated_at = datetime('now')
        WHERE id = ? AND provider_id = ?
        "#,
    )
    .bind(request.title.as_deref().map(str::trim))
    .bind(request.description.as_deref())
    .bind(request.category.as_deref().map(|c| c.trim().to_lowercase()))
    .bind(request.price)
    .bind(request.duration_minutes)
    .bind(request.is_active)
    .bind(&service_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, service_id = %service_id, "Database error updating service");
        ApiError::DatabaseError(e)
    })?;

    let service = fetch_service(&state.db, &service_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".to_string()))?;

    info!(user_id = %authed.id, service_id = %service_id, "Service updated successfully");

    Ok(Json(service))
}

/// DELETE /api/services/:id - Delete an owned service, or deactivate it if it was ever booked
pub async fn delete_service(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(service_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    fetch_owned_service(&state.db, &authed, &service_id).await?;

    let booking_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE service_id = ?")
            .bind(&service_id)
            .fetch_one(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    if booking_count > 0 {
        sqlx::query(
            "UPDATE services SET is_active = 0, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&service_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(
            service_id = %service_id,
            booking_count = booking_count,
            "Service has bookings, deactivated instead of deleted"
        );
    } else {
        sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(&service_id)
            .execute(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(service_id = %service_id, "Service deleted");
    }

    Ok(StatusCode::NO_CONTENT)
}
