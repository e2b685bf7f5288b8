// src/bookings/handlers.rs

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::{
    Booking, BookingListQuery, BookingStatus, CreateBookingRequest, UpdateBookingStatusRequest,
};
use super::validators::BookingValidator;
use crate::auth::AuthedUser;
use crate::catalog::handlers::fetch_service;
use crate::common::{generate_booking_id, ApiError, AppState, JsonBody, Validator};
use crate::notifications::models::NotificationKind;
use crate::users::fetch_user;
use crate::users::models::UserType;

pub async fn fetch_booking(db: &SqlitePool, booking_id: &str) -> Result<Option<Booking>, ApiError> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(booking_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, booking_id = %booking_id, "Database error fetching booking");
            ApiError::DatabaseError(e)
        })
}

/// Loads a booking the caller takes part in (or any booking for an admin)
pub async fn fetch_visible_booking(
    db: &SqlitePool,
    authed: &AuthedUser,
    booking_id: &str,
) -> Result<Booking, ApiError> {
    let booking = fetch_booking(db, booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    if !authed.is_admin && !booking.is_participant(&authed.id) {
        warn!(
            user_id = %authed.id,
            booking_id = %booking_id,
            "Booking access denied: not a participant"
        );
        return Err(ApiError::Forbidden(
            "You do not have access to this booking".to_string(),
        ));
    }

    Ok(booking)
}

/// POST /api/bookings - Customer books an active service of an approved provider
pub async fn create_booking(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let state = state_lock.read().await.clone();

    authed.require_role(UserType::Customer)?;

    let validation_result = BookingValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Booking validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let service = fetch_service(&state.db, request.service_id.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".to_string()))?;

    if !service.is_active {
        return Err(ApiError::BadRequest(
            "This service is not available for booking".to_string(),
        ));
    }

    let provider_ok = fetch_user(&state.db, &service.provider_id)
        .await?
        .map(|provider| provider.is_approved_provider())
        .unwrap_or(false);
    if !provider_ok {
        warn!(
            service_id = %service.id,
            provider_id = %service.provider_id,
            "Booking refused: provider is not approved"
        );
        return Err(ApiError::BadRequest(
            "This provider is not accepting bookings".to_string(),
        ));
    }

    if let Some(address_id) = request.address_id.as_deref().map(str::trim) {
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM addresses WHERE id = ? AND user_id = ?",
        )
        .bind(address_id)
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        if owned == 0 {
            return Err(ApiError::BadRequest(
                "addressId does not refer to one of your addresses".to_string(),
            ));
        }
    }

    // Normalized to UTC
    let scheduled_at = DateTime::parse_from_rfc3339(request.scheduled_at.trim())
        .map_err(|_| ApiError::BadRequest("scheduledAt must be an RFC 3339 timestamp".to_string()))?
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let booking_id = generate_booking_id();

    sqlx::query(
        r#"
        INSERT INTO bookings (id, customer_id, provider_id, service_id, address_id, scheduled_at,
                              notes, total_amount, status, payment_status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', 'unpaid', datetime('now'), datetime('now'))
        "#,
    )
    .bind(&booking_id)
    .bind(&authed.id)
    .bind(&service.provider_id)
    .bind(&service.id)
    .bind(request.address_id.as_deref().map(str::trim))
    .bind(&scheduled_at)
    .bind(request.notes.as_deref().map(str::trim))
    .bind(service.price)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error creating booking");
        ApiError::DatabaseError(e)
    })?;

    let booking = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::InternalServer("Booking vanished after insert".to_string()))?;

    info!(
        booking_id = %booking.id,
        customer_id = %authed.id,
        provider_id = %booking.provider_id,
        service_id = %booking.service_id,
        "Booking created"
    );

    state
        .notification_service
        .notify(
            &booking.provider_id,
            NotificationKind::BookingCreated,
            "New booking",
            &format!("{} was booked for {}.", service.title, booking.scheduled_at),
        )
        .await;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings - Bookings the caller takes part in; admins see all
pub async fn list_bookings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let state = state_lock.read().await.clone();

    let status = match query.status.as_deref() {
        Some(raw) => Some(BookingStatus::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown booking status: {}", raw))
        })?),
        None => None,
    };
    let status = status.map(|s| s.as_str());
    let scope = if authed.is_admin { None } else { Some(authed.id.as_str()) };

    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT * FROM bookings
        WHERE (? IS NULL OR customer_id = ? OR provider_id = ?)
          AND (? IS NULL OR status = ?)
        ORDER BY created_at DESC
        "#,
    )
    .bind(scope)
    .bind(scope)
    .bind(scope)
    .bind(status)
    .bind(status)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error listing bookings");
        ApiError::DatabaseError(e)
    })?;

    debug!(user_id = %authed.id, booking_count = bookings.len(), "Bookings listed");

    Ok(Json(bookings))
}

/// GET /api/bookings/:id
pub async fn get_booking(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let state = state_lock.read().await.clone();

    let booking = fetch_visible_booking(&state.db, &authed, &booking_id).await?;

    Ok(Json(booking))
}

/// PUT /api/bookings/:id/status
pub async fn update_booking_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(booking_id): Path<String>,
    JsonBody(request): JsonBody<UpdateBookingStatusRequest>,
) -> Result<Json<Booking>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = BookingValidator.validate(&request);
    if !validation_result.is_valid {
        return Err(ApiError::from(validation_result));
    }
    let next = BookingStatus::parse(&request.status)
        .ok_or_else(|| ApiError::BadRequest("Unknown booking status".to_string()))?;

    let booking = fetch_visible_booking(&state.db, &authed, &booking_id).await?;

    // The actor role is decided by the caller's relation to this booking
    let actor = if authed.is_admin {
        UserType::Admin
    } else if booking.provider_id == authed.id {
        UserType::Provider
    } else {
        UserType::Customer
    };

    if !booking.status.can_transition(next, actor) {
        warn!(
            user_id = %authed.id,
            booking_id = %booking_id,
            from = booking.status.as_str(),
            to = next.as_str(),
            "Booking status transition refused"
        );
        return Err(ApiError::BadRequest(format!(
            "Cannot change booking status from {} to {}",
            booking.status.as_str(),
            next.as_str()
        )));
    }

    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = ?, updated_at = datetime('now')
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(next)
    .bind(&booking_id)
    .bind(booking.status)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, booking_id = %booking_id, "Database error updating booking status");
        ApiError::DatabaseError(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::BadRequest(
            "Booking status changed concurrently, reload and retry".to_string(),
        ));
    }

    let updated = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    info!(
        booking_id = %booking_id,
        user_id = %authed.id,
        from = booking.status.as_str(),
        to = next.as_str(),
        "Booking status updated"
    );

    let message = format!("Booking {} is now {}.", booking_id, next.as_str());
    let mut recipients = Vec::new();
    if authed.id != booking.customer_id {
        recipients.push(&booking.customer_id);
    }
    if authed.id != booking.provider_id {
        recipients.push(&booking.provider_id);
    }
    for recipient in recipients {
        state
            .notification_service
            .notify(
                recipient,
                NotificationKind::BookingStatusChanged,
                "Booking updated",
                &message,
            )
            .await;
    }

    Ok(Json(updated))
}
