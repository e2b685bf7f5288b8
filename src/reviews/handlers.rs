// src/reviews/handlers.rs

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{CreateReviewRequest, Review};
use super::validators::ReviewValidator;
use crate::auth::AuthedUser;
use crate::bookings::fetch_booking;
use crate::bookings::models::BookingStatus;
use crate::common::error::is_unique_violation;
use crate::common::{generate_review_id, ApiError, AppState, JsonBody, Validator};
use crate::notifications::models::NotificationKind;

/// POST /api/reviews - Review a completed booking (the booking's customer only)
pub async fn create_review(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = ReviewValidator.validate(&request);
    if !validation_result.is_valid {
        return Err(ApiError::from(validation_result));
    }

    let booking = fetch_booking(&state.db, request.booking_id.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    if booking.customer_id != authed.id {
        warn!(
            user_id = %authed.id,
            booking_id = %booking.id,
            "Review refused: caller is not the booking's customer"
        );
        return Err(ApiError::Forbidden(
            "Only the customer of this booking can review it".to_string(),
        ));
    }

    if booking.status != BookingStatus::Completed {
        return Err(ApiError::BadRequest(
            "Only completed bookings can be reviewed".to_string(),
        ));
    }

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE booking_id = ?")
        .bind(&booking.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if existing > 0 {
        return Err(ApiError::BadRequest(
            "This booking has already been reviewed".to_string(),
        ));
    }

    let review_id = generate_review_id();
    let rating = request.rating.unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO reviews (id, booking_id, customer_id, provider_id, rating, comment, created_at)
        VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&review_id)
    .bind(&booking.id)
    .bind(&authed.id)
    .bind(&booking.provider_id)
    .bind(rating)
    .bind(request.comment.as_deref().map(str::trim))
    .execute(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            warn!(booking_id = %booking.id, "Concurrent review of the same booking refused");
            return ApiError::BadRequest("This booking has already been reviewed".to_string());
        }
        error!(error = %e, booking_id = %booking.id, "Database error creating review");
        ApiError::DatabaseError(e)
    })?;

    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
        .bind(&review_id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        review_id = %review_id,
        booking_id = %booking.id,
        provider_id = %booking.provider_id,
        rating = rating,
        "Review created"
    );

    state
        .notification_service
        .notify(
            &booking.provider_id,
            NotificationKind::ReviewReceived,
            "New review",
            &format!("You received a {}-star review.", rating),
        )
        .await;

    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/providers/:id/reviews - Public reviews of a provider
pub async fn list_provider_reviews(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let state = state_lock.read().await.clone();

    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE provider_id = ? ORDER BY created_at DESC",
    )
    .bind(&provider_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, provider_id = %provider_id, "Database error listing reviews");
        ApiError::DatabaseError(e)
    })?;

    Ok(Json(reviews))
}

/// DELETE /api/reviews/:id - Author or admin
pub async fn delete_review(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(review_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
        .bind(&review_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    if review.customer_id != authed.id && !authed.is_admin {
        return Err(ApiError::Forbidden("You cannot delete this review".to_string()));
    }

    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(&review_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(review_id = %review_id, user_id = %authed.id, "Review deleted");

    Ok(StatusCode::NO_CONTENT)
}
