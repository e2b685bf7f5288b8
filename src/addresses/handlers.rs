// src/addresses/handlers.rs

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::{Address, CreateAddressRequest, UpdateAddressRequest};
use super::validators::AddressValidator;
use crate::auth::AuthedUser;
use crate::common::{generate_address_id, ApiError, AppState, JsonBody, Validator};

/// Loads an address and checks the caller owns it
async fn fetch_owned_address(
    db: &SqlitePool,
    authed: &AuthedUser,
    address_id: &str,
) -> Result<Address, ApiError> {
    let address = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = ?")
        .bind(address_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, address_id = %address_id, "Database error fetching address");
            ApiError::DatabaseError(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Address not found".to_string()))?;

    if address.user_id != authed.id {
        warn!(
            user_id = %authed.id,
            address_id = %address_id,
            "Address access denied: not the owner"
        );
        return Err(ApiError::Forbidden("You do not own this address".to_string()));
    }

    Ok(address)
}

/// Make `address_id` the only default address of `user_id`
async fn make_default(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    address_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE addresses
        SET is_default = CASE WHEN id = ? THEN 1 ELSE 0 END,
            updated_at = CASE WHEN id = ? OR is_default = 1 THEN datetime('now') ELSE updated_at END
        WHERE user_id = ?
        "#,
    )
    .bind(address_id)
    .bind(address_id)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn fetch_address(db: &SqlitePool, address_id: &str) -> Result<Address, ApiError> {
    sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = ?")
        .bind(address_id)
        .fetch_one(db)
        .await
        .map_err(ApiError::DatabaseError)
}

/// GET /api/addresses - The caller's addresses, default first
pub async fn list_addresses(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Address>>, ApiError> {
    let state = state_lock.read().await.clone();

    let addresses = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = ? ORDER BY is_default DESC, created_at DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error listing addresses");
        ApiError::DatabaseError(e)
    })?;

    debug!(user_id = %authed.id, address_count = addresses.len(), "Addresses listed");

    Ok(Json(addresses))
}

/// POST /api/addresses - Add an address; the first one becomes the default
pub async fn create_address(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = AddressValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Address validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let address_id = generate_address_id();
    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM addresses WHERE user_id = ?")
        .bind(&authed.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

    sqlx::query(
        r#"
        INSERT INTO addresses (id, user_id, label, line1, line2, city, state, postal_code,
                               country, is_default, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&address_id)
    .bind(&authed.id)
    .bind(request.label.trim())
    .bind(request.line1.trim())
    .bind(request.line2.as_deref().map(str::trim))
    .bind(request.city.trim())
    .bind(request.state.as_deref().map(str::trim))
    .bind(request.postal_code.trim())
    .bind(request.country.trim())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error creating address");
        ApiError::DatabaseError(e)
    })?;

    if existing == 0 || request.is_default {
        make_default(&mut tx, &authed.id, &address_id)
            .await
            .map_err(ApiError::DatabaseError)?;
    }

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    let address = fetch_address(&state.db, &address_id).await?;

    info!(
        user_id = %authed.id,
        address_id = %address_id,
        is_default = address.is_default,
        "Address created"
    );

    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /api/addresses/:id
pub async fn update_address(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(address_id): Path<String>,
    JsonBody(request): JsonBody<UpdateAddressRequest>,
) -> Result<Json<Address>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = AddressValidator.validate(&request);
    if !validation_result.is_valid {
        return Err(ApiError::from(validation_result));
    }

    fetch_owned_address(&state.db, &authed, &address_id).await?;

    sqlx::query(
        r#"
        UPDATE addresses
        SET label = COALESCE(?, label),
            line1 = COALESCE(?, line1),
            line2 = COALESCE(?, line2),
            city = COALESCE(?, city),
            state = COALESCE(?, state),
            postal_code = COALESCE(?, postal_code),
            country = COALESCE(?, country),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(request.label.as_deref().map(str::trim))
    .bind(request.line1.as_deref().map(str::trim))
    .bind(request.line2.as_deref().map(str::trim))
    .bind(request.city.as_deref().map(str::trim))
    .bind(request.state.as_deref().map(str::trim))
    .bind(request.postal_code.as_deref().map(str::trim))
    .bind(request.country.as_deref().map(str::trim))
    .bind(&address_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, address_id = %address_id, "Database error updating address");
        ApiError::DatabaseError(e)
    })?;

    let address = fetch_address(&state.db, &address_id).await?;

    info!(user_id = %authed.id, address_id = %address_id, "Address updated");

    Ok(Json(address))
}

/// POST /api/addresses/:id/default
pub async fn set_default_address(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(address_id): Path<String>,
) -> Result<Json<Address>, ApiError> {
    let state = state_lock.read().await.clone();

    fetch_owned_address(&state.db, &authed, &address_id).await?;

    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;
    make_default(&mut tx, &authed.id, &address_id)
        .await
        .map_err(|e| {
            error!(error = %e, address_id = %address_id, "Database error setting default address");
            ApiError::DatabaseError(e)
        })?;
    tx.commit().await.map_err(ApiError::DatabaseError)?;

    let address = fetch_address(&state.db, &address_id).await?;

    info!(user_id = %authed.id, address_id = %address_id, "Default address changed");

    Ok(Json(address))
}

/// DELETE /api/addresses/:id - Deleting the default promotes the newest remaining address
pub async fn delete_address(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(address_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let address = fetch_owned_address(&state.db, &authed, &address_id).await?;

    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;

    sqlx::query("DELETE FROM addresses WHERE id = ? AND user_id = ?")
        .bind(&address_id)
        .bind(&authed.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, address_id = %address_id, "Database error deleting address");
            ApiError::DatabaseError(e)
        })?;

    if address.is_default {
        let next: Option<String> = sqlx::query_scalar(
            "SELECT id FROM addresses WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(&authed.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        if let Some(next_id) = next {
            make_default(&mut tx, &authed.id, &next_id)
                .await
                .map_err(ApiError::DatabaseError)?;
            debug!(user_id = %authed.id, address_id = %next_id, "Promoted new default address");
        }
    }

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    info!(user_id = %authed.id, address_id = %address_id, "Address deleted");

    Ok(StatusCode::NO_CONTENT)
}
