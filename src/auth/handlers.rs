//! Authentication handlers

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::extractors::AuthedUser;
use super::models::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use super::validators::{LoginValidator, RegisterValidator};
use crate::common::error::is_unique_violation;
use crate::common::helpers::normalize_email;
use crate::common::{generate_user_id, safe_email_log, ApiError, AppState, JsonBody, Validator};
use crate::users::models::{User, UserType, VerificationStatus};
use crate::users::fetch_user;

/// Signs an HS256 token for `user_id` valid for `ttl_hours`
pub fn issue_token(secret: &str, user_id: &str, ttl_hours: i64) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "Failed to sign JWT");
        ApiError::InternalServer("failed to issue token".to_string())
    })
}

async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::InternalServer(format!("password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::InternalServer(format!("password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::InternalServer(format!("password check task failed: {}", e)))?
        .map_err(|e| ApiError::InternalServer(format!("password check failed: {}", e)))
}

/// POST /api/auth/register
/// Creates a customer or provider account and returns a token
///
/// # Request Body
/// ```json
/// {
///   "email": "jane@example.com",
///   "password": "secret123",
///   "name": "Jane",
///   "userType": "provider",
///   "businessName": "Jane's Plumbing"
/// }
/// ```
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = RegisterValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            errors = ?validation_result.errors,
            "Registration validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let email = normalize_email(&request.email);
    info!(email = %safe_email_log(&email), user_type = %request.user_type, "Registering user");

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error checking email uniqueness");
            ApiError::DatabaseError(e)
        })?;

    if existing > 0 {
        warn!(email = %safe_email_log(&email), "Registration rejected: email already in use");
        return Err(ApiError::BadRequest("Email is already registered".to_string()));
    }

    // Validator guarantees a customer or provider here; configured admin emails are promoted
    let requested_type = UserType::parse(&request.user_type).unwrap_or(UserType::Customer);
    let user_type = if state.admin_emails.contains(&email) {
        info!(email = %safe_email_log(&email), "Email listed in ADMIN_EMAILS, registering as admin");
        UserType::Admin
    } else {
        requested_type
    };

    let verification_status = match user_type {
        UserType::Provider => Some(VerificationStatus::Pending),
        _ => None,
    };
    let business_name = match user_type {
        UserType::Provider => request.business_name.as_deref().map(str::trim),
        _ => None,
    };

    let password_hash = hash_password(request.password.clone(), state.bcrypt_cost).await?;
    let user_id = generate_user_id();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, name, phone, user_type, business_name,
                           is_verified, verification_status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(request.name.trim())
    .bind(request.phone.as_deref().map(str::trim))
    .bind(user_type)
    .bind(business_name)
    .bind(verification_status)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            warn!(email = %safe_email_log(&email), "Registration lost a race on the same email");
            return ApiError::BadRequest("Email is already registered".to_string());
        }
        error!(error = %e, user_id = %user_id, "Database error creating user");
        ApiError::DatabaseError(e)
    })?;

    let user = fetch_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::InternalServer("created user not found".to_string()))?;
    let token = issue_token(&state.jwt_secret, &user.id, state.jwt_ttl_hours)?;

    info!(
        user_id = %user.id,
        user_type = user.user_type.as_str(),
        "User registered successfully"
    );

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/auth/login
/// Exchanges email and password for a token
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = LoginValidator.validate(&request);
    if !validation_result.is_valid {
        return Err(ApiError::from(validation_result));
    }

    let email = normalize_email(&request.email);
    debug!(email = %safe_email_log(&email), "Login attempt");

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error during login lookup");
            ApiError::DatabaseError(e)
        })?;

    let Some(user) = user else {
        warn!(email = %safe_email_log(&email), "Login failed: unknown email");
        return Err(ApiError::Unauthorized("invalid email or password".to_string()));
    };

    if !verify_password(request.password.clone(), user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized("invalid email or password".to_string()));
    }

    let token = issue_token(&state.jwt_secret, &user.id, state.jwt_ttl_hours)?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/logout
/// Tokens are stateless; the client discards its copy
pub async fn logout_handler(authed: AuthedUser) -> Json<serde_json::Value> {
    info!(user_id = %authed.id, email = %safe_email_log(&authed.email), "User logged out");
    Json(serde_json::json!({ "message": "logged out" }))
}

/// GET /api/me
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<User>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = fetch_user(&state.db, &authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
