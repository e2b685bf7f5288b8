//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::Claims;
use crate::common::{safe_email_log, ApiError, AppState};
use crate::users::models::{User, UserType};

/// Authenticated user extractor
///
/// Validates the bearer JWT and loads the user row; the role comes from the
/// database, not from the token.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub user_type: UserType,
    pub is_admin: bool,
}

impl AuthedUser {
    pub fn is_provider(&self) -> bool {
        self.user_type == UserType::Provider
    }

    /// Fails with 403 unless the caller is an admin
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            warn!(user_id = %self.id, "Admin privileges required");
            Err(ApiError::Forbidden("Admin privileges required".to_string()))
        }
    }

    /// Fails with 403 unless the caller has the given role
    pub fn require_role(&self, user_type: UserType) -> Result<(), ApiError> {
        if self.user_type == user_type {
            Ok(())
        } else {
            warn!(
                user_id = %self.id,
                required = user_type.as_str(),
                actual = self.user_type.as_str(),
                "Role check failed"
            );
            Err(ApiError::Forbidden(format!(
                "Only {} accounts can perform this action",
                user_type.as_str()
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = match parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        {
            Some(t) => t.to_string(),
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = token.strip_prefix("Bearer ").unwrap_or(&token);

        let decoded = match decode::<Claims>(
            bare_token,
            &DecodingKey::from_secret(app_state.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "JWT token validation failed");
                return Err(ApiError::Unauthorized("invalid token".into()));
            }
        };

        let user_id = decoded.claims.sub;

        let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_optional(&app_state.db)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    user_id = %user_id,
                    "Database error during user lookup in authentication"
                );
                ApiError::DatabaseError(e)
            })?;

        match user {
            Some(u) => {
                let is_admin = u.is_admin();
                debug!(
                    user_id = %u.id,
                    email = %safe_email_log(&u.email),
                    user_type = u.user_type.as_str(),
                    "User authentication successful via extractor"
                );
                Ok(AuthedUser {
                    id: u.id,
                    email: u.email,
                    user_type: u.user_type,
                    is_admin,
                })
            }
            None => {
                warn!(user_id = %user_id, "Authentication failed: user not found in database");
                Err(ApiError::Unauthorized("user not found".into()))
            }
        }
    }
}
