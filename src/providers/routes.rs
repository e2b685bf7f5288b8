// src/providers/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::reviews::handlers as reviews;

pub fn providers_routes() -> Router {
    Router::new()
        // Public listing and profiles
        .route("/api/providers", get(handlers::list_providers))
        .route("/api/providers/:id", get(handlers::get_provider))
        .route("/api/providers/:id/reviews", get(reviews::list_provider_reviews))
        // Provider self-service
        .route(
            "/api/providers/me/verification",
            get(handlers::get_my_verification).post(handlers::resubmit_verification),
        )
        // Admin moderation
        .route(
            "/api/admin/providers",
            get(handlers::list_providers_for_review),
        )
        .route(
            "/api/admin/providers/:id/verification",
            post(handlers::decide_verification),
        )
}
