// src/reviews/routes.rs

use axum::{
    routing::{delete, post},
    Router,
};

use super::handlers;

/// Provider review listing lives under `providers_routes`
pub fn reviews_routes() -> Router {
    Router::new()
        .route("/api/reviews", post(handlers::create_review))
        .route("/api/reviews/:id", delete(handlers::delete_review))
}
