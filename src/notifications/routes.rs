// src/notifications/routes.rs

use axum::{
    routing::{delete, get, put},
    Router,
};

use super::handlers;

pub fn notifications_routes() -> Router {
    Router::new()
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route("/api/notifications/read-all", put(handlers::mark_all_read))
        .route("/api/notifications/:id/read", put(handlers::mark_read))
        .route(
            "/api/notifications/:id",
            delete(handlers::delete_notification),
        )
}
