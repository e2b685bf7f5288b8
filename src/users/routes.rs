// src/users/routes.rs

use axum::{
    routing::{get, put},
    Router,
};

use super::handlers;

pub fn users_routes() -> Router {
    Router::new()
        .route("/api/users/me", put(handlers::update_me))
        .route("/api/admin/users", get(handlers::list_users))
        .route(
            "/api/admin/users/:id",
            get(handlers::get_user).delete(handlers::delete_user),
        )
}
