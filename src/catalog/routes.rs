// src/catalog/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn catalog_routes() -> Router {
    Router::new()
        .route(
            "/api/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route("/api/services/mine", get(handlers::list_my_services))
        .route(
            "/api/services/:id",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
}
