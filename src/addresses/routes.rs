// src/addresses/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers;

pub fn addresses_routes() -> Router {
    Router::new()
        .route(
            "/api/addresses",
            get(handlers::list_addresses).post(handlers::create_address),
        )
        .route(
            "/api/addresses/:id",
            put(handlers::update_address).delete(handlers::delete_address),
        )
        .route(
            "/api/addresses/:id/default",
            post(handlers::set_default_address),
        )
}
