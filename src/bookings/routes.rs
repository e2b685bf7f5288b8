// src/bookings/routes.rs

use axum::{
    routing::{get, put},
    Router,
};

use super::handlers;

pub fn bookings_routes() -> Router {
    Router::new()
        .route(
            "/api/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/api/bookings/:id", get(handlers::get_booking))
        .route(
            "/api/bookings/:id/status",
            put(handlers::update_booking_status),
        )
}
