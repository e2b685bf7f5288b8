// src/payments/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn payments_routes() -> Router {
    Router::new()
        .route("/api/payments/initiate", post(handlers::initiate_payment))
        .route("/api/payments/demo", post(handlers::demo_payment))
        .route("/api/payments/ipn", post(handlers::ipn_json))
        .route("/api/payments/ipn/form", post(handlers::ipn_form))
        .route(
            "/api/payments/booking/:bookingId",
            get(handlers::get_booking_payment),
        )
        .route("/api/admin/payments", get(handlers::list_payments))
}
