// src/app.rs
//! Router composition shared by the binary and the endpoint tests

use axum::{
    extract::Extension,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::common::AppState;
use crate::{
    addresses, auth, bookings, catalog, logging_middleware, notifications, payments, providers,
    reviews, users,
};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

pub fn build_router(shared: Arc<RwLock<AppState>>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(auth::auth_routes())
        .merge(users::users_routes())
        .merge(providers::providers_routes())
        .merge(catalog::catalog_routes())
        .merge(bookings::bookings_routes())
        .merge(payments::payments_routes())
        .merge(addresses::addresses_routes())
        .merge(reviews::reviews_routes())
        .merge(notifications::notifications_routes())
        // Request/response bodies at debug level
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::common::testing::TestApp;

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;

        let (status, body) = app.request(Method::GET, "/api/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = TestApp::new().await;

        let (status, _) = app.request(Method::GET, "/api/nowhere", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
