// src/common/testing.rs
//! Test harness: an in-memory database migrated with the production schema
//! and the real router, driven with `tower::ServiceExt::oneshot`.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use super::migrations::run_migrations;
use super::AppState;
use crate::app::build_router;

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const ADMIN_EMAIL: &str = "admin@homease.test";
pub const PASSWORD: &str = "correct-horse";
const TEST_BCRYPT_COST: u32 = 4;

/// A single connection keeps every query on the same in-memory database
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");

    run_migrations(&pool).await.expect("migrations");
    pool
}

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    pub async fn with_ipn_secret(secret: &str) -> Self {
        Self::build(Some(secret.to_string())).await
    }

    async fn build(ipn_secret: Option<String>) -> Self {
        let db = test_pool().await;
        let admin_emails: HashSet<String> = [ADMIN_EMAIL.to_string()].into_iter().collect();

        let state = AppState::new(
            db.clone(),
            TEST_JWT_SECRET.to_string(),
            1,
            TEST_BCRYPT_COST,
            admin_emails,
            ipn_secret,
        );

        let router = build_router(Arc::new(RwLock::new(state)), &[]);

        Self { router, db }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    /// JSON request with an optional bearer token
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_with_headers(method, uri, token, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.send(request).await
    }

    /// Form-encoded POST, as sent by the gateway's form webhook
    pub async fn post_form(
        &self,
        uri: &str,
        form: &str,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder.body(Body::from(form.to_string())).expect("request");
        self.send(request).await
    }

    /// Registers an account and returns `(token, user_id)`
    pub async fn register(&self, email: &str, user_type: &str) -> (String, String) {
        let mut body = json!({
            "email": email,
            "password": PASSWORD,
            "name": "Test User",
            "userType": user_type,
        });
        if user_type == "provider" {
            body["businessName"] = json!("Test Services Ltd");
        }

        let (status, body) = self
            .request(Method::POST, "/api/auth/register", None, Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", email, body);

        (
            body["token"].as_str().expect("token").to_string(),
            body["user"]["id"].as_str().expect("user id").to_string(),
        )
    }

    pub async fn admin(&self) -> (String, String) {
        self.register(ADMIN_EMAIL, "customer").await
    }

    /// Registers a provider and has the admin approve it
    pub async fn approved_provider(&self, admin_token: &str, email: &str) -> (String, String) {
        let (token, provider_id) = self.register(email, "provider").await;

        let (status, body) = self
            .request(
                Method::POST,
                &format!("/api/admin/providers/{}/verification", provider_id),
                Some(admin_token),
                Some(json!({ "status": "approved" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "approve provider: {}", body);

        (token, provider_id)
    }

    /// Creates a service priced at 50.00 and returns its id
    pub async fn create_service(&self, provider_token: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/services",
                Some(provider_token),
                Some(json!({
                    "title": "Deep cleaning",
                    "category": "Cleaning",
                    "price": 50.0,
                    "durationMinutes": 120,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create service: {}", body);

        body["id"].as_str().expect("service id").to_string()
    }

    pub async fn create_booking(&self, customer_token: &str, service_id: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/bookings",
                Some(customer_token),
                Some(json!({
                    "serviceId": service_id,
                    "scheduledAt": "2030-01-15T10:00:00Z",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create booking: {}", body);

        body["id"].as_str().expect("booking id").to_string()
    }
}

/// Admin, approved provider with one service, and a customer with a pending booking
pub struct Marketplace {
    pub app: TestApp,
    pub admin_token: String,
    pub provider_token: String,
    pub provider_id: String,
    pub customer_token: String,
    pub customer_id: String,
    pub service_id: String,
    pub booking_id: String,
}

impl Marketplace {
    pub async fn new() -> Self {
        Self::on(TestApp::new().await).await
    }

    pub async fn on(app: TestApp) -> Self {
        let (admin_token, _) = app.admin().await;
        let (provider_token, provider_id) =
            app.approved_provider(&admin_token, "pro@example.com").await;
        let (customer_token, customer_id) = app.register("cust@example.com", "customer").await;
        let service_id = app.create_service(&provider_token).await;
        let booking_id = app.create_booking(&customer_token, &service_id).await;

        Self {
            app,
            admin_token,
            provider_token,
            provider_id,
            customer_token,
            customer_id,
            service_id,
            booking_id,
        }
    }
}
