//! Tests for auth module
//!
//! Token handling, registration rules and the login contract.

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde_json::json;

    use crate::auth::handlers::issue_token;
    use crate::auth::models::Claims;
    use crate::common::testing::{TestApp, ADMIN_EMAIL, PASSWORD, TEST_JWT_SECRET};

    #[test]
    fn test_issued_token_round_trips_with_secret() {
        let token = issue_token(TEST_JWT_SECRET, "U_TEST", 1).expect("token");

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("decode");

        assert_eq!(decoded.claims.sub, "U_TEST");
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let token = issue_token(TEST_JWT_SECRET, "U_TEST", 1).expect("token");

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"wrong_secret_key"),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err(), "Token validation should fail with wrong secret");
    }

    #[tokio::test]
    async fn test_register_customer_and_fetch_me() {
        let app = TestApp::new().await;
        let (token, user_id) = app.register("Jane@Example.com", "customer").await;

        let (status, body) = app.request(Method::GET, "/api/me", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], user_id);
        assert_eq!(body["email"], "jane@example.com");
        assert_eq!(body["userType"], "customer");
        assert!(body.get("passwordHash").is_none());
        assert!(body["verificationStatus"].is_null());
    }

    #[tokio::test]
    async fn test_provider_registers_as_pending() {
        let app = TestApp::new().await;
        let (token, _) = app.register("pro@example.com", "provider").await;

        let (_, body) = app.request(Method::GET, "/api/me", Some(&token), None).await;

        assert_eq!(body["userType"], "provider");
        assert_eq!(body["verificationStatus"], "pending");
        assert_eq!(body["isVerified"], false);
        assert_eq!(body["businessName"], "Test Services Ltd");
    }

    #[tokio::test]
    async fn test_register_missing_fields_is_bad_request() {
        let app = TestApp::new().await;

        let (status, body) = app
            .request(Method::POST, "/api/auth/register", None, Some(json!({})))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_cannot_self_register_as_admin() {
        let app = TestApp::new().await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": "sneaky@example.com",
                    "password": PASSWORD,
                    "name": "Sneaky",
                    "userType": "admin",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_requires_token() {
        let app = TestApp::new().await;
        let (token, _) = app.register("leaving@example.com", "customer").await;

        let (status, body) = app
            .request(Method::POST, "/api/auth/logout", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "logged out");

        let (status, _) = app.request(Method::POST, "/api/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let app = TestApp::new().await;
        app.register("dup@example.com", "customer").await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": "DUP@example.com",
                    "password": PASSWORD,
                    "name": "Again",
                    "userType": "customer",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_configured_admin_email_is_promoted() {
        let app = TestApp::new().await;
        let (token, _) = app.register(ADMIN_EMAIL, "customer").await;

        let (_, body) = app.request(Method::GET, "/api/me", Some(&token), None).await;

        assert_eq!(body["userType"], "admin");
    }

    #[tokio::test]
    async fn test_login_contract() {
        let app = TestApp::new().await;
        let (_, user_id) = app.register("login@example.com", "customer").await;

        let (status, body) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "login@example.com", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user_id);
        assert!(body["token"].as_str().is_some());

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "login@example.com", "password": "not-the-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .request(Method::POST, "/api/auth/login", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_routes_require_a_valid_token() {
        let app = TestApp::new().await;

        let (status, _) = app.request(Method::GET, "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .request(Method::GET, "/api/me", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let foreign = issue_token("some_other_secret", "U_TEST", 1).expect("token");
        let (status, _) = app.request(Method::GET, "/api/me", Some(&foreign), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_unauthorized() {
        let app = TestApp::new().await;
        let token = issue_token(TEST_JWT_SECRET, "U_DOES_NOT_EXIST", 1).expect("token");

        let (status, _) = app.request(Method::GET, "/api/me", Some(&token), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
