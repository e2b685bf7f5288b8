//! Tests for catalog module

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::catalog::models::CreateServiceRequest;
    use crate::catalog::validators::ServiceValidator;
    use crate::common::testing::{Marketplace, TestApp};
    use crate::common::Validator;

    fn request(price: Option<f64>, duration: Option<i64>) -> CreateServiceRequest {
        CreateServiceRequest {
            title: "AC repair".to_string(),
            description: None,
            category: "Appliances".to_string(),
            price,
            duration_minutes: duration,
        }
    }

    #[test]
    fn test_service_validator_price_rules() {
        assert!(ServiceValidator.validate(&request(Some(0.0), None)).is_valid);
        assert!(!ServiceValidator.validate(&request(None, None)).is_valid);
        assert!(!ServiceValidator.validate(&request(Some(-1.0), None)).is_valid);
        assert!(!ServiceValidator.validate(&request(Some(f64::NAN), None)).is_valid);
        assert!(!ServiceValidator.validate(&request(Some(2_000_000.0), None)).is_valid);
    }

    #[test]
    fn test_service_validator_duration_rules() {
        assert!(ServiceValidator.validate(&request(Some(10.0), Some(60))).is_valid);
        assert!(!ServiceValidator.validate(&request(Some(10.0), Some(0))).is_valid);
        assert!(!ServiceValidator.validate(&request(Some(10.0), Some(8 * 24 * 60))).is_valid);
    }

    #[tokio::test]
    async fn test_only_providers_create_services() {
        let app = TestApp::new().await;
        let (token, _) = app.register("cust@example.com", "customer").await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/services",
                Some(&token),
                Some(json!({ "title": "x", "category": "y", "price": 1.0 })),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_service_missing_fields() {
        let app = TestApp::new().await;
        let (token, _) = app.register("pro@example.com", "provider").await;

        let (status, body) = app
            .request(Method::POST, "/api/services", Some(&token), Some(json!({})))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_service_mistyped_field() {
        let app = TestApp::new().await;
        let (token, _) = app.register("pro@example.com", "provider").await;

        let (status, body) = app
            .request(
                Method::POST,
                "/api/services",
                Some(&token),
                Some(json!({ "title": "AC repair", "category": "Appliances", "price": "fifty" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["error"].as_str().unwrap().contains("price"));
    }

    #[tokio::test]
    async fn test_category_is_normalized() {
        let app = TestApp::new().await;
        let (admin_token, _) = app.admin().await;
        let (token, _) = app.approved_provider(&admin_token, "pro@example.com").await;
        let service_id = app.create_service(&token).await;

        let (status, body) = app
            .request(Method::GET, &format!("/api/services/{}", service_id), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "cleaning");
        assert_eq!(body["price"], 50.0);

        let (_, body) = app
            .request(Method::GET, "/api/services?category=Cleaning", None, None)
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_updates_and_others_are_forbidden() {
        let app = TestApp::new().await;
        let (admin_token, _) = app.admin().await;
        let (owner, _) = app.approved_provider(&admin_token, "owner@example.com").await;
        let (other, _) = app.approved_provider(&admin_token, "other@example.com").await;
        let service_id = app.create_service(&owner).await;
        let uri = format!("/api/services/{}", service_id);

        let (status, _) = app
            .request(Method::PUT, &uri, Some(&other), Some(json!({ "price": 1.0 })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .request(Method::PUT, &uri, Some(&owner), Some(json!({ "price": 75.5 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 75.5);
        assert_eq!(body["title"], "Deep cleaning");

        let (status, _) = app
            .request(Method::PUT, &uri, Some(&owner), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request(
                Method::PUT,
                "/api/services/S_MISSING",
                Some(&owner),
                Some(json!({ "price": 1.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deactivated_service_is_hidden_but_listed_for_owner() {
        let app = TestApp::new().await;
        let (admin_token, _) = app.admin().await;
        let (owner, _) = app.approved_provider(&admin_token, "owner@example.com").await;
        let service_id = app.create_service(&owner).await;

        app.request(
            Method::PUT,
            &format!("/api/services/{}", service_id),
            Some(&owner),
            Some(json!({ "isActive": false })),
        )
        .await;

        let (status, _) = app
            .request(Method::GET, &format!("/api/services/{}", service_id), None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .request(Method::GET, "/api/services/mine", Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["isActive"], false);
    }

    #[tokio::test]
    async fn test_delete_unbooked_service() {
        let app = TestApp::new().await;
        let (admin_token, _) = app.admin().await;
        let (owner, _) = app.approved_provider(&admin_token, "owner@example.com").await;
        let service_id = app.create_service(&owner).await;

        let (status, _) = app
            .request(Method::DELETE, &format!("/api/services/{}", service_id), Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = app
            .request(Method::GET, "/api/services/mine", Some(&owner), None)
            .await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_booked_service_deactivates_it() {
        let market = Marketplace::new().await;

        let (status, _) = market
            .app
            .request(
                Method::DELETE,
                &format!("/api/services/{}", market.service_id),
                Some(&market.provider_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = market
            .app
            .request(Method::GET, "/api/services/mine", Some(&market.provider_token), None)
            .await;
        let services = body.as_array().unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0]["isActive"], false);
    }
}
