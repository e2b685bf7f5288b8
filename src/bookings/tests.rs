//! Tests for bookings module

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::bookings::models::{BookingStatus, CreateBookingRequest};
    use crate::bookings::validators::BookingValidator;
    use crate::common::testing::{Marketplace, TestApp};
    use crate::common::Validator;
    use crate::users::models::UserType;

    fn create_request(scheduled_at: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            service_id: "S_1".to_string(),
            scheduled_at: scheduled_at.to_string(),
            address_id: None,
            notes: None,
        }
    }

    async fn set_status(market: &Marketplace, token: &str, status: &str) -> (StatusCode, Value) {
        market
            .app
            .request(
                Method::PUT,
                &format!("/api/bookings/{}/status", market.booking_id),
                Some(token),
                Some(json!({ "status": status })),
            )
            .await
    }

    #[test]
    fn test_scheduled_at_must_be_rfc3339() {
        assert!(BookingValidator.validate(&create_request("2030-01-15T10:00:00+06:00")).is_valid);
        assert!(!BookingValidator.validate(&create_request("tomorrow")).is_valid);
        assert!(!BookingValidator.validate(&create_request("")).is_valid);
    }

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;

        assert!(Pending.can_transition(Confirmed, UserType::Provider));
        assert!(Confirmed.can_transition(InProgress, UserType::Provider));
        assert!(InProgress.can_transition(Completed, UserType::Provider));
        assert!(!Pending.can_transition(Completed, UserType::Provider));

        assert!(Pending.can_transition(Cancelled, UserType::Customer));
        assert!(Confirmed.can_transition(Cancelled, UserType::Customer));
        assert!(!InProgress.can_transition(Cancelled, UserType::Customer));
        assert!(!Pending.can_transition(Confirmed, UserType::Customer));

        assert!(InProgress.can_transition(Completed, UserType::Admin));
        assert!(!Completed.can_transition(Cancelled, UserType::Admin));
        assert!(!Cancelled.can_transition(Pending, UserType::Admin));
    }

    #[tokio::test]
    async fn test_new_booking_starts_pending_and_unpaid() {
        let market = Marketplace::new().await;

        let (status, body) = market
            .app
            .request(
                Method::GET,
                &format!("/api/bookings/{}", market.booking_id),
                Some(&market.customer_token),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["paymentStatus"], "unpaid");
        assert_eq!(body["totalAmount"], 50.0);
        assert_eq!(body["providerId"], market.provider_id);
        assert_eq!(body["scheduledAt"], "2030-01-15T10:00:00Z");
    }

    #[tokio::test]
    async fn test_create_booking_contract_errors() {
        let market = Marketplace::new().await;
        let app = &market.app;

        let (status, _) = app
            .request(Method::POST, "/api/bookings", Some(&market.customer_token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/bookings",
                Some(&market.provider_token),
                Some(json!({ "serviceId": market.service_id, "scheduledAt": "2030-01-15T10:00:00Z" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/bookings",
                Some(&market.customer_token),
                Some(json!({ "serviceId": "S_MISSING", "scheduledAt": "2030-01-15T10:00:00Z" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/bookings",
                Some(&market.customer_token),
                Some(json!({
                    "serviceId": market.service_id,
                    "scheduledAt": "2030-01-15T10:00:00Z",
                    "addressId": "A_NOT_MINE",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unapproved_provider_cannot_be_booked() {
        let app = TestApp::new().await;
        let (provider_token, _) = app.register("pending@example.com", "provider").await;
        let (customer_token, _) = app.register("cust@example.com", "customer").await;
        let service_id = app.create_service(&provider_token).await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/bookings",
                Some(&customer_token),
                Some(json!({ "serviceId": service_id, "scheduledAt": "2030-01-15T10:00:00Z" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_booking_with_own_address() {
        let market = Marketplace::new().await;
        let (_, address) = market
            .app
            .request(
                Method::POST,
                "/api/addresses",
                Some(&market.customer_token),
                Some(json!({
                    "label": "Home",
                    "line1": "12 Lake Road",
                    "city": "Dhaka",
                    "postalCode": "1205",
                    "country": "Bangladesh",
                })),
            )
            .await;

        let (status, body) = market
            .app
            .request(
                Method::POST,
                "/api/bookings",
                Some(&market.customer_token),
                Some(json!({
                    "serviceId": market.service_id,
                    "scheduledAt": "2030-02-01T09:30:00+06:00",
                    "addressId": address["id"],
                    "notes": "Ring twice",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["addressId"], address["id"]);
        assert_eq!(body["scheduledAt"], "2030-02-01T03:30:00Z");
    }

    #[tokio::test]
    async fn test_booking_visibility() {
        let market = Marketplace::new().await;
        let (stranger, _) = market.app.register("stranger@example.com", "customer").await;
        let uri = format!("/api/bookings/{}", market.booking_id);

        let (status, _) = market.app.request(Method::GET, &uri, Some(&market.provider_token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = market.app.request(Method::GET, &uri, Some(&market.admin_token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = market.app.request(Method::GET, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = market
            .app
            .request(Method::GET, "/api/bookings/B_MISSING", Some(&market.customer_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = market.app.request(Method::GET, "/api/bookings", Some(&stranger), None).await;
        assert!(body.as_array().unwrap().is_empty());

        let (_, body) = market
            .app
            .request(Method::GET, "/api/bookings", Some(&market.provider_token), None)
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = market
            .app
            .request(Method::GET, "/api/bookings?status=completed", Some(&market.admin_token), None)
            .await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_drives_booking_to_completion() {
        let market = Marketplace::new().await;

        let (status, _) = set_status(&market, &market.provider_token, "in_progress").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "cannot skip confirmation");

        for next in ["confirmed", "in_progress", "completed"] {
            let (status, body) = set_status(&market, &market.provider_token, next).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], next);
        }

        let (status, _) = set_status(&market, &market.customer_token, "cancelled").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_customer_may_only_cancel() {
        let market = Marketplace::new().await;

        let (status, _) = set_status(&market, &market.customer_token, "confirmed").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = set_status(&market, &market.customer_token, "cancelled").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "cancelled");

        let (_, body) = market
            .app
            .request(Method::GET, "/api/notifications", Some(&market.provider_token), None)
            .await;
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["kind"] == "booking_status_changed"));
    }

    #[tokio::test]
    async fn test_status_update_errors() {
        let market = Marketplace::new().await;
        let (stranger, _) = market.app.register("stranger@example.com", "customer").await;

        let (status, _) = set_status(&market, &stranger, "cancelled").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = set_status(&market, &market.provider_token, "teleported").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = set_status(&market, &market.provider_token, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
