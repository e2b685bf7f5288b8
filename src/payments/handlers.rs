// src/payments/handlers.rs

use axum::{
    extract::{Extension, Json, Path, Query},
    http::HeaderMap,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::{
    BookingPaymentRequest, GatewayNotification, GatewayOutcome, Payment, PaymentListQuery,
    PaymentRecordStatus, Settlement,
};
use crate::auth::AuthedUser;
use crate::bookings::models::Booking;
use crate::bookings::{fetch_booking, fetch_visible_booking};
use crate::common::{ApiError, AppState, FormBody, JsonBody};

pub const IPN_SECRET_HEADER: &str = "x-ipn-secret";

/// Loads the booking named in a payment request and checks the caller is its customer
async fn customer_booking(
    state: &AppState,
    authed: &AuthedUser,
    request: &BookingPaymentRequest,
) -> Result<Booking, ApiError> {
    let booking_id = request.booking_id.trim();
    if booking_id.is_empty() {
        return Err(ApiError::BadRequest("bookingId is required".to_string()));
    }

    let booking = fetch_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;

    if booking.customer_id != authed.id {
        warn!(
            user_id = %authed.id,
            booking_id = %booking_id,
            "Payment refused: caller is not the booking's customer"
        );
        return Err(ApiError::Forbidden(
            "Only the customer of this booking can pay for it".to_string(),
        ));
    }

    Ok(booking)
}

/// Checks the shared webhook secret when one is configured
fn verify_ipn_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.ipn_secret.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get(IPN_SECRET_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if bool::from(provided.ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        warn!("Gateway notification rejected: bad or missing IPN secret");
        Err(ApiError::Unauthorized("Invalid IPN secret".to_string()))
    }
}

fn field_as_string(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalizes a webhook payload of either shape into a `GatewayNotification`
pub fn parse_gateway_payload(payload: Map<String, Value>) -> Result<GatewayNotification, ApiError> {
    let transaction_id = field_as_string(&payload, "transactionId")
        .or_else(|| field_as_string(&payload, "tran_id"))
        .ok_or_else(|| ApiError::BadRequest("transactionId is required".to_string()))?;

    let status = field_as_string(&payload, "status")
        .ok_or_else(|| ApiError::BadRequest("status is required".to_string()))?;

    let outcome = GatewayOutcome::parse(&status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported payment status: {}", status)))?;

    Ok(GatewayNotification {
        transaction_id,
        outcome,
        raw: Value::Object(payload),
    })
}

async fn apply_notification(
    state: &AppState,
    payload: Map<String, Value>,
    source: &'static str,
) -> Result<Json<Settlement>, ApiError> {
    let notification = parse_gateway_payload(payload).map_err(|e| {
        warn!(source = source, error = %e, "Malformed gateway notification");
        e
    })?;

    debug!(
        source = source,
        transaction_id = %notification.transaction_id,
        outcome = ?notification.outcome,
        "Gateway notification received"
    );

    let settlement = state
        .payment_service
        .apply_gateway_notification(&notification)
        .await?;

    Ok(Json(settlement))
}

/// POST /api/payments/initiate - Open a gateway payment for a booking
pub async fn initiate_payment(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<BookingPaymentRequest>,
) -> Result<Json<Payment>, ApiError> {
    let state = state_lock.read().await.clone();

    let booking = customer_booking(&state, &authed, &request).await?;
    let payment = state.payment_service.initiate(&booking).await?;

    Ok(Json(payment))
}

/// POST /api/payments/demo - Demo checkout, always succeeds
pub async fn demo_payment(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<BookingPaymentRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let state = state_lock.read().await.clone();

    let booking = customer_booking(&state, &authed, &request).await?;
    let settlement = state.payment_service.settle_demo(&booking).await?;

    Ok(Json(settlement))
}

/// POST /api/payments/ipn - JSON webhook
pub async fn ipn_json(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Settlement>, ApiError> {
    let state = state_lock.read().await.clone();

    verify_ipn_secret(&state, &headers)?;

    let Value::Object(payload) = body else {
        return Err(ApiError::BadRequest(
            "Notification body must be a JSON object".to_string(),
        ));
    };

    apply_notification(&state, payload, "json").await
}

/// POST /api/payments/ipn/form - Form-encoded webhook
pub async fn ipn_form(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    FormBody(fields): FormBody<HashMap<String, String>>,
) -> Result<Json<Settlement>, ApiError> {
    let state = state_lock.read().await.clone();

    verify_ipn_secret(&state, &headers)?;

    let payload = fields
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect::<Map<String, Value>>();

    apply_notification(&state, payload, "form").await
}

/// GET /api/payments/booking/:bookingId
pub async fn get_booking_payment(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(booking_id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let state = state_lock.read().await.clone();

    fetch_visible_booking(&state.db, &authed, &booking_id).await?;

    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ?")
        .bind(&booking_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, booking_id = %booking_id, "Database error fetching payment");
            ApiError::DatabaseError(e)
        })?
        .ok_or_else(|| ApiError::NotFound("No payment for this booking".to_string()))?;

    Ok(Json(payment))
}

/// GET /api/admin/payments - All payments, optionally by status
pub async fn list_payments(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let state = state_lock.read().await.clone();

    authed.require_admin()?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(PaymentRecordStatus::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown payment status: {}", raw))
        })?),
        None => None,
    };
    let status = status.map(|s| s.as_str());

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE (? IS NULL OR status = ?) ORDER BY created_at DESC",
    )
    .bind(status)
    .bind(status)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, "Database error listing payments");
        ApiError::DatabaseError(e)
    })?;

    info!(
        admin_id = %authed.id,
        payment_count = payments.len(),
        "Payments listed"
    );

    Ok(Json(payments))
}
