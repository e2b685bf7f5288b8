// src/payments/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::bookings::models::BookingPaymentStatus;
use crate::common::helpers::serialize_json_text;

/// Gateway-side status of a payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PaymentRecordStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Pending => "PENDING",
            PaymentRecordStatus::Paid => "PAID",
            PaymentRecordStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "PENDING" => Some(PaymentRecordStatus::Pending),
            "PAID" => Some(PaymentRecordStatus::Paid),
            "FAILED" => Some(PaymentRecordStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentMethod {
    Demo,
    Gateway,
}

/// Payment database model, one per booking
#[derive(FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentRecordStatus,
    pub transaction_id: String,
    #[serde(serialize_with = "serialize_json_text")]
    pub gateway_response: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Final outcome reported for a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    Paid,
    Failed,
}

impl GatewayOutcome {
    /// Map a gateway status string onto an outcome; unknown values yield `None`
    pub fn parse(status: &str) -> Option<Self> {
        match status.trim().to_uppercase().as_str() {
            "VALID" | "VALIDATED" | "PAID" | "SUCCESS" | "SUCCESSFUL" => Some(GatewayOutcome::Paid),
            "FAILED" | "FAILURE" | "CANCELLED" | "CANCELED" | "EXPIRED" | "UNATTEMPTED" => {
                Some(GatewayOutcome::Failed)
            }
            _ => None,
        }
    }

    pub fn record_status(&self) -> PaymentRecordStatus {
        match self {
            GatewayOutcome::Paid => PaymentRecordStatus::Paid,
            GatewayOutcome::Failed => PaymentRecordStatus::Failed,
        }
    }

    pub fn booking_status(&self) -> BookingPaymentStatus {
        match self {
            GatewayOutcome::Paid => BookingPaymentStatus::Paid,
            GatewayOutcome::Failed => BookingPaymentStatus::Failed,
        }
    }
}

/// A webhook payload normalized from either the JSON or the form-encoded shape
#[derive(Debug, Clone)]
pub struct GatewayNotification {
    pub transaction_id: String,
    pub outcome: GatewayOutcome,
    pub raw: serde_json::Value,
}

/// Body for the initiate and demo endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPaymentRequest {
    #[serde(default)]
    pub booking_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<String>,
}

/// Result of settling a payment
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub payment: Payment,
    pub booking_id: String,
    pub booking_payment_status: BookingPaymentStatus,
    pub already_processed: bool,
}
