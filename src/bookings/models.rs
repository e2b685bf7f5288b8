// src/bookings/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::users::models::UserType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether `actor` may move a booking from `self` to `next`
    pub fn can_transition(&self, next: BookingStatus, actor: UserType) -> bool {
        use BookingStatus::*;

        let provider_move = matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (InProgress, Completed)
        );
        let customer_move = matches!((self, next), (Pending, Cancelled) | (Confirmed, Cancelled));

        match actor {
            UserType::Provider => provider_move,
            UserType::Customer => customer_move,
            UserType::Admin => provider_move || customer_move,
        }
    }
}

/// Payment state of a booking: `unpaid -> paid | failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingPaymentStatus {
    Unpaid,
    Paid,
    Failed,
}

impl BookingPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingPaymentStatus::Unpaid => "unpaid",
            BookingPaymentStatus::Paid => "paid",
            BookingPaymentStatus::Failed => "failed",
        }
    }
}

/// Booking database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    pub provider_id: String,
    pub service_id: String,
    pub address_id: Option<String>,
    pub scheduled_at: String,
    pub notes: Option<String>,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_status: BookingPaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Booking {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.customer_id == user_id || self.provider_id == user_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub scheduled_at: String,
    pub address_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
}
