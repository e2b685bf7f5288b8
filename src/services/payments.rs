// src/services/payments.rs
//! Payment settlement shared by the demo checkout and both gateway webhooks
//!
//! Payment record: `PENDING -> PAID | FAILED`, `FAILED -> PAID` (late success).
//! Booking mirror:  `unpaid -> paid | failed`, `failed -> paid`. `PAID` is terminal.
//!
//! Payment and booking rows are always written in one transaction, and the booking
//! update is conditional on it not already being paid, so replays are no-ops.

use std::sync::Arc;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use super::notifications::NotificationService;
use crate::bookings::models::{Booking, BookingPaymentStatus, BookingStatus};
use crate::common::{
    generate_demo_transaction_id, generate_payment_id, generate_transaction_id, ApiError,
};
use crate::notifications::models::NotificationKind;
use crate::payments::models::{
    GatewayNotification, GatewayOutcome, Payment, PaymentRecordStatus, Settlement,
};

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("No payment found for transaction {0}")]
    TransactionNotFound(String),

    #[error("Booking {0} is already paid")]
    AlreadyPaid(String),

    #[error("Booking {0} is cancelled and cannot be paid")]
    BookingCancelled(String),

    #[error("Cannot change payment status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<PaymentError> for ApiError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::TransactionNotFound(_) | PaymentError::BookingNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            PaymentError::AlreadyPaid(_)
            | PaymentError::BookingCancelled(_)
            | PaymentError::InvalidTransition { .. } => ApiError::BadRequest(e.to_string()),
            PaymentError::SerializationError(_) => ApiError::InternalServer(e.to_string()),
            PaymentError::DatabaseError(db) => ApiError::DatabaseError(db),
        }
    }
}

/// What applying an outcome to a payment record in a given state should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    /// Move to the outcome's status
    Apply(PaymentRecordStatus),
    /// Record already reflects this outcome; nothing to write
    AlreadyApplied,
    /// Outcome contradicts a terminal state
    Rejected,
}

pub fn plan_payment_transition(
    current: PaymentRecordStatus,
    outcome: GatewayOutcome,
) -> PaymentTransition {
    use PaymentRecordStatus::*;

    match (current, outcome) {
        (Paid, GatewayOutcome::Paid) | (Failed, GatewayOutcome::Failed) => {
            PaymentTransition::AlreadyApplied
        }
        (Paid, GatewayOutcome::Failed) => PaymentTransition::Rejected,
        (Pending, outcome) | (Failed, outcome @ GatewayOutcome::Paid) => {
            PaymentTransition::Apply(outcome.record_status())
        }
    }
}

#[derive(Debug)]
pub struct PaymentService {
    db_pool: SqlitePool,
    notifications: Arc<NotificationService>,
}

impl PaymentService {
    pub fn new(db_pool: SqlitePool, notifications: Arc<NotificationService>) -> Self {
        Self {
            db_pool,
            notifications,
        }
    }

    /// Open (or reopen) a gateway payment for a booking and hand out a fresh transaction id
    pub async fn initiate(&self, booking: &Booking) -> Result<Payment, PaymentError> {
        if booking.status == BookingStatus::Cancelled {
            return Err(PaymentError::BookingCancelled(booking.id.clone()));
        }

        let mut tx = self.db_pool.begin().await?;

        let existing = fetch_payment_by_booking(&mut tx, &booking.id).await?;
        let transaction_id = generate_transaction_id();

        let payment_id = match existing {
            Some(payment) if payment.status == PaymentRecordStatus::Paid => {
                return Err(PaymentError::AlreadyPaid(booking.id.clone()));
            }
            Some(payment) => {
                sqlx::query(
                    r#"
                    UPDATE payments
                    SET status = 'PENDING', method = 'gateway', transaction_id = ?,
                        amount = ?, gateway_response = NULL, updated_at = datetime('now')
                    WHERE id = ? AND status != 'PAID'
                    "#,
                )
                .bind(&transaction_id)
                .bind(booking.total_amount)
                .bind(&payment.id)
                .execute(&mut *tx)
                .await?;
                payment.id
            }
            None => {
                let payment_id = generate_payment_id();
                sqlx::query(
                    r#"
                    INSERT INTO payments (id, booking_id, amount, method, status, transaction_id,
                                          gateway_response, created_at, updated_at)
                    VALUES (?, ?, ?, 'gateway', 'PENDING', ?, NULL, datetime('now'), datetime('now'))
                    "#,
                )
                .bind(&payment_id)
                .bind(&booking.id)
                .bind(booking.total_amount)
                .bind(&transaction_id)
                .execute(&mut *tx)
                .await?;
                payment_id
            }
        };

        let payment = fetch_payment_by_id(&mut tx, &payment_id).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            payment_id = %payment.id,
            transaction_id = %payment.transaction_id,
            "Gateway payment initiated"
        );

        Ok(payment)
    }

    /// Demo checkout: always settles the booking as paid
    pub async fn settle_demo(&self, booking: &Booking) -> Result<Settlement, PaymentError> {
        if booking.status == BookingStatus::Cancelled {
            return Err(PaymentError::BookingCancelled(booking.id.clone()));
        }

        let mut tx = self.db_pool.begin().await?;

        let existing = fetch_payment_by_booking(&mut tx, &booking.id).await?;
        let transaction_id = generate_demo_transaction_id();
        let response = serde_json::json!({
            "gateway": "demo",
            "status": "PAID",
            "transactionId": transaction_id,
        })
        .to_string();

        let payment_id = match existing {
            Some(payment) => {
                match plan_payment_transition(payment.status, GatewayOutcome::Paid) {
                    PaymentTransition::AlreadyApplied => {
                        tx.rollback().await?;
                        debug!(booking_id = %booking.id, "Demo payment replay, booking already paid");
                        return self.already_processed(payment).await;
                    }
                    PaymentTransition::Rejected => {
                        return Err(PaymentError::AlreadyPaid(booking.id.clone()));
                    }
                    PaymentTransition::Apply(_) => {}
                }

                let result = sqlx::query(
                    r#"
                    UPDATE payments
                    SET status = 'PAID', method = 'demo', transaction_id = ?, amount = ?,
                        gateway_response = ?, updated_at = datetime('now')
                    WHERE id = ? AND status = ?
                    "#,
                )
                .bind(&transaction_id)
                .bind(booking.total_amount)
                .bind(&response)
                .bind(&payment.id)
                .bind(payment.status)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    tx.rollback().await?;
                    return self.reload_settlement(&payment.id, true).await;
                }
                payment.id
            }
            None => {
                let payment_id = generate_payment_id();
                sqlx::query(
                    r#"
                    INSERT INTO payments (id, booking_id, amount, method, status, transaction_id,
                                          gateway_response, created_at, updated_at)
                    VALUES (?, ?, ?, 'demo', 'PAID', ?, ?, datetime('now'), datetime('now'))
                    "#,
                )
                .bind(&payment_id)
                .bind(&booking.id)
                .bind(booking.total_amount)
                .bind(&transaction_id)
                .bind(&response)
                .execute(&mut *tx)
                .await?;
                payment_id
            }
        };

        mark_booking(&mut tx, &booking.id, BookingPaymentStatus::Paid).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            payment_id = %payment_id,
            method = "demo",
            "Booking payment settled"
        );

        self.notify_settled(booking, GatewayOutcome::Paid).await;
        self.reload_settlement(&payment_id, false).await
    }

    /// Apply a webhook notification to the payment it names by transaction id
    pub async fn apply_gateway_notification(
        &self,
        notification: &GatewayNotification,
    ) -> Result<Settlement, PaymentError> {
        let mut tx = self.db_pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE transaction_id = ?")
            .bind(&notification.transaction_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| PaymentError::TransactionNotFound(notification.transaction_id.clone()))?;

        let next = match plan_payment_transition(payment.status, notification.outcome) {
            PaymentTransition::Apply(next) => next,
            PaymentTransition::AlreadyApplied => {
                tx.rollback().await?;
                info!(
                    transaction_id = %notification.transaction_id,
                    status = payment.status.as_str(),
                    "Duplicate gateway notification ignored"
                );
                return self.already_processed(payment).await;
            }
            PaymentTransition::Rejected => {
                warn!(
                    transaction_id = %notification.transaction_id,
                    "Gateway reported failure for a payment that is already PAID"
                );
                return Err(PaymentError::InvalidTransition {
                    from: payment.status.as_str().to_string(),
                    to: notification.outcome.record_status().as_str().to_string(),
                });
            }
        };

        let booking = fetch_booking(&mut tx, &payment.booking_id).await?;
        if booking.status == BookingStatus::Cancelled
            && notification.outcome == GatewayOutcome::Paid
        {
            tx.rollback().await?;
            warn!(
                booking_id = %booking.id,
                transaction_id = %notification.transaction_id,
                "Gateway reported success for a cancelled booking"
            );
            return Err(PaymentError::BookingCancelled(booking.id));
        }

        let raw = serde_json::to_string(&notification.raw)?;
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, method = 'gateway', gateway_response = ?, updated_at = datetime('now')
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(next)
        .bind(&raw)
        .bind(&payment.id)
        .bind(payment.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return self.reload_settlement(&payment.id, true).await;
        }

        mark_booking(&mut tx, &booking.id, notification.outcome.booking_status()).await?;
        tx.commit().await?;

        info!(
            booking_id = %booking.id,
            payment_id = %payment.id,
            transaction_id = %notification.transaction_id,
            status = next.as_str(),
            "Gateway notification applied"
        );

        self.notify_settled(&booking, notification.outcome).await;
        self.reload_settlement(&payment.id, false).await
    }

    async fn notify_settled(&self, booking: &Booking, outcome: GatewayOutcome) {
        match outcome {
            GatewayOutcome::Paid => {
                let message = format!(
                    "Payment of {:.2} for booking {} was received.",
                    booking.total_amount, booking.id
                );
                self.notifications
                    .notify(
                        &booking.customer_id,
                        NotificationKind::PaymentReceived,
                        "Payment successful",
                        &message,
                    )
                    .await;
                self.notifications
                    .notify(
                        &booking.provider_id,
                        NotificationKind::PaymentReceived,
                        "Booking paid",
                        &message,
                    )
                    .await;
            }
            GatewayOutcome::Failed => {
                self.notifications
                    .notify(
                        &booking.customer_id,
                        NotificationKind::PaymentFailed,
                        "Payment failed",
                        &format!(
                            "Payment for booking {} did not go through. You can try again.",
                            booking.id
                        ),
                    )
                    .await;
                self.notifications
                    .notify(
                        &booking.provider_id,
                        NotificationKind::PaymentFailed,
                        "Booking payment failed",
                        &format!("Payment for booking {} did not go through.", booking.id),
                    )
                    .await;
            }
        }
    }

    async fn already_processed(&self, payment: Payment) -> Result<Settlement, PaymentError> {
        self.reload_settlement(&payment.id, true).await
    }

    async fn reload_settlement(
        &self,
        payment_id: &str,
        already_processed: bool,
    ) -> Result<Settlement, PaymentError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(payment_id)
            .fetch_one(&self.db_pool)
            .await?;

        let booking_payment_status = sqlx::query_scalar::<_, BookingPaymentStatus>(
            "SELECT payment_status FROM bookings WHERE id = ?",
        )
        .bind(&payment.booking_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| PaymentError::BookingNotFound(payment.booking_id.clone()))?;

        Ok(Settlement {
            booking_id: payment.booking_id.clone(),
            payment,
            booking_payment_status,
            already_processed,
        })
    }
}

async fn fetch_payment_by_booking(
    tx: &mut Transaction<'_, Sqlite>,
    booking_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ?")
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await
}

async fn fetch_booking(
    tx: &mut Transaction<'_, Sqlite>,
    booking_id: &str,
) -> Result<Booking, PaymentError> {
    sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
        .bind(booking_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| PaymentError::BookingNotFound(booking_id.to_string()))
}

async fn fetch_payment_by_id(
    tx: &mut Transaction<'_, Sqlite>,
    payment_id: &str,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
        .bind(payment_id)
        .fetch_one(&mut **tx)
        .await
}

/// Mirror the payment outcome onto the booking; a paid booking is never touched again
async fn mark_booking(
    tx: &mut Transaction<'_, Sqlite>,
    booking_id: &str,
    status: BookingPaymentStatus,
) -> Result<(), PaymentError> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET payment_status = ?, updated_at = datetime('now')
        WHERE id = ? AND payment_status != 'paid'
        "#,
    )
    .bind(status)
    .bind(booking_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE id = ?")
            .bind(booking_id)
            .fetch_one(&mut **tx)
            .await?;
        if exists == 0 {
            return Err(PaymentError::BookingNotFound(booking_id.to_string()));
        }
        debug!(booking_id = %booking_id, "Booking already marked paid");
    }

    Ok(())
}
