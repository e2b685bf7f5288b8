// src/services/notifications.rs
//! Writes in-app notifications for state transitions elsewhere in the system

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::common::generate_notification_id;
use crate::notifications::models::NotificationKind;

#[derive(Debug)]
pub struct NotificationService {
    db_pool: SqlitePool,
}

impl NotificationService {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Insert a notification for `user_id`.
    ///
    /// Failures are logged and swallowed: a missed notification never fails
    /// the request that triggered it.
    pub async fn notify(&self, user_id: &str, kind: NotificationKind, title: &str, message: &str) {
        let notification_id = generate_notification_id();

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, 0, datetime('now'))
            "#,
        )
        .bind(&notification_id)
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(message)
        .execute(&self.db_pool)
        .await;

        match result {
            Ok(_) => debug!(
                notification_id = %notification_id,
                user_id = %user_id,
                kind = ?kind,
                "Notification created"
            ),
            Err(e) => warn!(
                error = %e,
                user_id = %user_id,
                kind = ?kind,
                "Failed to create notification"
            ),
        }
    }
}
