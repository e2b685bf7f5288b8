// Application state shared across all modules

use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::services::{NotificationService, PaymentService, VerificationService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub admin_emails: HashSet<String>,
    pub ipn_secret: Option<String>,
    pub notification_service: Arc<NotificationService>,
    pub verification_service: Arc<VerificationService>,
    pub payment_service: Arc<PaymentService>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        jwt_secret: String,
        jwt_ttl_hours: i64,
        bcrypt_cost: u32,
        admin_emails: HashSet<String>,
        ipn_secret: Option<String>,
    ) -> Self {
        let notification_service = Arc::new(NotificationService::new(db.clone()));
        let verification_service = Arc::new(VerificationService::new(
            db.clone(),
            notification_service.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            db.clone(),
            notification_service.clone(),
        ));

        Self {
            db,
            jwt_secret,
            jwt_ttl_hours,
            bcrypt_cost,
            admin_emails,
            ipn_secret,
            notification_service,
            verification_service,
            payment_service,
        }
    }
}
