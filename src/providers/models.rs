// src/providers/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::catalog::models::Service;
use crate::users::models::{User, VerificationStatus};

/// Public listing row for an approved provider
#[derive(FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: String,
    pub name: String,
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub is_verified: bool,
    pub verification_status: Option<VerificationStatus>,
    pub verified_at: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
}

/// Public provider profile with the services it currently offers
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    #[serde(flatten)]
    pub provider: ProviderSummary,
    pub services: Vec<Service>,
}

/// The verification fields of a provider account
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInfo {
    pub user_id: String,
    pub is_verified: bool,
    pub verification_status: Option<VerificationStatus>,
    pub verified_at: Option<String>,
    pub rejection_reason: Option<String>,
}

impl From<&User> for VerificationInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            is_verified: user.is_verified,
            verification_status: user.verification_status,
            verified_at: user.verified_at.clone(),
            rejection_reason: user.rejection_reason.clone(),
        }
    }
}

/// POST /api/admin/providers/:id/verification request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDecisionRequest {
    #[serde(default)]
    pub status: String,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminProviderQuery {
    pub status: Option<String>,
}
