// src/bookings/validators.rs

use chrono::DateTime;

use super::models::{CreateBookingRequest, UpdateBookingStatusRequest};
use crate::common::validation::optional_text;
use crate::common::{ValidationResult, Validator};

pub struct BookingValidator;

impl Validator<CreateBookingRequest> for BookingValidator {
    fn validate(&self, data: &CreateBookingRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.service_id.trim().is_empty() {
            result.add_error("serviceId", "serviceId is required");
        }

        if data.scheduled_at.trim().is_empty() {
            result.add_error("scheduledAt", "scheduledAt is required");
        } else if DateTime::parse_from_rfc3339(data.scheduled_at.trim()).is_err() {
            result.add_error("scheduledAt", "scheduledAt must be an RFC 3339 timestamp");
        }

        if let Some(address_id) = &data.address_id {
            if address_id.trim().is_empty() {
                result.add_error("addressId", "addressId cannot be empty");
            }
        }

        optional_text(&mut result, "notes", data.notes.as_deref(), 2000);

        result
    }
}

impl Validator<UpdateBookingStatusRequest> for BookingValidator {
    fn validate(&self, data: &UpdateBookingStatusRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.status.trim().is_empty() {
            result.add_error("status", "status is required");
        } else if super::models::BookingStatus::parse(&data.status).is_none() {
            result.add_error(
                "status",
                "status must be one of pending, confirmed, in_progress, completed, cancelled",
            );
        }

        result
    }
}
