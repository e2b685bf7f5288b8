// src/catalog/validators.rs

use super::models::{CreateServiceRequest, UpdateServiceRequest};
use crate::common::validation::{optional_text, require_text};
use crate::common::{ValidationResult, Validator};

const MAX_PRICE: f64 = 1_000_000.0;
const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;

fn validate_price(result: &mut ValidationResult, price: f64) {
    if !price.is_finite() || price < 0.0 {
        result.add_error("price", "Price must be a non-negative number");
    } else if price > MAX_PRICE {
        result.add_error("price", "Price is too large");
    }
}

fn validate_duration(result: &mut ValidationResult, minutes: i64) {
    if minutes <= 0 || minutes > MAX_DURATION_MINUTES {
        result.add_error("durationMinutes", "Duration must be between 1 minute and 7 days");
    }
}

pub struct ServiceValidator;

impl Validator<CreateServiceRequest> for ServiceValidator {
    fn validate(&self, data: &CreateServiceRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        require_text(&mut result, "title", &data.title, 200);
        require_text(&mut result, "category", &data.category, 100);

        match data.price {
            Some(price) => validate_price(&mut result, price),
            None => result.add_error("price", "price is required"),
        }

        if let Some(minutes) = data.duration_minutes {
            validate_duration(&mut result, minutes);
        }

        if let Some(description) = &data.description {
            if description.len() > 5000 {
                result.add_error("description", "Description must be less than 5000 characters");
            }
        }

        result
    }
}

impl Validator<UpdateServiceRequest> for ServiceValidator {
    fn validate(&self, data: &UpdateServiceRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.title.is_none()
            && data.description.is_none()
            && data.category.is_none()
            && data.price.is_none()
            && data.duration_minutes.is_none()
            && data.is_active.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        optional_text(&mut result, "title", data.title.as_deref(), 200);
        optional_text(&mut result, "category", data.category.as_deref(), 100);

        if let Some(price) = data.price {
            validate_price(&mut result, price);
        }
        if let Some(minutes) = data.duration_minutes {
            validate_duration(&mut result, minutes);
        }
        if let Some(description) = &data.description {
            if description.len() > 5000 {
                result.add_error("description", "Description must be less than 5000 characters");
            }
        }

        result
    }
}
