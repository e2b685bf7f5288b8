// src/addresses/validators.rs

use super::models::{CreateAddressRequest, UpdateAddressRequest};
use crate::common::validation::{optional_text, require_text};
use crate::common::{ValidationResult, Validator};

pub struct AddressValidator;

impl Validator<CreateAddressRequest> for AddressValidator {
    fn validate(&self, data: &CreateAddressRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        require_text(&mut result, "label", &data.label, 60);
        require_text(&mut result, "line1", &data.line1, 200);
        optional_text(&mut result, "line2", data.line2.as_deref(), 200);
        require_text(&mut result, "city", &data.city, 100);
        optional_text(&mut result, "state", data.state.as_deref(), 100);
        require_text(&mut result, "postalCode", &data.postal_code, 20);
        require_text(&mut result, "country", &data.country, 100);

        result
    }
}

impl Validator<UpdateAddressRequest> for AddressValidator {
    fn validate(&self, data: &UpdateAddressRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.label.is_none()
            && data.line1.is_none()
            && data.line2.is_none()
            && data.city.is_none()
            && data.state.is_none()
            && data.postal_code.is_none()
            && data.country.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        optional_text(&mut result, "label", data.label.as_deref(), 60);
        optional_text(&mut result, "line1", data.line1.as_deref(), 200);
        optional_text(&mut result, "line2", data.line2.as_deref(), 200);
        optional_text(&mut result, "city", data.city.as_deref(), 100);
        optional_text(&mut result, "state", data.state.as_deref(), 100);
        optional_text(&mut result, "postalCode", data.postal_code.as_deref(), 20);
        optional_text(&mut result, "country", data.country.as_deref(), 100);

        result
    }
}
