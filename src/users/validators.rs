// src/users/validators.rs

use super::models::UpdateProfileRequest;
use crate::common::validation::optional_text;
use crate::common::{ValidationResult, Validator};

pub struct ProfileValidator;

impl Validator<UpdateProfileRequest> for ProfileValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.name.is_none()
            && data.phone.is_none()
            && data.business_name.is_none()
            && data.bio.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        optional_text(&mut result, "name", data.name.as_deref(), 120);
        optional_text(&mut result, "phone", data.phone.as_deref(), 32);
        optional_text(&mut result, "businessName", data.business_name.as_deref(), 200);

        if let Some(bio) = &data.bio {
            if bio.len() > 2000 {
                result.add_error("bio", "Bio must be less than 2000 characters");
            }
        }

        result
    }
}
