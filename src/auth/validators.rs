// src/auth/validators.rs

use super::models::{LoginRequest, RegisterRequest};
use crate::common::validation::{is_valid_email, optional_text, require_text};
use crate::common::{ValidationResult, Validator};
use crate::users::models::UserType;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub struct RegisterValidator;

impl Validator<RegisterRequest> for RegisterValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        } else if !is_valid_email(data.email.trim()) {
            result.add_error("email", "Email address is not valid");
        }

        if data.password.is_empty() {
            result.add_error("password", "Password is required");
        } else if data.password.len() < MIN_PASSWORD_LENGTH {
            result.add_error("password", "Password must be at least 8 characters");
        } else if data.password.len() > 72 {
            // bcrypt only looks at the first 72 bytes
            result.add_error("password", "Password must be at most 72 characters");
        }

        require_text(&mut result, "name", &data.name, 120);
        optional_text(&mut result, "phone", data.phone.as_deref(), 32);
        optional_text(&mut result, "businessName", data.business_name.as_deref(), 200);

        match UserType::parse(&data.user_type) {
            None if data.user_type.trim().is_empty() => {
                result.add_error("userType", "userType is required")
            }
            None => result.add_error("userType", "userType must be customer or provider"),
            Some(UserType::Admin) => {
                result.add_error("userType", "Admin accounts cannot be self-registered")
            }
            Some(UserType::Customer) if data.business_name.is_some() => {
                result.add_error("businessName", "Only providers have a business name")
            }
            Some(_) => {}
        }

        result
    }
}

pub struct LoginValidator;

impl Validator<LoginRequest> for LoginValidator {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        }
        if data.password.is_empty() {
            result.add_error("password", "Password is required");
        }

        result
    }
}
