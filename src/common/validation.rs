// Common validation types and traits

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

/// Loose structural email check, enough to reject obvious typos
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_regex().is_match(email)
}

fn check_text(
    result: &mut ValidationResult,
    field: &str,
    value: &str,
    max_len: usize,
    blank_message: &str,
) {
    if value.trim().is_empty() {
        result.add_error(field, &format!("{} {}", field, blank_message));
    } else if value.len() > max_len {
        result.add_error(
            field,
            &format!("{} must be at most {} characters", field, max_len),
        );
    }
}

/// Checks a required text field and records an error when it is blank or too long
pub fn require_text(result: &mut ValidationResult, field: &str, value: &str, max_len: usize) {
    check_text(result, field, value, max_len, "is required");
}

/// Field only present on partial updates; when sent it may not be blank
pub fn optional_text(
    result: &mut ValidationResult,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) {
    if let Some(value) = value {
        check_text(result, field, value, max_len, "cannot be blank");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane example@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_require_text_records_field() {
        let mut result = ValidationResult::new();
        require_text(&mut result, "title", "   ", 10);
        require_text(&mut result, "category", "abcdefghijk", 10);
        require_text(&mut result, "name", "ok", 10);

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "title");
        assert_eq!(result.errors[1].field, "category");
    }

    #[test]
    fn test_optional_text_rejects_blank_updates() {
        let mut result = ValidationResult::new();
        optional_text(&mut result, "title", None, 10);
        assert!(result.is_valid);

        optional_text(&mut result, "title", Some("  "), 10);
        optional_text(&mut result, "bio", Some("abcdefghijk"), 10);

        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].message, "title cannot be blank");
        assert_eq!(result.errors[1].message, "bio must be at most 10 characters");
    }
}
