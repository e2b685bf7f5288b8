// src/reviews/validators.rs

use super::models::CreateReviewRequest;
use crate::common::{ValidationResult, Validator};

pub struct ReviewValidator;

impl Validator<CreateReviewRequest> for ReviewValidator {
    fn validate(&self, data: &CreateReviewRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.booking_id.trim().is_empty() {
            result.add_error("bookingId", "bookingId is required");
        }

        match data.rating {
            None => result.add_error("rating", "rating is required"),
            Some(rating) if !(1..=5).contains(&rating) => {
                result.add_error("rating", "Rating must be between 1 and 5")
            }
            Some(_) => {}
        }

        if let Some(comment) = &data.comment {
            if comment.len() > 2000 {
                result.add_error("comment", "Comment must be less than 2000 characters");
            }
        }

        result
    }
}
