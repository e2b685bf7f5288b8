// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., B_K7NP3X for bookings)

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of the random part of gateway transaction ids
const TRANSACTION_ID_LENGTH: usize = 12;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User (U_)
    User,
    /// Catalog service offered by a provider (S_)
    Service,
    /// Booking (B_)
    Booking,
    /// Payment (P_)
    Payment,
    /// Address (A_)
    Address,
    /// Review (R_)
    Review,
    /// Notification (N_)
    Notification,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Service => "S",
            EntityPrefix::Booking => "B",
            EntityPrefix::Payment => "P",
            EntityPrefix::Address => "A",
            EntityPrefix::Review => "R",
            EntityPrefix::Notification => "N",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// Returns a string in format "PREFIX_XXXXXX" (e.g., "B_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

/// Generate a raw Crockford Base32 string without prefix
pub fn generate_raw_id(length: usize) -> String {
    generate_crockford_string(length)
}

// ============================================================================
// Convenience functions for each entity type
// ============================================================================

/// Generate a User ID (U_XXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate a Service ID (S_XXXXXX)
pub fn generate_service_id() -> String {
    generate_id(EntityPrefix::Service)
}

/// Generate a Booking ID (B_XXXXXX)
pub fn generate_booking_id() -> String {
    generate_id(EntityPrefix::Booking)
}

/// Generate a Payment ID (P_XXXXXX)
pub fn generate_payment_id() -> String {
    generate_id(EntityPrefix::Payment)
}

/// Generate an Address ID (A_XXXXXX)
pub fn generate_address_id() -> String {
    generate_id(EntityPrefix::Address)
}

/// Generate a Review ID (R_XXXXXX)
pub fn generate_review_id() -> String {
    generate_id(EntityPrefix::Review)
}

/// Generate a Notification ID (N_XXXXXX)
pub fn generate_notification_id() -> String {
    generate_id(EntityPrefix::Notification)
}

/// Generate a gateway transaction id (TXN_XXXXXXXXXXXX)
pub fn generate_transaction_id() -> String {
    format!("TXN_{}", generate_raw_id(TRANSACTION_ID_LENGTH))
}

/// Generate a transaction id for the demo checkout (DEMO_XXXXXXXXXXXX)
pub fn generate_demo_transaction_id() -> String {
    format!("DEMO_{}", generate_raw_id(TRANSACTION_ID_LENGTH))
}
