// src/services/mod.rs
//
// Shared business services that own the cross-entity state transitions
// used by several domain modules

pub mod notifications;
pub mod payments;
pub mod verification;

// Re-export commonly used types for convenience
pub use notifications::NotificationService;
pub use payments::PaymentService;
pub use verification::VerificationService;
