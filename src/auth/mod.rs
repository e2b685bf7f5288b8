//! # Auth Module
//!
//! Email/password registration and login, JWT issuance and validation,
//! and the `AuthedUser` extractor for protected routes.

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use routes::auth_routes;
