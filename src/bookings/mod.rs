// src/bookings/mod.rs
//! Customer bookings and their lifecycle

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use handlers::{fetch_booking, fetch_visible_booking};
pub use routes::bookings_routes;
