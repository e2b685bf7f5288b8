// src/payments/mod.rs
//! Payment endpoints: demo checkout, gateway initiation and the two IPN webhooks.
//! Settlement itself lives in `services::payments`.

pub mod handlers;
pub mod models;
pub mod routes;


pub use routes::payments_routes;
