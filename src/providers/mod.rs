// src/providers/mod.rs
//! Public provider directory and the verification workflow endpoints

pub mod handlers;
pub mod models;
pub mod routes;


pub use routes::providers_routes;
