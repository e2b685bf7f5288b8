// src/notifications/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;


pub use routes::notifications_routes;
