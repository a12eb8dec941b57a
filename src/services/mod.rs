//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They talk to the merchant store and return typed `AuthError`s.

pub mod auth_service;

pub use auth_service::AuthService;
