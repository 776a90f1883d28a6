//! Core business logic for campusdesk.

pub mod services;

pub use services::*;
