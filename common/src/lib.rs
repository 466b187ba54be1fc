//! Shared building blocks for the catalog services: entity models and their
//! validation, error types, response envelopes, configuration and middleware.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
