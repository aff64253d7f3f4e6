//! HTTP access to the admin REST API.

pub mod api;

pub use api::{AdminApi, ApiError};
