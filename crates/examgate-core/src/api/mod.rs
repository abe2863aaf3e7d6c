//! REST API client module for the exam portal.
//!
//! This module provides the `ApiClient` for registration, verification,
//! login and the remaining-time endpoints.
//!
//! Protected requests carry the session's bearer credential. Any 401
//! response clears the session and notifies the `AuthFailureHandler`
//! before the error reaches the caller.

pub mod client;
pub mod endpoint;
pub mod error;

pub use client::{ApiClient, AuthFailureHandler};
pub use endpoint::Endpoint;
pub use error::{extract_message, ApiError, ErrorClass};
