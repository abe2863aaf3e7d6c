//! Data models for the exam portal API.
//!
//! - `auth`: registration, verification and login request bodies
//! - `countdown`: the countdown snapshot returned by the remaining-time
//!   endpoints

pub mod auth;
pub mod countdown;

pub use auth::{LoginRequest, RegisterRequest, VerifyRequest};
pub use countdown::CountdownSnapshot;
