//! Core library for examgate - the exam portal client.
//!
//! This crate provides:
//! - `auth`: the session store, its durable storage backends, and login
//!   response parsing
//! - `api`: the authorized request client for the portal REST API
//! - `countdown`: the exam countdown engine that reconciles server snapshots
//!   with a local one-second ticker
//! - `config`: application configuration and storage locations
//! - `models`: request and response types exchanged with the portal

pub mod api;
pub mod auth;
pub mod config;
pub mod countdown;
pub mod models;

pub use api::{ApiClient, ApiError, AuthFailureHandler, Endpoint};
pub use auth::{SessionState, SessionStore, SharedSession};
pub use config::Config;
pub use countdown::{CountdownEngine, CountdownRefresher, RefreshTrigger, RemainingTimeProvider};
