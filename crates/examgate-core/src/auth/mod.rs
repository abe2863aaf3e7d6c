//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: the credential and role, restored from and persisted to
//!   durable storage
//! - `KeyValueStorage`: storage backends for the session record (files, the
//!   OS keychain, or memory)
//! - `extract_login_credentials`: credential and role lookup in login
//!   responses of varying shape
//!
//! The session is only changed by adopting a credential after login or by
//! clearing it on logout or authorization failure.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::{extract_login_credentials, LoginCredentials};
pub use session::{SessionState, SessionStore, SharedSession, ADMIN_ROLE, DEFAULT_ROLE};
pub use storage::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage};
