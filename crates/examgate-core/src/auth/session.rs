use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::storage::KeyValueStorage;

/// Storage key holding the persisted session record
const STORAGE_KEY: &str = "auth_state";

/// Role adopted when a login response does not name one.
pub const DEFAULT_ROLE: &str = "user";

pub const ADMIN_ROLE: &str = "admin";

/// Session store shared between the API client and its callers.
pub type SharedSession = Arc<RwLock<SessionStore>>;

/// Current authentication state.
///
/// A session is authenticated exactly when it holds a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    credential: Option<String>,
    role: Option<String>,
}

impl SessionState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(ADMIN_ROLE)
    }
}

/// On-disk shape of a remembered session.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSessionRecord {
    #[serde(rename = "token", alias = "credential", default)]
    credential: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Owns the authentication state and its persisted copy.
///
/// State changes only through [`SessionStore::adopt`] and
/// [`SessionStore::clear`]. Neither operation fails: storage errors are logged
/// and the in-memory state still changes.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    state: SessionState,
}

impl SessionStore {
    /// Restore the session from storage.
    ///
    /// An absent, unparsable or credential-less record yields the empty session.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let state = Self::read_record(storage.as_ref()).unwrap_or_default();
        debug!(authenticated = state.is_authenticated(), "Session loaded");
        Self { storage, state }
    }

    fn read_record(storage: &dyn KeyValueStorage) -> Option<SessionState> {
        let raw = storage.get(STORAGE_KEY)?;
        let record: PersistedSessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt session record");
                return None;
            }
        };
        let credential = record.credential.filter(|c| !c.is_empty())?;
        Some(SessionState {
            credential: Some(credential),
            role: record.role,
        })
    }

    /// Wrap the store for sharing with an [`crate::api::ApiClient`].
    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    /// Become authenticated with `credential`.
    ///
    /// With `persist` the record is written to storage; without it any
    /// previously remembered record is removed so no stale copy survives.
    pub fn adopt(&mut self, credential: &str, role: Option<&str>, persist: bool) {
        if credential.is_empty() {
            warn!("Refusing to adopt an empty credential");
            return;
        }

        self.state = SessionState {
            credential: Some(credential.to_string()),
            role: role.map(str::to_string),
        };

        if persist {
            let record = PersistedSessionRecord {
                credential: self.state.credential.clone(),
                role: self.state.role.clone(),
            };
            match serde_json::to_string(&record) {
                Ok(json) => {
                    if let Err(e) = self.storage.set(STORAGE_KEY, &json) {
                        warn!(error = %e, "Failed to persist session");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to encode session record"),
            }
        } else {
            self.remove_record();
        }

        info!(role = ?self.state.role, persisted = persist, "Session adopted");
    }

    /// Reset to the empty session and forget any persisted record.
    pub fn clear(&mut self) {
        if self.state.is_authenticated() {
            info!("Session cleared");
        }
        self.state = SessionState::empty();
        self.remove_record();
    }

    fn remove_record(&self) {
        if let Err(e) = self.storage.remove(STORAGE_KEY) {
            warn!(error = %e, "Failed to remove persisted session");
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn credential(&self) -> Option<&str> {
        self.state.credential()
    }

    pub fn role(&self) -> Option<&str> {
        self.state.role()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }
}
