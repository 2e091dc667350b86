//! In-memory identity store.
//!
//! Each identity sits behind its own mutex; the map itself is only
//! read-locked on the hot path. A compare-and-swap therefore holds exactly
//! one identity's lock, and refreshes for different identities proceed in
//! parallel.

use crate::error::TokenError;
use crate::refresh::state::RefreshTokenState;
use crate::storage::{Identity, IdentityStore};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// [`IdentityStore`] backed by a map of per-identity mutexes.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, Arc<Mutex<Identity>>>>,
}

impl InMemoryIdentityStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an identity.
    pub fn insert(&self, identity: Identity) {
        let id = identity.id.clone();
        self.identities
            .write()
            .insert(id, Arc::new(Mutex::new(identity)));
    }

    /// Remove `id`, returning its last state.
    pub fn remove(&self, id: &str) -> Option<Identity> {
        self.identities
            .write()
            .remove(id)
            .as_deref()
            .map(|entry| entry.lock().clone())
    }

    /// Current refresh-token state of `id`.
    pub fn refresh_state(&self, id: &str) -> Option<RefreshTokenState> {
        self.entry(id).as_deref().map(|entry| entry.lock().refresh.clone())
    }

    /// Number of identities.
    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    /// Whether the store holds no identities.
    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }

    fn entry(&self, id: &str) -> Option<Arc<Mutex<Identity>>> {
        self.identities.read().get(id).cloned()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Identity>, TokenError> {
        Ok(self.entry(id).as_deref().map(|entry| entry.lock().clone()))
    }

    fn roles(&self, identity: &Identity) -> Result<Vec<String>, TokenError> {
        Ok(self
            .entry(&identity.id)
            .as_deref()
            .map_or_else(|| identity.roles.clone(), |entry| entry.lock().roles.clone()))
    }

    fn compare_and_set_refresh_token(
        &self,
        id: &str,
        expected: Option<&str>,
        new_value: Option<&str>,
        new_expiry: Option<DateTime<Utc>>,
    ) -> Result<bool, TokenError> {
        let Some(entry) = self.entry(id) else {
            return Ok(false);
        };

        let mut identity = entry.lock();
        if !identity.refresh.matches(expected) {
            debug!(identity_id = %id, version = identity.refresh.version, "Refresh token compare-and-set lost");
            return Ok(false);
        }

        identity
            .refresh
            .replace(new_value.map(str::to_string), new_expiry);
        Ok(true)
    }
}
