// src/core/auth/registry.rs

//! In-memory credential snapshots with atomic wholesale replacement.
//!
//! Readers hold an `Arc` to a complete, immutable snapshot; a reload builds
//! the next snapshot off to the side (including the store fetch, with no
//! lock held) and swaps the shared pointer at the very end. A reader
//! therefore sees either the fully-old or the fully-new registry, never a
//! mixture.

use crate::core::auth::store::UserStore;
use crate::core::auth::user::{hash_password, AuthUser, ALL_INDICES_FILTER, ROOT_USERNAME};
use crate::core::FenceError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// The out-of-band root credentials. Root never lives in the persistent
/// store; it is re-synthesized into every snapshot from configuration.
#[derive(Debug, Clone)]
pub struct RootCredentials {
    password_hash: String,
}

impl RootCredentials {
    pub fn new(raw_password: &str) -> Self {
        Self {
            password_hash: hash_password(raw_password),
        }
    }

    /// From an already-computed SHA-256 hex digest. Stored digests are
    /// lowercase, so the comparison form is fixed here.
    pub fn from_hash(password_hash: &str) -> Self {
        Self {
            password_hash: password_hash.to_lowercase(),
        }
    }
}

/// An immutable point-in-time mapping of lowercase username to user.
#[derive(Debug, Default, Clone)]
pub struct CredentialSnapshot {
    users: HashMap<String, AuthUser>,
}

impl CredentialSnapshot {
    pub fn from_users(users: Vec<AuthUser>) -> Self {
        let mut map = HashMap::with_capacity(users.len());
        for mut user in users {
            user.username = user.username.to_lowercase();
            map.insert(user.username.clone(), user);
        }
        Self { users: map }
    }

    pub fn get(&self, username: &str) -> Option<&AuthUser> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Adds the synthesized root user to a freshly built snapshot, displacing
/// any persisted record that claims the reserved name. Root always carries
/// the implicit all-indices filter.
pub fn with_root(mut snapshot: CredentialSnapshot, root: &RootCredentials) -> CredentialSnapshot {
    snapshot.users.insert(
        ROOT_USERNAME.to_string(),
        AuthUser::restore(ROOT_USERNAME, &root.password_hash, [ALL_INDICES_FILTER]),
    );
    snapshot
}

/// The atomically-refreshed registry of all users.
pub struct UserRegistry {
    snapshot: RwLock<Arc<CredentialSnapshot>>,
    ready: AtomicBool,
    root: RootCredentials,
}

impl UserRegistry {
    /// A registry that can resolve root from the start; everything else
    /// waits for the first successful [`reload`](Self::reload).
    pub fn new(root: RootCredentials) -> Self {
        let initial = with_root(CredentialSnapshot::default(), &root);
        Self {
            snapshot: RwLock::new(Arc::new(initial)),
            ready: AtomicBool::new(false),
            root,
        }
    }

    /// False until one reload has completed successfully. While not ready,
    /// non-root requests must receive a retryable unavailable signal.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The snapshot currently in use. Decisions made against it stay
    /// internally consistent even if a reload swaps the registry mid-request.
    pub fn snapshot(&self) -> Arc<CredentialSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Verifies a username/password pair against the current snapshot.
    /// Unknown user and wrong password are indistinguishable to the caller.
    pub fn authenticate(&self, username: &str, raw_password: &str) -> Option<AuthUser> {
        let snapshot = self.snapshot();
        let user = snapshot.get(&username.to_lowercase())?;
        user.verify_password(raw_password).then(|| user.clone())
    }

    /// Fetches the full user list and replaces the active snapshot. The
    /// fetch runs without any lock; only the final pointer swap takes the
    /// write lock. On failure the previous snapshot and readiness are kept,
    /// and the next caller-triggered access retries.
    pub async fn reload(&self, store: &dyn UserStore) -> Result<(), FenceError> {
        let users = match store.list_all().await {
            Ok(users) => users,
            Err(e) => {
                warn!("user registry reload failed, keeping previous snapshot: {e}");
                return Err(e);
            }
        };

        let next = with_root(CredentialSnapshot::from_users(users), &self.root);
        let count = next.len();
        *self.snapshot.write() = Arc::new(next);
        self.ready.store(true, Ordering::Release);
        info!("user registry reloaded: {count} users");
        Ok(())
    }
}
