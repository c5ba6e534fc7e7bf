// src/core/auth/admin.rs

//! Administrative operations over the persistent user store.
//!
//! Every successful write triggers a full registry reload, so request-path
//! decisions pick up admin changes without any per-request store traffic.

use crate::core::auth::registry::UserRegistry;
use crate::core::auth::store::UserStore;
use crate::core::auth::user::{AuthUser, ALL_INDICES_FILTER, ROOT_USERNAME};
use crate::core::FenceError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Admin surface: create, mutate, and delete users. The reserved root user
/// is rejected by every operation here.
pub struct UserAdmin {
    store: Arc<dyn UserStore>,
    registry: Arc<UserRegistry>,
}

impl UserAdmin {
    pub fn new(store: Arc<dyn UserStore>, registry: Arc<UserRegistry>) -> Self {
        Self { store, registry }
    }

    /// All stored users as a JSON array, hashes included. Root is never in
    /// the store and so never in this listing.
    pub async fn list_users(&self) -> Result<String, FenceError> {
        let users = self.store.list_all().await?;
        serde_json::to_string(&users).map_err(|e| FenceError::Internal(e.to_string()))
    }

    pub async fn create_user(
        &self,
        username: &str,
        raw_password: &str,
    ) -> Result<String, FenceError> {
        let username = normalize_username(username)?;
        if self.store.get(&username).await?.is_some() {
            return Err(FenceError::UserExists(username));
        }
        let user = AuthUser::new(&username, raw_password);
        self.put_and_reload(&user).await?;
        Ok(format!("user created: {username}"))
    }

    /// Merges comma-separated filters into the user's existing set.
    pub async fn add_filters(&self, username: &str, filters: &str) -> Result<String, FenceError> {
        let username = normalize_username(username)?;
        let mut user = self.require_user(&username).await?;
        user.filters.extend(clean_filters(filters));
        self.put_and_reload(&user).await?;
        Ok(format!("filters added: {username}"))
    }

    /// Replaces the user's filter set wholesale.
    pub async fn replace_filters(
        &self,
        username: &str,
        filters: &str,
    ) -> Result<String, FenceError> {
        let username = normalize_username(username)?;
        let mut user = self.require_user(&username).await?;
        user.filters = clean_filters(filters);
        self.put_and_reload(&user).await?;
        Ok(format!("filters replaced: {username}"))
    }

    /// Password-checked removal of a single filter.
    pub async fn remove_filter(
        &self,
        username: &str,
        raw_password: &str,
        filter: &str,
    ) -> Result<String, FenceError> {
        let username = normalize_username(username)?;
        let mut user = self.require_user(&username).await?;
        if !user.verify_password(raw_password) {
            return Err(FenceError::InvalidCredentials);
        }
        let filter = prefixed(filter.trim().to_lowercase());
        if !user.filters.remove(&filter) {
            return Err(FenceError::InvalidRequest(format!(
                "user {username} does not hold filter {filter}"
            )));
        }
        self.put_and_reload(&user).await?;
        Ok(format!("filter removed: {username}"))
    }

    pub async fn change_password(
        &self,
        username: &str,
        old_raw_password: &str,
        new_raw_password: &str,
    ) -> Result<String, FenceError> {
        let username = normalize_username(username)?;
        let mut user = self.require_user(&username).await?;
        if !user.verify_password(old_raw_password) {
            return Err(FenceError::InvalidCredentials);
        }
        user.set_password(new_raw_password);
        self.put_and_reload(&user).await?;
        Ok(format!("password changed: {username}"))
    }

    pub async fn delete_user(&self, username: &str) -> Result<String, FenceError> {
        let username = normalize_username(username)?;
        if !self.store.delete(&username).await? {
            return Err(FenceError::UnknownUser(username));
        }
        self.registry.reload(self.store.as_ref()).await?;
        info!("user deleted: {username}");
        Ok(format!("user deleted: {username}"))
    }

    /// Bulk import of already-hashed records. Reserved and invalid names are
    /// skipped; one reload runs at the end.
    pub async fn import_users(&self, records: Vec<AuthUser>) -> Result<String, FenceError> {
        self.store.ensure_exists().await?;
        let mut imported = 0usize;
        for mut record in records {
            record.username = record.username.to_lowercase();
            if record.username.is_empty() || record.username == ROOT_USERNAME {
                continue;
            }
            if self.store.put(&record).await? {
                imported += 1;
            }
        }
        self.registry.reload(self.store.as_ref()).await?;
        Ok(format!("imported {imported} users"))
    }

    async fn require_user(&self, username: &str) -> Result<AuthUser, FenceError> {
        self.store
            .get(username)
            .await?
            .ok_or_else(|| FenceError::UnknownUser(username.to_string()))
    }

    /// Provisions the backing storage, writes the record, and refreshes the
    /// registry so the change is immediately visible to authorization.
    async fn put_and_reload(&self, user: &AuthUser) -> Result<(), FenceError> {
        self.store.ensure_exists().await?;
        if !self.store.put(user).await? {
            return Err(FenceError::StoreUnavailable(format!(
                "write rejected for user {}",
                user.username
            )));
        }
        self.registry.reload(self.store.as_ref()).await?;
        info!("user record written: {}", user.username);
        Ok(())
    }
}

/// Lowercases and screens a username: empty names are invalid and the root
/// name is reserved everywhere.
fn normalize_username(username: &str) -> Result<String, FenceError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(FenceError::InvalidRequest("username must not be empty".into()));
    }
    if username == ROOT_USERNAME {
        return Err(FenceError::ReservedUser(username));
    }
    Ok(username)
}

/// Splits a comma-separated filter list, trims and lowercases each entry,
/// supplies the leading `/`, and drops empties and the root-only `/*`.
fn clean_filters(filters: &str) -> BTreeSet<String> {
    filters
        .split(',')
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .map(prefixed)
        .filter(|f| f != ALL_INDICES_FILTER)
        .collect()
}

fn prefixed(filter: String) -> String {
    if filter.starts_with('/') {
        filter
    } else {
        format!("/{filter}")
    }
}
