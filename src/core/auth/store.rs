// src/core/auth/store.rs

//! The persistence seam for user records.
//!
//! The authoritative copy of every user lives in a reserved index of the
//! fronted search service itself; [`HttpUserStore`] talks to it over HTTP.
//! [`MemoryUserStore`] backs tests and embedded use.

use crate::config::StoreConfig;
use crate::core::auth::user::AuthUser;
use crate::core::FenceError;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn};
use url::Url;

/// The persistent user-record collaborator. All I/O failures surface as
/// [`FenceError::StoreUnavailable`]; the registry keeps its previous
/// snapshot in that case.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every stored user record.
    async fn list_all(&self) -> Result<Vec<AuthUser>, FenceError>;

    /// One record by lowercase username, if present.
    async fn get(&self, username: &str) -> Result<Option<AuthUser>, FenceError>;

    /// Creates or replaces a record. Returns whether the write was accepted.
    async fn put(&self, user: &AuthUser) -> Result<bool, FenceError>;

    /// Removes a record. Returns whether it existed.
    async fn delete(&self, username: &str) -> Result<bool, FenceError>;

    /// Idempotently provisions the backing storage.
    async fn ensure_exists(&self) -> Result<bool, FenceError>;
}

/// Stores user records as documents in a reserved index of the search
/// service, one document per user, keyed by username. Writes request an
/// immediate refresh so a follow-up reload sees them.
pub struct HttpUserStore {
    client: reqwest::Client,
    base: Url,
    index: String,
}

impl HttpUserStore {
    pub fn new(config: &StoreConfig) -> Result<Self, FenceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        // relative joins below require a trailing slash on the base path
        let mut base = config.url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(Self {
            client,
            base,
            index: config.index.clone(),
        })
    }

    fn index_url(&self) -> Result<Url, FenceError> {
        Ok(self.base.join(&self.index)?)
    }

    fn doc_url(&self, username: &str) -> Result<Url, FenceError> {
        Ok(self
            .base
            .join(&format!("{}/_doc/{}", self.index, username))?)
    }
}

#[async_trait]
impl UserStore for HttpUserStore {
    async fn list_all(&self) -> Result<Vec<AuthUser>, FenceError> {
        let url = self.base.join(&format!("{}/_search", self.index))?;
        let response = self
            .client
            .post(url)
            .query(&[("size", "1000")])
            .json(&json!({ "query": { "match_all": {} } }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FenceError::StoreUnavailable(format!(
                "user search returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FenceError::StoreUnavailable("user search response has no hits".into())
            })?;

        let mut users = Vec::with_capacity(hits.len());
        for hit in hits {
            let source = hit.get("_source").cloned().ok_or_else(|| {
                FenceError::StoreUnavailable("user document has no source".into())
            })?;
            match serde_json::from_value::<AuthUser>(source) {
                Ok(user) => users.push(user),
                // a corrupt record must not take the whole registry down
                Err(e) => warn!("skipping undecodable user record: {e}"),
            }
        }
        debug!("loaded {} user records", users.len());
        Ok(users)
    }

    async fn get(&self, username: &str) -> Result<Option<AuthUser>, FenceError> {
        let response = self.client.get(self.doc_url(username)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FenceError::StoreUnavailable(format!(
                "user fetch returned {}",
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        match body.get("_source") {
            Some(source) => Ok(Some(serde_json::from_value(source.clone()).map_err(
                |e| FenceError::StoreUnavailable(format!("undecodable user record: {e}")),
            )?)),
            None => Ok(None),
        }
    }

    async fn put(&self, user: &AuthUser) -> Result<bool, FenceError> {
        let response = self
            .client
            .put(self.doc_url(&user.username)?)
            .query(&[("refresh", "true")])
            .json(user)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn delete(&self, username: &str) -> Result<bool, FenceError> {
        let response = self
            .client
            .delete(self.doc_url(username)?)
            .query(&[("refresh", "true")])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Ok(response.status().is_success())
    }

    async fn ensure_exists(&self) -> Result<bool, FenceError> {
        let head = self.client.head(self.index_url()?).send().await?;
        if head.status().is_success() {
            return Ok(true);
        }
        let created = self.client.put(self.index_url()?).send().await?;
        Ok(created.status().is_success())
    }
}

/// In-process store for tests and embedding. `set_unavailable` simulates a
/// collaborator outage.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, AuthUser>>,
    unavailable: AtomicBool,
    provisioned: AtomicUsize,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// How many times the storage has been provisioned.
    pub fn provision_count(&self) -> usize {
        self.provisioned.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), FenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FenceError::StoreUnavailable(
                "memory store marked unavailable".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_all(&self) -> Result<Vec<AuthUser>, FenceError> {
        self.check_available()?;
        Ok(self.users.lock().values().cloned().collect())
    }

    async fn get(&self, username: &str) -> Result<Option<AuthUser>, FenceError> {
        self.check_available()?;
        Ok(self.users.lock().get(username).cloned())
    }

    async fn put(&self, user: &AuthUser) -> Result<bool, FenceError> {
        self.check_available()?;
        self.users
            .lock()
            .insert(user.username.clone(), user.clone());
        Ok(true)
    }

    async fn delete(&self, username: &str) -> Result<bool, FenceError> {
        self.check_available()?;
        Ok(self.users.lock().remove(username).is_some())
    }

    async fn ensure_exists(&self) -> Result<bool, FenceError> {
        self.check_available()?;
        self.provisioned.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
