// src/core/auth/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// The reserved superuser name. Never persisted, never administered; it is
/// synthesized into every credential snapshot from configuration.
pub const ROOT_USERNAME: &str = "root";

/// The implicit filter granted to the synthesized root user.
pub const ALL_INDICES_FILTER: &str = "/*";

/// A single stored user: identity, one-way password hash, and the wildcard
/// index filters granted to it. Usernames are case-insensitive and stored
/// lowercase.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AuthUser {
    pub username: String,
    /// SHA-256 hex digest of the raw password.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "indices", default)]
    pub filters: BTreeSet<String>,
    #[serde(rename = "created", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    /// A fresh user with no filters.
    pub fn new(username: &str, raw_password: &str) -> Self {
        Self {
            username: username.to_lowercase(),
            password_hash: hash_password(raw_password),
            filters: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// A user restored from an already-hashed record, as the store and the
    /// root synthesizer hold them.
    pub fn restore<I, S>(username: &str, password_hash: &str, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.to_lowercase(),
            password_hash: password_hash.to_string(),
            filters: filters.into_iter().map(Into::into).collect(),
            created_at: Utc::now(),
        }
    }

    /// Constant-shape verification; the caller never learns whether the user
    /// was unknown or the password wrong.
    pub fn verify_password(&self, raw_password: &str) -> bool {
        self.password_hash == hash_password(raw_password)
    }

    pub fn set_password(&mut self, raw_password: &str) {
        self.password_hash = hash_password(raw_password);
    }
}

/// The one-way password hash used for stored records: SHA-256, hex encoded.
pub fn hash_password(raw_password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_sha256_hex() {
        // well-known digest of the empty string
        assert_eq!(
            hash_password(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn usernames_are_lowercased() {
        let user = AuthUser::new("Test_Admin", "secret");
        assert_eq!(user.username, "test_admin");
        assert!(user.verify_password("secret"));
        assert!(!user.verify_password("wrong"));
    }
}
