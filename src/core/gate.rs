// src/core/gate.rs

//! The front door: address screening, credential verification, and the
//! per-request authorization decision, in that order.

use crate::config::Config;
use crate::core::auth::registry::{RootCredentials, UserRegistry};
use crate::core::auth::store::UserStore;
use crate::core::auth::user::ROOT_USERNAME;
use crate::core::engine::DecisionEngine;
use crate::core::ipgate::{IpGate, IpVerdict};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// The outcome handed to the request-filtering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request to the search service.
    Allow,
    /// Reject with the given reason; the request touched something the user
    /// does not hold a filter for.
    Forbidden(String),
    /// Credentials were missing, malformed, or wrong.
    Unauthenticated,
    /// The user registry has not finished loading; the client may retry.
    ServiceUnavailable,
}

/// Authorizes requests against the user registry. One gate instance is
/// shared across all request-handling tasks; every method is `&self`.
pub struct AuthGate {
    engine: DecisionEngine,
    ipgate: IpGate,
    registry: Arc<UserRegistry>,
    store: Arc<dyn UserStore>,
}

impl AuthGate {
    pub fn new(config: &Config, store: Arc<dyn UserStore>) -> Self {
        let root = match &config.root.password_sha256 {
            Some(hash) => RootCredentials::from_hash(hash),
            None => RootCredentials::new(&config.root.password),
        };
        let registry = Arc::new(UserRegistry::new(root));
        Self {
            engine: DecisionEngine::new(config.allow_explicit_index),
            ipgate: IpGate::from_config(&config.ip),
            registry,
            store,
        }
    }

    /// The registry backing this gate; admin surfaces share it so their
    /// writes become visible to in-flight authorization immediately.
    pub fn registry(&self) -> Arc<UserRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn store(&self) -> Arc<dyn UserStore> {
        Arc::clone(&self.store)
    }

    /// Authorizes one request.
    ///
    /// `authorization` is the raw HTTP `Authorization` header, if any;
    /// `api_name` is the first meta segment of the path (empty when the
    /// path names no API); `body` is only consulted for body-inspecting
    /// APIs.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        remote_address: IpAddr,
        request_path: &str,
        api_name: &str,
        body: Option<&str>,
    ) -> Decision {
        match self.ipgate.classify(remote_address) {
            IpVerdict::Allowed => return Decision::Allow,
            IpVerdict::Denied => {
                info!("denied address {remote_address}: {request_path}");
                return Decision::Forbidden("address is deny-listed".to_string());
            }
            IpVerdict::Unknown => {}
        }

        let Some((username, password)) = authorization.and_then(parse_basic_credentials) else {
            info!("{remote_address} missing credentials: {request_path}");
            return Decision::Unauthenticated;
        };

        // Root resolves from configuration alone; everyone else needs a
        // loaded registry. The first request after startup (or after a
        // failed reload) triggers the retry.
        if username != ROOT_USERNAME && !self.registry.is_ready() {
            if let Err(e) = self.registry.reload(self.store.as_ref()).await {
                warn!("registry initialization failed: {e}");
            }
            if !self.registry.is_ready() {
                return Decision::ServiceUnavailable;
            }
        }

        let Some(user) = self.registry.authenticate(&username, &password) else {
            info!("invalid user: {request_path}");
            return Decision::Unauthenticated;
        };

        if self.engine.is_allowed(&user, request_path, api_name, body) {
            Decision::Allow
        } else {
            info!("forbidden path: {request_path}");
            Decision::Forbidden(format!("user {username} may not access {request_path}"))
        }
    }
}

/// Parses an HTTP Basic `Authorization` header into a username/password
/// pair. Anything unparseable is treated as absent credentials.
fn parse_basic_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_credentials_round_trip() {
        let header = format!("Basic {}", BASE64.encode("alice:s3cret"));
        assert_eq!(
            parse_basic_credentials(&header),
            Some(("alice".to_string(), "s3cret".to_string()))
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert_eq!(parse_basic_credentials("Bearer abc"), None);
        assert_eq!(parse_basic_credentials("Basic !!!"), None);
        let no_colon = format!("Basic {}", BASE64.encode("alice"));
        assert_eq!(parse_basic_credentials(&no_colon), None);
        let empty_user = format!("Basic {}", BASE64.encode(":password"));
        assert_eq!(parse_basic_credentials(&empty_user), None);
    }
}
