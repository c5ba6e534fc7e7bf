// src/core/engine.rs

//! The ordered decision rules that combine an authenticated user, the
//! request path, and (for body-inspecting APIs) the request body into an
//! allow/deny verdict.
//!
//! The engine is a pure function of its inputs: it reads no shared state
//! and performs no I/O. Concurrency is the caller's concern.

use crate::core::auth::user::{AuthUser, ALL_INDICES_FILTER, ROOT_USERNAME};
use crate::core::matcher::FilterMatcher;
use crate::core::path;
use crate::core::request::{ApiKind, RequestExtractor};
use tracing::warn;

/// Well-known dashboard paths reachable with the dashboard filter alone.
const DASHBOARD_PATHS: &[&str] = &["/", "/_nodes", "/_cluster/health/.kibana"];

/// Holding this filter grants the dashboard paths and the dashboard index.
const DASHBOARD_FILTER: &str = "/.kibana";

/// Sentinel for a path that names no index at all.
const NO_INDEX: &str = "/";

pub struct DecisionEngine {
    matcher: FilterMatcher,
    extractor: RequestExtractor,
}

impl DecisionEngine {
    pub fn new(allow_explicit_index: bool) -> Self {
        Self {
            matcher: FilterMatcher::new(),
            extractor: RequestExtractor::new(allow_explicit_index),
        }
    }

    /// Whether `user` may touch everything the request addresses.
    ///
    /// Rules, in order:
    /// 1. Root passes unconditionally.
    /// 2. The all-indices sentinel `/*` is root-only.
    /// 3. The whole normalized path covered by a filter passes (this is
    ///    what admits paths granted verbatim, and what lets a wildcard
    ///    filter cover an index together with its sub-paths).
    /// 4. Well-known dashboard requests pass for holders of the dashboard
    ///    filter.
    /// 5. Body-inspecting APIs are decided by their body: every index named
    ///    there must be covered. Extraction failure denies, never allows.
    /// 6. A path naming no index combined with a non-empty API name denies.
    /// 7. Otherwise every path-derived reference must be covered.
    pub fn is_allowed(
        &self,
        user: &AuthUser,
        request_path: &str,
        api_name: &str,
        body: Option<&str>,
    ) -> bool {
        if user.username == ROOT_USERNAME {
            return true;
        }

        let Ok(path_refs) = self.extractor.refs_from_path(request_path) else {
            warn!("denying unparsable path: {request_path}");
            return false;
        };
        if path_refs.iter().any(|r| r == ALL_INDICES_FILTER) {
            return false;
        }

        // the Ok is guaranteed by the refs_from_path above
        let Ok(normalized) = path::normalize_path(request_path) else {
            return false;
        };
        if self.covered(&normalized, user) {
            return true;
        }

        if is_dashboard_request(request_path) && user.filters.contains(DASHBOARD_FILTER) {
            return true;
        }

        if let Some(kind) = ApiKind::from_api_name(api_name) {
            return match self.extractor.refs_from_body(kind, body.unwrap_or_default()) {
                Ok(body_refs) => self.all_covered(&body_refs, user),
                Err(e) => {
                    warn!("denying {api_name} {request_path}: {e}");
                    false
                }
            };
        }

        if path_refs.iter().any(|r| r == NO_INDEX) && !api_name.is_empty() {
            return false;
        }

        self.all_covered(&path_refs, user)
    }

    fn covered(&self, reference: &str, user: &AuthUser) -> bool {
        user.filters
            .iter()
            .any(|filter| self.matcher.covers(reference, filter))
    }

    fn all_covered(&self, references: &[String], user: &AuthUser) -> bool {
        references
            .iter()
            .all(|reference| self.covered(reference, user))
    }
}

/// Whether the request is one of the fixed dashboard paths or addresses the
/// dashboard index itself.
fn is_dashboard_request(request_path: &str) -> bool {
    if DASHBOARD_PATHS.contains(&request_path) {
        return true;
    }
    matches!(path::resource_ref(request_path), Ok(reference) if reference == DASHBOARD_FILTER)
}
