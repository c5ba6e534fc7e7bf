// src/core/matcher.rs

//! Wildcard filter matching between index references and user filters.
//!
//! A filter is a `/`-prefixed string that may contain `*` wildcards. The
//! matching rules are deliberately narrow: when both operands carry a
//! wildcard they are compared as plain strings, never as patterns.

use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

/// Decides whether a user filter covers a concrete index reference.
///
/// Compiled patterns are cached keyed by filter text; filters change rarely,
/// so the cache is effectively write-once per filter.
#[derive(Debug, Default)]
pub struct FilterMatcher {
    cache: RwLock<HashMap<String, Option<Regex>>>,
}

impl FilterMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `filter` covers `resource`.
    ///
    /// Rules, in order:
    /// 1. One leading `/` is stripped from both operands.
    /// 2. Equal stripped strings (including both empty) match.
    /// 3. If exactly one operand is empty, no match.
    /// 4. A filter without `*` only covers the bare-wildcard resource `*`.
    /// 5. A filter with `*` covers a wildcarded resource only on textual
    ///    equality, and a concrete resource when the compiled pattern finds
    ///    a match in it.
    pub fn covers(&self, resource: &str, filter: &str) -> bool {
        let resource = resource.strip_prefix('/').unwrap_or(resource);
        let filter = filter.strip_prefix('/').unwrap_or(filter);

        if resource == filter {
            return true;
        }
        if resource.is_empty() || filter.is_empty() {
            return false;
        }

        if !filter.contains('*') {
            // exact equality was already ruled out above
            return resource == "*";
        }

        if resource.contains('*') {
            // wildcard-vs-wildcard is never partially matched
            return false;
        }

        match self.compiled(filter) {
            Some(re) => re.is_match(resource),
            None => false,
        }
    }

    /// Looks up or compiles the pattern for `filter` (without leading `/`).
    fn compiled(&self, filter: &str) -> Option<Regex> {
        if let Some(entry) = self.cache.read().get(filter) {
            return entry.clone();
        }

        let compiled = match Regex::new(&pattern_for(filter)) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(r#"invalid filter pattern "{}": {}"#, filter, e);
                None
            }
        };
        self.cache
            .write()
            .insert(filter.to_string(), compiled.clone());
        compiled
    }
}

/// Translates a wildcard filter into a search pattern: literal segments are
/// escaped and joined with a non-greedy any-sequence token. The start is
/// anchored unless the filter begins with `*`, and the end is always anchored
/// (with a trailing any-sequence when the filter ends with `*`).
fn pattern_for(filter: &str) -> String {
    let mut pattern = String::with_capacity(filter.len() * 2);
    if !filter.starts_with('*') {
        pattern.push('^');
    }

    let segments: Vec<&str> = filter.split('*').collect();
    for (i, segment) in segments.iter().enumerate() {
        pattern.push_str(&regex::escape(segment));
        if i < segments.len() - 1 {
            pattern.push_str(".*?");
        }
    }

    if filter.ends_with('*') {
        pattern.push_str(".*?$");
    } else {
        pattern.push('$');
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_anchors_follow_wildcard_placement() {
        assert_eq!(pattern_for("test_index*"), "^test_index.*?.*?$");
        assert_eq!(pattern_for("*test_index"), ".*?test_index$");
        assert_eq!(pattern_for("test_*index"), "^test_.*?index$");
    }

    #[test]
    fn literal_segments_are_escaped() {
        let matcher = FilterMatcher::new();
        assert!(!matcher.covers("/testXindex", "/test.index*"));
        assert!(matcher.covers("/test.index1", "/test.index*"));
    }
}
