// src/core/path.rs

//! URL path normalization and index reference extraction.
//!
//! An index reference is the canonical `/`-prefixed first segment of a
//! request path: `/` for the bare root and for meta segments (leading `_`),
//! `/*` for the root-only all-indices path, `/<name>` otherwise.

use crate::core::FenceError;
use once_cell::sync::Lazy;
use url::Url;

/// Base against which request paths are resolved; only the path component of
/// the result is ever used.
static BASE: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/").expect("static base URL"));

/// Marker for meta/administrative path segments, which never name an index.
const META_MARKER: char = '_';

/// Applies RFC 3986 dot-segment normalization to a raw request path.
///
/// `/test_index/test_type/../../*` becomes `/*`, and
/// `/test_index/test_type/../../../` becomes `/`. A missing leading slash is
/// supplied. Unresolvable input is an [`FenceError::InvalidPath`]; callers
/// must treat that as a deny.
pub fn normalize_path(path: &str) -> Result<String, FenceError> {
    // The url crate folds `\` into `/` for http and reads a leading `//` as
    // an authority, swallowing the first segment. Fold the backslashes
    // ourselves and collapse the leading run to a single slash so the input
    // stays a path.
    let folded = path.replace('\\', "/");
    let path = format!("/{}", folded.trim_start_matches('/'));
    let url = BASE
        .join(&path)
        .map_err(|e| FenceError::InvalidPath(format!("{path}: {e}")))?;
    Ok(url.path().to_string())
}

/// The single index reference named by `path`: `/` for the bare root and for
/// meta paths, otherwise `/` plus the first non-empty segment.
pub fn resource_ref(path: &str) -> Result<String, FenceError> {
    let normalized = normalize_path(path)?;
    for segment in normalized.split('/') {
        if segment.is_empty() {
            continue;
        }
        return Ok(ref_from_segment(segment));
    }
    Ok("/".to_string())
}

/// Every index reference named by `path`, in first-seen order without
/// duplicates. A comma in the first segment names several indices at once;
/// each piece is normalized independently.
pub fn resource_refs(path: &str) -> Result<Vec<String>, FenceError> {
    let normalized = normalize_path(path)?;
    let mut first = "";
    for segment in normalized.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment.starts_with(META_MARKER) {
            return Ok(vec!["/".to_string()]);
        }
        first = segment;
        break;
    }

    let mut refs = Vec::new();
    for piece in first.split(',') {
        let reference = ref_from_segment(piece);
        if !refs.contains(&reference) {
            refs.push(reference);
        }
    }
    Ok(refs)
}

/// The first meta segment of the normalized path (the API name, e.g.
/// `_search`), or the empty string when the path names no API.
pub fn api_name(path: &str) -> Result<String, FenceError> {
    let normalized = normalize_path(path)?;
    for segment in normalized.split('/') {
        if segment.starts_with(META_MARKER) {
            return Ok(segment.to_string());
        }
    }
    Ok(String::new())
}

fn ref_from_segment(segment: &str) -> String {
    if segment.starts_with(META_MARKER) {
        "/".to_string()
    } else {
        format!("/{segment}")
    }
}
