// src/core/request.rs

//! Extraction of the index references a request touches.
//!
//! Three API kinds carry index names inside the request body rather than in
//! the path: bulk, multi-get, and multi-search. Each uses a different body
//! encoding, and none of them has a schema, so extraction is structural. Any
//! malformed body is an error; the caller must deny, never allow.

use crate::core::path;
use crate::core::FenceError;
use serde_json::Value;

/// The body-inspecting API kinds. Every other API is authorized from the
/// path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Bulk,
    MultiGet,
    MultiSearch,
}

impl ApiKind {
    /// Resolves an API name (the first meta path segment) to a kind, or
    /// `None` for path-only APIs.
    pub fn from_api_name(api_name: &str) -> Option<Self> {
        match api_name {
            "_bulk" => Some(ApiKind::Bulk),
            "_mget" => Some(ApiKind::MultiGet),
            "_msearch" => Some(ApiKind::MultiSearch),
            _ => None,
        }
    }
}

/// Extracts the set of index references a request touches, from its path and
/// (for body-inspecting APIs) its body.
#[derive(Debug)]
pub struct RequestExtractor {
    /// When false, any body carrying an explicit index field is rejected.
    allow_explicit_index: bool,
}

impl RequestExtractor {
    pub fn new(allow_explicit_index: bool) -> Self {
        Self {
            allow_explicit_index,
        }
    }

    /// Index references named by the request path (see [`path::resource_refs`]).
    pub fn refs_from_path(&self, request_path: &str) -> Result<Vec<String>, FenceError> {
        path::resource_refs(request_path)
    }

    /// Index references named by the body of a body-inspecting API, in
    /// first-seen order without duplicates.
    pub fn refs_from_body(&self, kind: ApiKind, body: &str) -> Result<Vec<String>, FenceError> {
        match kind {
            ApiKind::Bulk => self.bulk_refs(body),
            ApiKind::MultiGet => self.multi_get_refs(body),
            ApiKind::MultiSearch => self.multi_search_refs(body),
        }
    }

    /// Bulk bodies alternate newline-delimited action and source lines. The
    /// action object's single entry may carry an `_index` override; `delete`
    /// actions have no source line.
    fn bulk_refs(&self, body: &str) -> Result<Vec<String>, FenceError> {
        let mut refs = Vec::new();
        let mut lines = body.lines();
        while let Some(line) = lines.next() {
            if line.trim().is_empty() {
                continue;
            }
            let action: Value = serde_json::from_str(line)?;
            let action = action
                .as_object()
                .ok_or_else(|| FenceError::BodyParse("bulk action is not an object".into()))?;
            let Some((name, params)) = action.iter().next() else {
                continue;
            };

            if let Some(index) = params.get("_index") {
                self.record_explicit(&mut refs, index, "bulk")?;
            }

            if name != "delete" {
                // consume the action's source line
                if lines.next().is_none() {
                    break;
                }
            }
        }
        Ok(refs)
    }

    /// Multi-get bodies are a single JSON object whose `docs` array elements
    /// may each carry an `_index` override.
    fn multi_get_refs(&self, body: &str) -> Result<Vec<String>, FenceError> {
        let document: Value = serde_json::from_str(body)?;
        let mut refs = Vec::new();
        if let Some(docs) = document.get("docs") {
            let docs = docs
                .as_array()
                .ok_or_else(|| FenceError::BodyParse("docs is not an array".into()))?;
            for element in docs {
                let element = element.as_object().ok_or_else(|| {
                    FenceError::BodyParse("docs array element should include an object".into())
                })?;
                if let Some(index) = element.get("_index") {
                    self.record_explicit(&mut refs, index, "multi get")?;
                }
            }
        }
        Ok(refs)
    }

    /// Multi-search bodies alternate newline-delimited header and body
    /// lines; the header's `index` or `indices` field is a string or an
    /// array of strings. An empty first line is tolerated.
    fn multi_search_refs(&self, body: &str) -> Result<Vec<String>, FenceError> {
        let mut refs = Vec::new();
        let mut lines = body.lines();
        let mut offset = 0usize;
        while let Some(header) = lines.next() {
            // support a first line holding only "\n"
            if offset == 0 && header.is_empty() {
                offset += 1;
                continue;
            }
            offset += 1;

            if !header.trim().is_empty() {
                let header: Value = serde_json::from_str(header)?;
                let header = header.as_object().ok_or_else(|| {
                    FenceError::BodyParse("search header is not an object".into())
                })?;
                for (key, value) in header {
                    if key == "index" || key == "indices" {
                        if !self.allow_explicit_index {
                            return Err(FenceError::ExplicitIndexDisallowed(
                                "multi search".to_string(),
                            ));
                        }
                        for index in string_array(value)? {
                            push_unique(&mut refs, format!("/{index}"));
                        }
                    }
                }
            }

            // consume the header's matching body line
            if lines.next().is_none() {
                break;
            }
            offset += 1;
        }
        Ok(refs)
    }

    /// Records one explicit index mention, enforcing the configuration gate
    /// and first-seen-order deduplication.
    fn record_explicit(
        &self,
        refs: &mut Vec<String>,
        index: &Value,
        api_label: &str,
    ) -> Result<(), FenceError> {
        if !self.allow_explicit_index {
            return Err(FenceError::ExplicitIndexDisallowed(api_label.to_string()));
        }
        let index = index.as_str().ok_or_else(|| {
            FenceError::BodyParse(format!("explicit index in {api_label} is not a string"))
        })?;
        push_unique(refs, format!("/{index}"));
        Ok(())
    }
}

fn push_unique(refs: &mut Vec<String>, reference: String) {
    if !refs.contains(&reference) {
        refs.push(reference);
    }
}

/// Accepts a JSON string or array of strings; anything else is malformed.
fn string_array(value: &Value) -> Result<Vec<String>, FenceError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    FenceError::BodyParse("index array element is not a string".into())
                })
            })
            .collect(),
        _ => Err(FenceError::BodyParse(
            "index field is neither a string nor an array".into(),
        )),
    }
}
