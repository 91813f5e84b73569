//! Transcript backend endpoint resolution.
//!
//! The same fetch code runs embedded behind a web origin, inside a hosted serverless
//! deployment, and as a local process. Each context exposes a different set of addresses
//! for the transcript backend, so the fetcher works through an ordered candidate list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Same-origin path of the transcript function
pub const SAME_ORIGIN_PATH: &str = "/api/transcript";

/// Sub-path appended to an explicitly configured backend base
pub const TRANSCRIPT_SUBPATH: &str = "/transcript";

/// Local development transcript service
pub const LOCAL_FALLBACK: &str = "http://localhost:8001/transcript";

/// How to start the local transcript service
pub const LOCAL_START_HINT: &str =
    "start the local transcript service with `python python-api/start.py` (listens on http://localhost:8001)";

/// Deployment facts the resolver needs, independent of where they were read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeContext {
    /// Same-origin base; present when relative paths can be resolved
    pub origin: Option<String>,

    /// Explicitly configured backend base, absolute URL or path-only
    pub backend_base: Option<String>,

    /// Running server-side inside a recognised hosted deployment
    pub hosted: bool,

    /// Deployment hostname provided by the hosting platform
    pub deployment_host: Option<String>,
}

impl RuntimeContext {
    /// Whether relative same-origin paths are usable
    pub fn is_client_like(&self) -> bool {
        self.origin.is_some()
    }
}

/// Ordered, de-duplicated transcript endpoints for the given context.
///
/// Order: same-origin path, configured backend, hosted deployment, local fallback.
pub fn resolve_candidates(context: &RuntimeContext) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);

    if context.is_client_like() {
        candidates.push(SAME_ORIGIN_PATH.to_string());
    }

    if let Some(base) = context.backend_base.as_deref().map(str::trim) {
        if !base.is_empty() {
            candidates.push(transcript_endpoint_for_base(base));
        }
    }

    if context.hosted && !context.is_client_like() {
        if let Some(host) = context.deployment_host.as_deref().and_then(normalize_host) {
            candidates.push(format!("https://{host}{SAME_ORIGIN_PATH}"));
        }
    }

    candidates.push(LOCAL_FALLBACK.to_string());

    dedup_stable(candidates)
}

/// Derive the transcript endpoint from a configured base.
///
/// Path-only bases stay same-origin relative; absolute bases lose a trailing slash.
/// Either way the fixed sub-path is appended.
pub fn transcript_endpoint_for_base(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() {
        // base was "/"
        return TRANSCRIPT_SUBPATH.to_string();
    }
    format!("{trimmed}{TRANSCRIPT_SUBPATH}")
}

/// Base URL of a candidate with the transcript sub-path removed
pub fn service_base(endpoint: &str) -> &str {
    endpoint
        .strip_suffix(TRANSCRIPT_SUBPATH)
        .unwrap_or(endpoint)
        .trim_end_matches('/')
}

fn normalize_host(host: &str) -> Option<&str> {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
        .trim_end_matches('/');

    (!host.is_empty()).then_some(host)
}

fn dedup_stable(candidates: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.clone()))
        .collect()
}
