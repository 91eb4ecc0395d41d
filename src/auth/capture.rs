//! In-page request recording.
//!
//! The browser strategy installs [`REQUEST_RECORDER_JS`] on every new
//! document. It wraps `fetch` and `XMLHttpRequest` and appends each
//! outgoing request's URL and `Authorization` header to
//! `window.__rsmCaptured`, which [`READ_CAPTURED_JS`] returns.

use serde::Deserialize;
use serde_json::Value;

use crate::core::BearerToken;

/// Script installed with `Page.addScriptToEvaluateOnNewDocument`.
pub const REQUEST_RECORDER_JS: &str = include_str!("request_recorder.js");

/// Script returning the recorded requests.
pub const READ_CAPTURED_JS: &str = "return window.__rsmCaptured || [];";

/// URL marker of the calls whose token is wanted.
pub const GRAPHQL_MARKER: &str = "graphql";

/// One recorded outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CapturedRequest {
    pub url: String,
    #[serde(default)]
    pub authorization: Option<String>,
}

/// Decode the value returned by [`READ_CAPTURED_JS`].
///
/// Entries that do not match the expected shape are skipped.
#[must_use]
pub fn parse_captured(value: &Value) -> Vec<CapturedRequest> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// First request to a GraphQL URL that carried `Authorization: Bearer …`.
#[must_use]
pub fn select_bearer(requests: &[CapturedRequest]) -> Option<BearerToken> {
    requests
        .iter()
        .filter(|r| r.url.to_lowercase().contains(GRAPHQL_MARKER))
        .find_map(|r| {
            r.authorization
                .as_deref()
                .and_then(BearerToken::from_authorization_header)
        })
}
