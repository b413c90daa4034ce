//! Response interception for the device info endpoint.
//!
//! Responses to the configured special path are buffered, decoded as a JSON
//! object, have `result.settings.autoWork` forced to `1` when it holds a
//! number, and are re-encoded with fresh framing headers. Every other
//! response streams through untouched.
//!
//! # Outcomes
//! - path differs: response returned as-is, nothing buffered
//! - body is not a JSON object: original bytes returned, headers unchanged
//! - field missing or non-numeric: document re-encoded without mutation
//! - field numeric: document re-encoded with `autoWork = 1`

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Response};
use serde_json::{Map, Number, Value};

use crate::config::RewriteConfig;
use crate::error::ProxyError;
use crate::observability::metrics;

/// Value written into `result.settings.autoWork`.
pub const AUTO_WORK_VALUE: i64 = 1;

/// Result of rewriting a buffered special-path body.
#[derive(Debug, PartialEq)]
pub enum BodyRewrite {
    /// Not a JSON object; the original bytes must be sent unchanged.
    Malformed,
    /// Decoded and re-encoded. `previous` holds the overwritten `autoWork`, if any.
    Encoded { body: Bytes, previous: Option<Number> },
}

#[derive(Debug, Clone)]
pub struct ResponseRewriter {
    special_path: String,
    max_body_bytes: usize,
}

impl ResponseRewriter {
    pub fn new(config: &RewriteConfig) -> Self {
        Self {
            special_path: config.special_path.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Exact, case-sensitive comparison with the special path.
    pub fn applies_to(&self, path: &str) -> bool {
        path == self.special_path
    }

    /// Rewrite `response` if `path` is the special path.
    ///
    /// Errors only when the body cannot be read in full or the rewritten
    /// document cannot be encoded.
    pub async fn rewrite(
        &self,
        path: &str,
        response: Response<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        if !self.applies_to(path) {
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();
        let original = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(ProxyError::BodyRead)?;

        match rewrite_body(&original)? {
            BodyRewrite::Malformed => Ok(Response::from_parts(parts, Body::from(original))),
            BodyRewrite::Encoded { body, .. } => {
                parts.headers.remove(header::TRANSFER_ENCODING);
                parts
                    .headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
                Ok(Response::from_parts(parts, Body::from(body)))
            }
        }
    }
}

/// Decode, patch and re-encode a special-path body.
pub fn rewrite_body(raw: &[u8]) -> Result<BodyRewrite, ProxyError> {
    let mut document: Map<String, Value> = match serde_json::from_slice(raw) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(error = %e, "JSON parse error, passing body through");
            metrics::record_rewrite("malformed");
            return Ok(BodyRewrite::Malformed);
        }
    };

    let previous = force_auto_work(&mut document);
    match &previous {
        Some(prior) => {
            tracing::info!(from = %prior, to = AUTO_WORK_VALUE, "Modifying autoWork");
            metrics::record_rewrite("modified");
        }
        None => metrics::record_rewrite("unchanged"),
    }

    let body = serde_json::to_vec(&document).map_err(ProxyError::Encode)?;
    Ok(BodyRewrite::Encoded {
        body: Bytes::from(body),
        previous,
    })
}

/// Overwrite `result.settings.autoWork` when every level is an object and the
/// leaf is a number. Returns the value that was replaced.
pub fn force_auto_work(document: &mut Map<String, Value>) -> Option<Number> {
    let leaf = document
        .get_mut("result")?
        .as_object_mut()?
        .get_mut("settings")?
        .as_object_mut()?
        .get_mut("autoWork")?;

    let previous = match leaf {
        Value::Number(n) => n.clone(),
        _ => return None,
    };
    *leaf = Value::from(AUTO_WORK_VALUE);
    Some(previous)
}
