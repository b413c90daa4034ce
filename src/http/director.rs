//! Request retargeting to the fixed upstream.
//!
//! The director swaps the scheme, authority and `Host` header of every
//! request for the upstream's. Path, query, method, body and every other
//! header are left exactly as the client sent them.

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Uri};

use crate::error::ProxyError;

#[derive(Debug, Clone)]
pub struct Director {
    scheme: Scheme,
    authority: Authority,
    host: HeaderValue,
}

impl Director {
    /// Build a director for `upstream` (`scheme://host[:port]`). Any path on the URL is ignored.
    pub fn new(upstream: &str) -> Result<Self, ProxyError> {
        let invalid = |reason: String| ProxyError::InvalidUpstream {
            url: upstream.to_string(),
            reason,
        };

        let uri: Uri = upstream.parse().map_err(|e| invalid(format!("{}", e)))?;
        let scheme = uri
            .scheme()
            .cloned()
            .ok_or_else(|| invalid("missing scheme".into()))?;
        let host = uri.host().ok_or_else(|| invalid("missing host".into()))?;

        // Rebuilt from host and port so that userinfo never reaches the Host header.
        let host_port = match uri.port_u16() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority =
            Authority::try_from(host_port.as_str()).map_err(|e| invalid(format!("{}", e)))?;
        let host = HeaderValue::from_str(authority.as_str()).map_err(|e| invalid(format!("{}", e)))?;

        Ok(Self {
            scheme,
            authority,
            host,
        })
    }

    /// Point `request` at the upstream.
    pub fn direct<B>(&self, request: &mut Request<B>) {
        let mut parts = request.uri().clone().into_parts();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }

        match Uri::from_parts(parts) {
            Ok(uri) => *request.uri_mut() = uri,
            Err(e) => tracing::warn!(error = %e, uri = %request.uri(), "Could not retarget request URI"),
        }

        request.headers_mut().insert(header::HOST, self.host.clone());
    }

    /// Upstream `host[:port]`.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}
