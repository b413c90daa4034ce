//! Reverse proxy engine.
//!
//! # Data Flow
//! ```text
//! client request
//!     → strip hop-by-hop headers, append X-Forwarded-For
//!     → Director (scheme/authority/Host → upstream)
//!     → one upstream attempt, bounded by the upstream timeout
//!     → strip hop-by-hop headers from the response
//!     → ResponseRewriter (special path only)
//!     → client response, or 502 on any failure
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, Version};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::director::Director;
use crate::http::headers::{append_forwarded_for, remove_hop_by_hop_headers};
use crate::http::rewriter::ResponseRewriter;
use crate::observability::metrics;

pub struct ReverseProxy {
    client: Client<HttpConnector, Body>,
    director: Director,
    rewriter: ResponseRewriter,
    upstream_timeout: Duration,
}

impl ReverseProxy {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let director = Director::new(&config.upstream.url)?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(config.timeouts.idle_secs))
            .build(connector);

        Ok(Self {
            client,
            director,
            rewriter: ResponseRewriter::new(&config.rewrite),
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        })
    }

    /// Forward one exchange and always produce a response for the client.
    pub async fn serve(&self, request: Request<Body>) -> Response<Body> {
        match self.forward(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, upstream = %self.director.authority(), "Proxy error");
                metrics::record_upstream_error(e.kind());
                e.into_response()
            }
        }
    }

    /// Forward one exchange. No retries: each call is exactly one upstream attempt.
    pub async fn forward(&self, mut request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let path = request.uri().path().to_owned();

        remove_hop_by_hop_headers(request.headers_mut());
        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        if let Some(ip) = client_addr {
            append_forwarded_for(request.headers_mut(), ip);
        }

        self.director.direct(&mut request);
        // The upstream connection is HTTP/1.1 even when the client spoke h2.
        *request.version_mut() = Version::HTTP_11;

        let response: Response<Incoming> =
            tokio::time::timeout(self.upstream_timeout, self.client.request(request))
                .await
                .map_err(|_| ProxyError::UpstreamTimeout(self.upstream_timeout))??;

        tracing::debug!(status = %response.status(), "Upstream responded");

        let (mut parts, body) = response.into_parts();
        remove_hop_by_hop_headers(&mut parts.headers);
        let response = Response::from_parts(parts, Body::new(body));

        self.rewriter.rewrite(&path, response).await
    }
}
