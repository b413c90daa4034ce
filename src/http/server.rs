//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router sending every method and path to the proxy handler
//! - Wire up middleware (HTTP trace spans)
//! - Serve connections concurrently with connect info for X-Forwarded-For
//! - Stop accepting on shutdown and drain in-flight exchanges

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::proxy::ReverseProxy;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ReverseProxy>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let state = AppState {
            proxy: Arc::new(ReverseProxy::new(&config)?),
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.url,
            special_path = %self.config.rewrite.special_path,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The router without a listener, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Logs the exchange, hands it to the proxy engine and records metrics.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .unwrap_or("-")
        .to_string();

    let span = tracing::info_span!(
        "proxy",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        tracing::info!(host = %host, "Proxying request");

        let response = state.proxy.serve(request).await;

        metrics::record_request(&method, response.status().as_u16(), start_time);
        tracing::debug!(
            status = %response.status(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Exchange complete"
        );
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let mut config = ProxyConfig::default();
        config.upstream.url = format!("http://{}", addr);
        let server = HttpServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/6/t4/dev_device_info").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.starts_with(b"Proxy error: upstream request failed"));
    }

    #[test]
    fn invalid_upstream_is_rejected() {
        let mut config = ProxyConfig::default();
        config.upstream.url = "not a url".into();

        assert!(matches!(
            HttpServer::new(config),
            Err(ProxyError::InvalidUpstream { .. })
        ));
    }
}
