//! TCP listener setup.
//!
//! Binding is the one startup step that can fail after configuration is
//! accepted (port already taken, permission denied). Such failures are fatal.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Bind address is not a valid socket address.
    Address(std::net::AddrParseError),
    /// Failed to bind to address.
    Bind(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Address(e) => write!(f, "Invalid bind address: {}", e),
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(ListenerError::Address)?;

    let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;

    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}
