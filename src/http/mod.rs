//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request logging, metrics)
//!     → proxy.rs (engine: header hygiene, single upstream attempt, 502 mapping)
//!         → headers.rs (hop-by-hop removal, X-Forwarded-For)
//!         → director.rs (retarget to upstream)
//!         → rewriter.rs (special-path JSON rewrite, re-framing)
//!     → Send to client
//! ```

pub mod director;
pub mod headers;
pub mod proxy;
pub mod rewriter;
pub mod server;

pub use director::Director;
pub use proxy::ReverseProxy;
pub use rewriter::ResponseRewriter;
pub use server::HttpServer;
