//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listener.rs (bind configured address)
//!     → tokio TcpListener
//!     → handed to the HTTP server, which accepts and spawns per connection
//! ```

pub mod listener;

pub use listener::{bind, ListenerError};
