//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve wait_for_signal()
//!
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast → server stops accepting → in-flight exchanges drain → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
