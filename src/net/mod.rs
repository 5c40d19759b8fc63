//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! bind address (config)
//!     → listener.rs (parse, bind)
//!     → TcpListener handed to the HTTP server
//! ```

pub mod listener;

pub use listener::bind;
