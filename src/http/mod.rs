//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (host, request URL with raw path)
//!     → [routing table picks route and target]
//!     → response.rs (redirect with Location header)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
