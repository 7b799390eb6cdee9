//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → logging.rs (filter + formatter installed at startup)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID (x-request-id) recorded on every request event

pub mod logging;
