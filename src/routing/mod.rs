//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route table text ("route add ...")
//!     → parse.rs (commands)
//!     → router.rs (Table of routes, each holding Arc<Target>s)
//!
//! Incoming Request (host, encoded path)
//!     → router.rs (lookup, matcher.rs conditions)
//!     → Route::pick_target
//!     → target.rs (build redirect URL for this request)
//! ```
//!
//! # Design Decisions
//! - Table built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Targets are shared read-only; per-request results are returned, never stored

pub mod matcher;
pub mod parse;
pub mod router;
pub mod target;

pub use parse::ParseError;
pub use router::{Route, Table};
pub use target::Target;
