//! Redirect proxy library.
//!
//! Routes requests through a route table and answers with redirects whose
//! `Location` is built from the target template (`$path` placeholder,
//! `strip` prefix, query carry-over) while keeping the request's
//! percent-encoding intact.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod url;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use routing::{Table, Target};
pub use url::Url;
