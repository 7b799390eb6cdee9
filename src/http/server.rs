//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the redirect handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Dispatch requests to the route table and answer with redirects

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, request_url};
use crate::http::response;
use crate::lifecycle::signals::shutdown_signal;
use crate::routing::Table;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<Table>,
}

/// HTTP server for the redirect proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `table`.
    pub fn new(config: ProxyConfig, table: Table) -> Self {
        let state = AppState {
            table: Arc::new(table),
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(redirect_handler))
            .route("/", any(redirect_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The Axum router, e.g. for driving it without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main handler.
/// Looks up the route, picks a target, and answers with its redirect.
async fn redirect_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(&request);

    let url = match request_url(&request) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(request_id = %request_id, uri = %request.uri(), error = %e, "Invalid request path");
            return (StatusCode::BAD_REQUEST, "Invalid request path").into_response();
        }
    };

    // Route sources are written the way clients send paths, escapes included
    let escaped_path = url.escaped_path();
    let Some(route) = state.table.lookup(&url.host, &escaped_path) else {
        tracing::warn!(request_id = %request_id, host = %url.host, path = %escaped_path, "No route matched");
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let Some(target) = route.pick_target() else {
        tracing::warn!(request_id = %request_id, route = %route.path, "Route has no targets");
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    if target.redirect_code == 0 {
        tracing::warn!(
            request_id = %request_id,
            service = %target.service,
            "Target is not a redirect and upstream proxying is not available"
        );
        return (StatusCode::BAD_GATEWAY, "Route target is not a redirect").into_response();
    }

    let location = target.build_redirect_url(&url);
    tracing::debug!(
        request_id = %request_id,
        service = %target.service,
        status = target.redirect_code,
        location = %location,
        "Redirecting request"
    );
    response::redirect(target.redirect_code, &location)
}
