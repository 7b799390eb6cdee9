//! OS signal handling.

/// Wait for the shutdown signal (Ctrl+C).
///
/// If the handler cannot be installed the server keeps running until killed.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
