// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use fetchguard::api::HttpServer;
use fetchguard::config::Config;
use fetchguard::logging::setup_logging;
use fetchguard::{DnsResolver, FetchOrchestrator, HttpClient, TracingAuditSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_json)?;

    info!("Starting fetchguard v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.fetch_settings()?;
    if !settings.guard.exempt_ranges.is_empty() {
        info!(ranges = ?config.exempt_cidrs, "Exempt ranges configured");
    }

    let resolver = Arc::new(DnsResolver::new(config.dns_timeout())?);
    let transport = Arc::new(HttpClient::new(
        config.connect_timeout(),
        config.request_timeout(),
        &config.user_agent,
    ));
    let audit = Arc::new(TracingAuditSink::new());

    let orchestrator = Arc::new(FetchOrchestrator::new(resolver, transport, audit, settings));

    // Start HTTP server
    let http_server = HttpServer::new(orchestrator, config.listen_addr);
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.serve().await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("All services started. Waiting for shutdown signal...");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    info!("Initiating graceful shutdown...");

    // Dropping in-flight fetch futures cancels their lookups and requests
    http_task.abort();
    let _ = http_task.await;

    info!("Shutdown complete");
    Ok(())
}
