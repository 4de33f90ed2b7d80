//! Items service entry point.
//!
//! # Responsibility
//! - Load configuration, start logging, resolve the storage mode.
//! - Serve HTTP until Ctrl+C.

use itemstore_core::{default_log_level, init_logging, ItemFacade, ServiceConfig};
use log::{info, warn};
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServiceConfig::from_env()?;

    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, config.log_dir.as_deref())?;

    info!(
        "event=service_start module=server status=start version={} environment={} policy={}",
        itemstore_core::core_version(),
        config.environment,
        config.fallback_policy.as_str()
    );

    // Startup probing sleeps between attempts; keep it off the async workers.
    let bootstrap_config = config.clone();
    let facade =
        tokio::task::spawn_blocking(move || ItemFacade::bootstrap(&bootstrap_config)).await?;

    let listener = TcpListener::bind(config.bind_addr).await?;
    itemstore_server::serve(listener, Arc::new(facade), shutdown_signal()).await?;

    info!("event=service_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=service_stop module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
