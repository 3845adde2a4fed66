use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::predictor::Predictor;
use crate::services::{self, ApiState};

/// Start the HTTP API. The model loads in the background; `/predict` answers
/// `not_ready` until it is done.
pub async fn run_serve(cfg: &AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Err(problems) = cfg.validate() {
        for problem in &problems {
            warn!(problem = %problem, "configuration problem");
        }
    }

    let predictor = Arc::new(Predictor::from_config(cfg)?);
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let port = port.unwrap_or(cfg.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;

    let loader = Arc::clone(&predictor);
    tokio::spawn(async move {
        // The outcome is reported by the readiness watcher below.
        let _ = loader.load().await;
    });

    let watcher = Arc::clone(&predictor);
    tokio::spawn(async move {
        match watcher.runner().wait_ready().await {
            Ok(()) => info!("model ready; accepting predictions"),
            Err(e) => error!(error = %e, "model unavailable; predictions will answer not_ready"),
        }
    });

    info!(%addr, model = %cfg.model.path, "wagecast API starting");
    services::serve(Arc::new(ApiState::new(predictor)), addr, shutdown_signal()).await?;
    info!("wagecast API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
