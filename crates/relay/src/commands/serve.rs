use std::sync::Arc;

use anyhow::Context;
use gateway::upstream::{GeminiClient, GeminiClientParams, GenerationBackend};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::{RelayConfig, ServeParams};
use crate::server::{StartAxumServerParams, start_axum_server};

/// Main entry point for the serve command
pub async fn cmd_serve(params: ServeParams) -> Result<(), anyhow::Error> {
    let config = RelayConfig::try_from(params)?;
    info!(?config, "Starting prompt relay");

    let backend: Arc<dyn GenerationBackend> = Arc::new(GeminiClient::new(GeminiClientParams {
        api_key: config.api_key.clone(),
        model: config.model.clone(),
        base_url: config.upstream_base_url.clone(),
    }));

    let (system_shutdown_signal_tx, system_shutdown_signal_rx) = broadcast::channel(1);
    let (server_fut, _handle, addr) = start_axum_server(StartAxumServerParams {
        config,
        backend,
        system_shutdown_signal_rx,
    })
    .await?;

    let mut server_task = tokio::spawn(server_fut);
    info!("Server is running at http://{addr}");

    tokio::select! {
        biased;

        _ = tokio::signal::ctrl_c() => {
            debug!("Shutdown signal received (Ctrl+C)");
            let _ = system_shutdown_signal_tx.send(());
            server_task
                .await
                .context("Server task panicked")?
                .context("Server failed while draining connections")?;
        }

        res = &mut server_task => {
            res.context("Server task panicked")?
                .with_context(|| format!("Server failed on {addr}"))?;
        }
    }

    info!("Prompt relay stopped");
    Ok(())
}
