use anyhow::{Context, Result};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tika_relay::{api, config, logging, tika::TikaService};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config().context("failed to load configuration")?;
    let config = config::get_config();
    logging::init_tracing(config.log_file.as_deref());
    tracing::debug!(
        tika_url = %config.tika_url,
        server_port = config.server_port,
        upload_dir = %config.upload_dir.display(),
        max_upload_bytes = ?config.max_upload_bytes,
        "Loaded configuration"
    );

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;

    let service = TikaService::new(&config.tika_url).context("failed to build Tika client")?;
    tracing::info!(tika_url = %service.base_url(), "Forwarding extractions to Tika");

    let state = api::AppState::new(Arc::new(service), config.upload_dir.clone());
    let app = api::create_router(state, config.max_upload_bytes);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.server_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(error = %error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutting down");
}
