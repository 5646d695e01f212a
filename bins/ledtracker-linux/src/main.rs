use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use ledtracker_controller::Controller;
use ledtracker_core::{CredentialStore, DeviceConfig, EnvFileStore};
use ledtracker_display::{select_backend, BackendKind, MatrixDisplay};
use ledtracker_network::NetworkConfigurator;
use ledtracker_sales::{HttpSalesClient, MockSalesSource, SalesSource};
use ledtracker_web::{create_router, AppState, ServerState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset; `ledtracker` matches every crate here.
const DEFAULT_LOG_FILTER: &str = "info,ledtracker=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("LED sales tracker starting...");

    // Configuration
    let config = DeviceConfig::from_env()?;
    let http_addr = config.bind_addr();

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(EnvFileStore::new(&config.credentials_path));
    if !credentials.is_configured() {
        tracing::warn!(
            "No Wi-Fi credentials in {}, waiting for the setup portal",
            config.credentials_path.display()
        );
    }

    let sales: Arc<dyn SalesSource> = match &config.sales_api_url {
        Some(url) => Arc::new(HttpSalesClient::new(
            url.clone(),
            config.sales_timeout,
            credentials.clone(),
        )?),
        None => {
            tracing::warn!("SALES_API_URL not set, using mocked sales data");
            Arc::new(MockSalesSource::new())
        }
    };

    let backend = select_backend(
        BackendKind::parse_lenient(&config.display_backend),
        &config.matrix_device,
    );
    let controller = Arc::new(Controller::new(sales, MatrixDisplay::new(backend)));

    let state: AppState = Arc::new(
        ServerState::new(controller.clone(), credentials)
            .with_network(NetworkConfigurator::from_config(&config)),
    );

    // Periodic refresh
    let mut refresh_handle =
        tokio::spawn(controller.clone().run_refresh_loop(config.refresh_interval));

    // HTTP front door
    let mut http_handle = tokio::spawn(start_http_server(http_addr, state));

    tracing::info!("LED sales tracker ready!");
    tracing::info!("   Status:  http://{}/status", http_addr);
    tracing::info!("   Setup:   http://{}/setup", http_addr);
    tracing::info!("   Refresh: http://{}/update-matrix", http_addr);

    // Wait for shutdown signal
    let outcome: anyhow::Result<()> = tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal, shutting down...");
            Ok(())
        }
        joined = &mut http_handle => {
            let e = match joined {
                Ok(Ok(())) => anyhow::anyhow!("HTTP server stopped unexpectedly"),
                Ok(Err(e)) => e,
                Err(e) => e.into(),
            };
            tracing::error!("HTTP server error: {:#}", e);
            Err(e)
        }
        _ = &mut refresh_handle => {
            tracing::error!("Refresh loop stopped");
            Err(anyhow::anyhow!("refresh loop stopped unexpectedly"))
        }
    };

    http_handle.abort();
    refresh_handle.abort();
    controller.shutdown_display().await;

    tracing::info!("Shutdown complete");
    outcome
}

/// Start the HTTP server.
async fn start_http_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on port {}", addr.port());
    axum::serve(listener, app).await?;
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
