use clap::Parser;

use header_proxy::config::{load_config, Cli};
use header_proxy::lifecycle::{wait_for_signal, Shutdown};
use header_proxy::observability::logging::init_logging;
use header_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        listen = %config.listener.bind_address(),
        backend = %config.backend.url,
        websocket_scheme = %config.backend.websocket_scheme,
        injected_headers = ?config
            .injected_headers
            .iter()
            .map(|h| h.name.as_str())
            .collect::<Vec<_>>(),
        close_together = config.tunnel.close_together,
        "Configuration loaded"
    );

    let server = HttpServer::new(config);
    let listener = server.bind().await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.signal();
    tokio::spawn(async move { wait_for_signal(&shutdown).await });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
