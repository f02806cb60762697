use clap::Parser;
use header_proxy::echo::echo_router;
use header_proxy::lifecycle::{wait_for_signal, Shutdown};
use header_proxy::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "echo-backend")]
#[command(about = "Backend that echoes HTTP bodies and WebSocket messages", long_about = None)]
struct Cli {
    /// Port on which to listen
    #[arg(long)]
    port: u16,

    /// Interface on which to listen
    #[arg(long, default_value = "localhost")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    if cli.port == 0 {
        tracing::error!("You must specify a local port number on which to listen");
        std::process::exit(1);
    }

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Echo backend listening");

    let shutdown = Shutdown::new();
    let stop = shutdown.signal();
    tokio::spawn(async move { wait_for_signal(&shutdown).await });

    axum::serve(listener, echo_router())
        .with_graceful_shutdown(stop.wait())
        .await?;
    Ok(())
}
